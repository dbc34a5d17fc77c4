//! Well-mixed halocarbons.
//!
//! One component instance per gas, named `{gas}_halocarbon`. Concentrations
//! follow first-order decay with lifetime `tau`, integrated exactly over each
//! one-year step with the year's emissions held constant. Forcing is linear
//! in the concentration above its pre-industrial value `H0`.

use super::{set_dated_value, undated_value, unrecognised};
use crate::standard_data::{halocarbon_concentration, halocarbon_emissions, halocarbon_forcing};
use crate::visitor::HectorVisitor;
use hector_core::capability::{CapabilityRegistry, DataId};
use hector_core::component::{check_timestep, Component, RunContext};
use hector_core::errors::{HectorResult, ResultExt};
use hector_core::logger::ComponentLogger;
use hector_core::message::{require_date, MessageData};
use hector_core::timeseries::{FloatValue, Time, Timeseries};
use hector_core::units::{UnitTag, UnitValue};
use serde::{Deserialize, Serialize};

/// Mass of one pptv of a gas with unit molar mass, Gg per g/mol.
const GG_PER_PPTV_PER_MOLAR_MASS: FloatValue = 0.1765;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalocarbonParameters {
    /// Atmospheric lifetime
    /// unit: yr
    pub tau: FloatValue,

    /// Radiative efficiency
    /// unit: W/m2/pptv
    pub rho: FloatValue,

    /// unit: g/mol
    pub molar_mass: FloatValue,

    /// Pre-industrial concentration
    /// unit: pptv
    /// default: 0
    pub h0: FloatValue,
}

impl Default for HalocarbonParameters {
    fn default() -> Self {
        Self {
            tau: FloatValue::NAN,
            rho: FloatValue::NAN,
            molar_mass: FloatValue::NAN,
            h0: 0.0,
        }
    }
}

impl HalocarbonParameters {
    /// Built-in parameters for the gases the model knows about.
    pub fn for_gas(gas: &str) -> Option<Self> {
        let (tau, rho, molar_mass, h0) = match gas {
            "CF4" => (50000.0, 0.00008, 88.004, 35.0),
            "C2F6" => (10000.0, 0.00026, 138.01, 0.0),
            "HFC23" => (270.0, 0.00019, 70.0, 0.0),
            "HFC134a" => (14.0, 0.00016, 102.02, 0.0),
            "SF6" => (3200.0, 0.00052, 146.06, 0.0),
            "CFC11" => (45.0, 0.00025, 137.35, 0.0),
            "CFC12" => (100.0, 0.00032, 120.9, 0.0),
            _ => return None,
        };
        Some(Self {
            tau,
            rho,
            molar_mass,
            h0,
        })
    }
}

#[derive(Debug)]
pub struct HalocarbonComponent {
    gas: String,
    name: String,
    parameters: HalocarbonParameters,
    emissions: Timeseries<UnitValue>,
    concentration: Timeseries<UnitValue>,
    forcing: Timeseries<UnitValue>,
    d_concentration: DataId,
    d_forcing: DataId,
    d_emissions: DataId,
    old_date: Time,
    logger: ComponentLogger,
}

impl HalocarbonComponent {
    /// A component for `gas`, using its built-in parameters when there are
    /// any. Unknown gases need `tau`, `rho` and `molarMass` to be set.
    pub fn new(gas: &str) -> Self {
        let parameters = HalocarbonParameters::for_gas(gas).unwrap_or_default();
        Self::from_parameters(gas, parameters)
    }

    pub fn from_parameters(gas: &str, parameters: HalocarbonParameters) -> Self {
        let d_emissions = halocarbon_emissions(gas);
        let mut emissions = Timeseries::new(d_emissions.as_str());
        emissions.allow_interp(true);
        let d_concentration = halocarbon_concentration(gas);
        let d_forcing = halocarbon_forcing(gas);
        Self {
            gas: gas.to_string(),
            name: format!("{gas}_halocarbon"),
            parameters,
            emissions,
            concentration: Timeseries::new(d_concentration.as_str()),
            forcing: Timeseries::new(d_forcing.as_str()),
            d_concentration,
            d_forcing,
            d_emissions,
            old_date: Time::NAN,
            logger: ComponentLogger::new(),
        }
    }

    pub fn gas(&self) -> &str {
        &self.gas
    }

    pub fn parameters(&self) -> &HalocarbonParameters {
        &self.parameters
    }

    pub fn concentration_id(&self) -> &DataId {
        &self.d_concentration
    }

    pub fn forcing_id(&self) -> &DataId {
        &self.d_forcing
    }

    pub fn concentration_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.concentration.get(date)
    }

    pub fn forcing_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.forcing.get(date)
    }

    /// Concentration (pptv) a year after `previous` with constant
    /// `emissions` (Gg/yr) over the year.
    pub fn calculate_concentration(&self, previous: FloatValue, emissions: FloatValue) -> FloatValue {
        let p = &self.parameters;
        let decay = (-1.0 / p.tau).exp();
        let source = emissions / (GG_PER_PPTV_PER_MOLAR_MASS * p.molar_mass);
        previous * decay + source * p.tau * (1.0 - decay)
    }

    pub fn calculate_forcing(&self, concentration: FloatValue) -> FloatValue {
        self.parameters.rho * (concentration - self.parameters.h0)
    }

    fn apply_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        let p = &mut self.parameters;
        let (target, unit) = match variable.as_str() {
            "tau" => (&mut p.tau, UnitTag::Years),
            "rho" => (&mut p.rho, UnitTag::WPerM2PerPptv),
            "molarMass" => (&mut p.molar_mass, UnitTag::GramsPerMole),
            "H0" => (&mut p.h0, UnitTag::Pptv),
            _ if *variable == self.d_emissions => {
                return set_dated_value(&mut self.emissions, variable, data, UnitTag::Gg);
            }
            _ => return Err(unrecognised(&self.name, variable)),
        };
        let value = undated_value(variable, data, unit)?;
        *target = value.value();
        Ok(value)
    }
}

impl Component<dyn HectorVisitor> for HalocarbonComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        self.logger.open(&self.name);
        for datum in [&self.d_concentration, &self.d_forcing, &self.d_emissions] {
            capabilities.register(datum.clone(), &self.name)?;
        }
        Ok(())
    }

    fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        self.apply_data(variable, data)
            .with_context(|| format!("could not parse var: {variable}"))
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        match variable {
            v if *v == self.d_concentration => self.concentration.get(require_date(date, v)?),
            v if *v == self.d_forcing => self.forcing.get(require_date(date, v)?),
            v if *v == self.d_emissions => self.emissions.get(require_date(date, v)?),
            v => Err(unrecognised(&self.name, v)),
        }
    }

    fn prepare_to_run(&mut self, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        let p = &self.parameters;
        super::require_positive(&self.name, "tau", p.tau)?;
        super::require_positive(&self.name, "molarMass", p.molar_mass)?;
        if !p.rho.is_finite() {
            return Err(hector_core::errors::HectorError::Configuration(format!(
                "{}: rho has not been set",
                self.name
            )));
        }

        let date = ctx.date();
        self.old_date = date;
        self.concentration
            .set(date, UnitValue::new(p.h0, UnitTag::Pptv));
        self.forcing.set(date, UnitValue::new(0.0, UnitTag::WPerM2));
        Ok(())
    }

    fn run(&mut self, date: Time, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        check_timestep(&self.name, self.old_date, date)?;
        let previous = self.concentration.get(self.old_date)?.value_in(UnitTag::Pptv)?;
        let concentration = if ctx.in_spinup() {
            previous
        } else {
            let emissions = if self.emissions.is_empty() {
                0.0
            } else {
                self.emissions.get(date)?.value_in(UnitTag::Gg)?
            };
            self.calculate_concentration(previous, emissions)
        };
        let forcing = self.calculate_forcing(concentration);

        self.concentration
            .set(date, UnitValue::new(concentration, UnitTag::Pptv));
        self.forcing.set(date, UnitValue::new(forcing, UnitTag::WPerM2));
        self.old_date = date;
        self.logger.debug(format_args!(
            "{date}: {concentration} pptv, {forcing} W/m2"
        ));
        Ok(())
    }

    fn shut_down(&mut self) {
        self.logger.close();
    }

    fn accept(&self, visitor: &mut (dyn HectorVisitor + 'static)) -> HectorResult<()> {
        visitor.visit_halocarbon(self)
    }
}
