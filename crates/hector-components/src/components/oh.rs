//! Tropospheric OH lifetime of methane.
//!
//! The lifetime responds to methane itself and to changes in NOx, CO and
//! NMVOC emissions relative to their first configured value:
//!
//! ```text
//! tau = TOH0 * exp(CCH4 * (ln CH4 - ln M0) + CNOX * dNOx + CCO * dCO + CNMVOC * dNMVOC)
//! ```
//!
//! where `M0` is the pre-industrial methane concentration. An emissions
//! driver that is never configured contributes no change.
//!
//! # Inputs
//!
//! - `CH4` (ppbv), same step
//! - `preindustrial_CH4` (ppbv)
//! - `NOX_emissions`, `CO_emissions`, `NMVOC_emissions` - optional, interpolated
//!
//! # Outputs
//!
//! - `TAU_OH` (yr)

use super::{emissions_change, set_dated_value, undated_value, unrecognised};
use crate::standard_data::{
    D_ATMOSPHERIC_CH4, D_COEFFICIENT_CH4, D_COEFFICIENT_CO, D_COEFFICIENT_NMVOC,
    D_COEFFICIENT_NOX, D_EMISSIONS_CO, D_EMISSIONS_NMVOC, D_EMISSIONS_NOX, D_INITIAL_LIFETIME_OH,
    D_LIFETIME_OH, D_PREINDUSTRIAL_CH4,
};
use crate::visitor::HectorVisitor;
use hector_core::capability::{CapabilityRegistry, DataId};
use hector_core::component::{check_timestep, Component, Dependency, RunContext};
use hector_core::errors::{HectorResult, ResultExt};
use hector_core::logger::ComponentLogger;
use hector_core::message::{forbid_date, require_date, MessageData};
use hector_core::timeseries::{FloatValue, Time, Timeseries};
use hector_core::units::{UnitTag, UnitValue};
use serde::{Deserialize, Serialize};

pub const OH_COMPONENT_NAME: &str = "OH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OHParameters {
    /// Initial OH lifetime
    /// unit: yr
    /// default: 6.6
    pub toh0: FloatValue,

    /// Sensitivity to NOx emissions
    /// unit: per Tg N
    /// default: 0.0042
    pub cnox: FloatValue,

    /// Sensitivity to CO emissions
    /// unit: per Tg CO
    /// default: -0.000105
    pub cco: FloatValue,

    /// Sensitivity to NMVOC emissions
    /// unit: per Tg NMVOC
    /// default: -0.000315
    pub cnmvoc: FloatValue,

    /// Sensitivity to the log of CH4 concentration
    /// default: -0.32
    pub cch4: FloatValue,
}

impl Default for OHParameters {
    fn default() -> Self {
        Self {
            toh0: 6.6,
            cnox: 0.0042,
            cco: -0.000105,
            cnmvoc: -0.000315,
            cch4: -0.32,
        }
    }
}

#[derive(Debug)]
pub struct OHComponent {
    parameters: OHParameters,
    nox_emissions: Timeseries<UnitValue>,
    co_emissions: Timeseries<UnitValue>,
    nmvoc_emissions: Timeseries<UnitValue>,
    tau: Timeseries<UnitValue>,
    preindustrial_ch4: FloatValue,
    old_date: Time,
    logger: ComponentLogger,
}

impl Default for OHComponent {
    fn default() -> Self {
        Self::new()
    }
}

fn driver(id: &DataId) -> Timeseries<UnitValue> {
    let mut series = Timeseries::new(id.as_str());
    series.allow_interp(true);
    series
}

impl OHComponent {
    pub fn new() -> Self {
        Self::from_parameters(OHParameters::default())
    }

    pub fn from_parameters(parameters: OHParameters) -> Self {
        Self {
            parameters,
            nox_emissions: driver(&D_EMISSIONS_NOX),
            co_emissions: driver(&D_EMISSIONS_CO),
            nmvoc_emissions: driver(&D_EMISSIONS_NMVOC),
            tau: Timeseries::new(D_LIFETIME_OH.as_str()),
            preindustrial_ch4: FloatValue::NAN,
            old_date: Time::NAN,
            logger: ComponentLogger::new(),
        }
    }

    pub fn parameters(&self) -> &OHParameters {
        &self.parameters
    }

    pub fn lifetime_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.tau.get(date)
    }

    /// OH lifetime (yr) for a CH4 concentration `ch4` against the
    /// pre-industrial `m0` (both ppbv) and the given emission changes.
    pub fn calculate_lifetime(
        &self,
        ch4: FloatValue,
        m0: FloatValue,
        delta_nox: FloatValue,
        delta_co: FloatValue,
        delta_nmvoc: FloatValue,
    ) -> FloatValue {
        let p = &self.parameters;
        let exponent = p.cch4 * (ch4.ln() - m0.ln())
            + p.cnox * delta_nox
            + p.cco * delta_co
            + p.cnmvoc * delta_nmvoc;
        p.toh0 * exponent.exp()
    }

    fn apply_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        let coefficient = |p: &mut FloatValue| -> HectorResult<UnitValue> {
            let value = undated_value(variable, data, UnitTag::Unitless)?;
            *p = value.value();
            Ok(value)
        };
        let p = &mut self.parameters;
        match variable {
            v if *v == D_INITIAL_LIFETIME_OH => {
                let value = undated_value(v, data, UnitTag::Years)?;
                p.toh0 = value.value();
                Ok(value)
            }
            v if *v == D_COEFFICIENT_NOX => coefficient(&mut p.cnox),
            v if *v == D_COEFFICIENT_CO => coefficient(&mut p.cco),
            v if *v == D_COEFFICIENT_NMVOC => coefficient(&mut p.cnmvoc),
            v if *v == D_COEFFICIENT_CH4 => coefficient(&mut p.cch4),
            v if *v == D_EMISSIONS_NOX => {
                set_dated_value(&mut self.nox_emissions, v, data, UnitTag::TgN)
            }
            v if *v == D_EMISSIONS_CO => {
                set_dated_value(&mut self.co_emissions, v, data, UnitTag::TgCO)
            }
            v if *v == D_EMISSIONS_NMVOC => {
                set_dated_value(&mut self.nmvoc_emissions, v, data, UnitTag::TgNMVOC)
            }
            v => Err(unrecognised(OH_COMPONENT_NAME, v)),
        }
    }

    fn lifetime_for(&self, date: Time, ch4: FloatValue) -> HectorResult<FloatValue> {
        let delta_nox = emissions_change(&self.nox_emissions, date, UnitTag::TgN)?;
        let delta_co = emissions_change(&self.co_emissions, date, UnitTag::TgCO)?;
        let delta_nmvoc = emissions_change(&self.nmvoc_emissions, date, UnitTag::TgNMVOC)?;
        Ok(self.calculate_lifetime(ch4, self.preindustrial_ch4, delta_nox, delta_co, delta_nmvoc))
    }
}

impl Component<dyn HectorVisitor> for OHComponent {
    fn name(&self) -> &str {
        OH_COMPONENT_NAME
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        self.logger.open(OH_COMPONENT_NAME);
        for datum in [D_LIFETIME_OH, D_EMISSIONS_NOX, D_EMISSIONS_CO, D_EMISSIONS_NMVOC] {
            capabilities.register(datum, OH_COMPONENT_NAME)?;
        }
        Ok(())
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![
            Dependency::undated(D_PREINDUSTRIAL_CH4),
            Dependency::same_step(D_ATMOSPHERIC_CH4),
        ]
    }

    fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        self.apply_data(variable, data)
            .with_context(|| format!("could not parse var: {variable}"))
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        match variable {
            v if *v == D_LIFETIME_OH => self.tau.get(require_date(date, v)?),
            v if *v == D_INITIAL_LIFETIME_OH => {
                forbid_date(date, v)?;
                Ok(UnitValue::new(self.parameters.toh0, UnitTag::Years))
            }
            v if *v == D_EMISSIONS_NOX => self.nox_emissions.get(require_date(date, v)?),
            v if *v == D_EMISSIONS_CO => self.co_emissions.get(require_date(date, v)?),
            v if *v == D_EMISSIONS_NMVOC => self.nmvoc_emissions.get(require_date(date, v)?),
            v => Err(unrecognised(OH_COMPONENT_NAME, v)),
        }
    }

    fn prepare_to_run(&mut self, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        super::require_positive(OH_COMPONENT_NAME, "TOH0", self.parameters.toh0)?;
        self.preindustrial_ch4 = ctx
            .get_data(&D_PREINDUSTRIAL_CH4, None)?
            .value_in(UnitTag::PpbvCH4)?;
        self.old_date = ctx.date();
        self.tau
            .set(ctx.date(), UnitValue::new(self.parameters.toh0, UnitTag::Years));
        self.logger.debug(format_args!(
            "M0 = {} ppbv, TOH0 = {} yr",
            self.preindustrial_ch4, self.parameters.toh0
        ));
        Ok(())
    }

    fn run(&mut self, date: Time, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        check_timestep(OH_COMPONENT_NAME, self.old_date, date)?;
        let tau = if ctx.in_spinup() {
            self.parameters.toh0
        } else {
            let ch4 = ctx
                .get_data(&D_ATMOSPHERIC_CH4, Some(date))?
                .value_in(UnitTag::PpbvCH4)?;
            self.lifetime_for(date, ch4)?
        };
        self.tau.set(date, UnitValue::new(tau, UnitTag::Years));
        self.old_date = date;
        self.logger.debug(format_args!("{date}: TAU_OH = {tau} yr"));
        Ok(())
    }

    fn shut_down(&mut self) {
        self.logger.close();
    }

    fn accept(&self, visitor: &mut (dyn HectorVisitor + 'static)) -> HectorResult<()> {
        visitor.visit_oh(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lifetime_at_baseline_is_toh0() {
        let component = OHComponent::new();
        assert_relative_eq!(component.calculate_lifetime(700.0, 700.0, 0.0, 0.0, 0.0), 6.6);
    }

    #[test]
    fn lifetime_responds_to_drivers() {
        let component = OHComponent::new();
        let tau = component.calculate_lifetime(1400.0, 700.0, 10.0, 100.0, 50.0);
        let expected = 6.6
            * (-0.32 * 2.0f64.ln() + 0.0042 * 10.0 - 0.000105 * 100.0 - 0.000315 * 50.0).exp();
        assert_relative_eq!(tau, expected, max_relative = 1e-12);
        // more methane depletes OH, so methane lasts less long
        assert!(component.calculate_lifetime(1400.0, 700.0, 0.0, 0.0, 0.0) < 6.6);
    }

    #[test]
    fn coefficients_are_unitless() {
        let mut component = OHComponent::new();
        let set = |component: &mut OHComponent, variable: DataId, value: &str| {
            Component::<dyn HectorVisitor>::set_data(component, &variable, &MessageData::text(value, ""))
        };
        set(&mut component, D_COEFFICIENT_CH4, "-0.3").unwrap();
        set(&mut component, D_INITIAL_LIFETIME_OH, "7").unwrap();
        assert_eq!(component.parameters().cch4, -0.3);
        assert_eq!(component.parameters().toh0, 7.0);
        assert!(set(&mut component, D_COEFFICIENT_NOX, "x").is_err());
    }

    #[test]
    fn drivers_are_dated_and_interpolated() {
        let mut component = OHComponent::new();
        for (date, value) in [(1800.0, "10"), (1810.0, "20")] {
            Component::<dyn HectorVisitor>::set_data(
                &mut component,
                &D_EMISSIONS_NOX,
                &MessageData::text(value, "Tg N").dated(date),
            )
            .unwrap();
        }
        let nox = Component::<dyn HectorVisitor>::get_data(&component, &D_EMISSIONS_NOX, Some(1805.0))
            .unwrap();
        assert_eq!(nox, UnitValue::new(15.0, UnitTag::TgN));
        assert_eq!(
            emissions_change(&component.nox_emissions, 1805.0, UnitTag::TgN).unwrap(),
            5.0
        );
    }
}
