//! Black and organic carbon aerosols.
//!
//! Both carry their own emissions series and produce a direct forcing
//! proportional to the emission rate. They share all their machinery and
//! differ only in identifiers, units and the forcing coefficient.

use super::{set_dated_value, undated_value, unrecognised};
use crate::standard_data::{D_EMISSIONS_BC, D_EMISSIONS_OC, D_RF_BC, D_RF_OC};
use crate::visitor::HectorVisitor;
use hector_core::capability::{CapabilityRegistry, DataId};
use hector_core::component::{check_timestep, Component, RunContext};
use hector_core::errors::{HectorResult, ResultExt};
use hector_core::logger::ComponentLogger;
use hector_core::message::{require_date, MessageData};
use hector_core::timeseries::{FloatValue, Time, Timeseries};
use hector_core::units::{UnitTag, UnitValue};
use serde::{Deserialize, Serialize};

pub const BLACK_CARBON_COMPONENT_NAME: &str = "bc";
pub const ORGANIC_CARBON_COMPONENT_NAME: &str = "oc";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AerosolParameters {
    /// Forcing per unit emission rate
    /// unit: W/m2 per Tg/yr
    pub rho: FloatValue,
}

impl AerosolParameters {
    pub fn black_carbon() -> Self {
        Self { rho: 0.0743 }
    }

    pub fn organic_carbon() -> Self {
        Self { rho: -0.0129 }
    }
}

/// Identifiers and units of one aerosol species.
#[derive(Debug)]
struct Species {
    component: &'static str,
    emissions_id: DataId,
    forcing_id: DataId,
    unit: UnitTag,
}

#[derive(Debug)]
struct Aerosol {
    species: Species,
    parameters: AerosolParameters,
    emissions: Timeseries<UnitValue>,
    forcing: Timeseries<UnitValue>,
    old_date: Time,
    logger: ComponentLogger,
}

impl Aerosol {
    fn new(species: Species, parameters: AerosolParameters) -> Self {
        let mut emissions = Timeseries::new(species.emissions_id.as_str());
        emissions.allow_interp(true);
        let forcing = Timeseries::new(species.forcing_id.as_str());
        Self {
            species,
            parameters,
            emissions,
            forcing,
            old_date: Time::NAN,
            logger: ComponentLogger::new(),
        }
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        self.logger.open(self.species.component);
        capabilities.register(self.species.emissions_id.clone(), self.species.component)?;
        capabilities.register(self.species.forcing_id.clone(), self.species.component)?;
        Ok(())
    }

    fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        let result = match variable {
            v if *v == self.species.emissions_id => {
                set_dated_value(&mut self.emissions, v, data, self.species.unit)
            }
            v if v.as_str() == "rho" => undated_value(v, data, UnitTag::Unitless).map(|value| {
                self.parameters.rho = value.value();
                value
            }),
            v => Err(unrecognised(self.species.component, v)),
        };
        result.with_context(|| format!("could not parse var: {variable}"))
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        match variable {
            v if *v == self.species.emissions_id => self.emissions.get(require_date(date, v)?),
            v if *v == self.species.forcing_id => self.forcing.get(require_date(date, v)?),
            v => Err(unrecognised(self.species.component, v)),
        }
    }

    fn prepare_to_run(&mut self, date: Time) {
        self.old_date = date;
        self.forcing.set(date, UnitValue::new(0.0, UnitTag::WPerM2));
    }

    fn run(&mut self, date: Time, in_spinup: bool) -> HectorResult<()> {
        check_timestep(self.species.component, self.old_date, date)?;
        let forcing = if in_spinup {
            0.0
        } else {
            let emissions = self.emissions.get(date)?.value_in(self.species.unit)?;
            self.parameters.rho * emissions
        };
        self.forcing.set(date, UnitValue::new(forcing, UnitTag::WPerM2));
        self.old_date = date;
        self.logger
            .debug(format_args!("{date}: {} = {forcing} W/m2", self.species.forcing_id));
        Ok(())
    }
}

macro_rules! aerosol_component {
    ($(#[$meta:meta])* $name:ident, $component:expr, $emissions:expr, $forcing:expr, $unit:expr, $parameters:expr, $visit:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name(Aerosol);

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self::from_parameters($parameters)
            }

            pub fn from_parameters(parameters: AerosolParameters) -> Self {
                let species = Species {
                    component: $component,
                    emissions_id: $emissions,
                    forcing_id: $forcing,
                    unit: $unit,
                };
                Self(Aerosol::new(species, parameters))
            }

            pub fn parameters(&self) -> &AerosolParameters {
                &self.0.parameters
            }

            pub fn emissions_at(&self, date: Time) -> HectorResult<UnitValue> {
                self.0.emissions.get(date)
            }

            pub fn forcing_at(&self, date: Time) -> HectorResult<UnitValue> {
                self.0.forcing.get(date)
            }
        }

        impl Component<dyn HectorVisitor> for $name {
            fn name(&self) -> &str {
                $component
            }

            fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
                self.0.init(capabilities)
            }

            fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
                self.0.set_data(variable, data)
            }

            fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
                self.0.get_data(variable, date)
            }

            fn prepare_to_run(&mut self, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
                self.0.prepare_to_run(ctx.date());
                Ok(())
            }

            fn run(&mut self, date: Time, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
                self.0.run(date, ctx.in_spinup())
            }

            fn shut_down(&mut self) {
                self.0.logger.close();
            }

            fn accept(&self, visitor: &mut (dyn HectorVisitor + 'static)) -> HectorResult<()> {
                visitor.$visit(self)
            }
        }
    };
}

aerosol_component!(
    /// Black carbon: emissions `BC_emissions` (Tg BC/yr), forcing `FBC`.
    BlackCarbonComponent,
    BLACK_CARBON_COMPONENT_NAME,
    D_EMISSIONS_BC,
    D_RF_BC,
    UnitTag::TgBC,
    AerosolParameters::black_carbon(),
    visit_black_carbon
);

aerosol_component!(
    /// Organic carbon: emissions `OC_emissions` (Tg OC/yr), forcing `FOC`.
    OrganicCarbonComponent,
    ORGANIC_CARBON_COMPONENT_NAME,
    D_EMISSIONS_OC,
    D_RF_OC,
    UnitTag::TgOC,
    AerosolParameters::organic_carbon(),
    visit_organic_carbon
);
