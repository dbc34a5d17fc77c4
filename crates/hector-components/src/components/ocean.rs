//! Ocean heat uptake.
//!
//! Takes a fixed fraction of the top-of-atmosphere imbalance as the heat
//! flux into the ocean and accumulates it into a heat content anomaly.

use super::{undated_value, unrecognised};
use crate::standard_data::{D_HEAT_FLUX, D_OCEAN_HEAT_CONTENT, D_OCEAN_HEAT_FLUX};
use crate::visitor::HectorVisitor;
use hector_core::capability::{CapabilityRegistry, DataId};
use hector_core::component::{check_timestep, Component, Dependency, RunContext};
use hector_core::errors::{HectorResult, ResultExt};
use hector_core::logger::ComponentLogger;
use hector_core::message::{require_date, MessageData};
use hector_core::timeseries::{FloatValue, Time, Timeseries};
use hector_core::units::{UnitTag, UnitValue};
use serde::{Deserialize, Serialize};

pub const OCEAN_COMPONENT_NAME: &str = "ocean";

/// Surface area of the Earth, m2.
const EARTH_AREA: FloatValue = 5.100656e14;
const SECONDS_PER_YEAR: FloatValue = 365.25 * 24.0 * 3600.0;
const JOULES_PER_ZETTAJOULE: FloatValue = 1e21;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanParameters {
    /// Share of the planetary imbalance taken up by the ocean
    /// default: 0.9
    pub uptake_fraction: FloatValue,
}

impl Default for OceanParameters {
    fn default() -> Self {
        Self {
            uptake_fraction: 0.9,
        }
    }
}

#[derive(Debug)]
pub struct OceanComponent {
    parameters: OceanParameters,
    heat_content: Timeseries<UnitValue>,
    heat_flux: Timeseries<UnitValue>,
    old_date: Time,
    logger: ComponentLogger,
}

impl Default for OceanComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl OceanComponent {
    pub fn new() -> Self {
        Self::from_parameters(OceanParameters::default())
    }

    pub fn from_parameters(parameters: OceanParameters) -> Self {
        Self {
            parameters,
            heat_content: Timeseries::new(D_OCEAN_HEAT_CONTENT.as_str()),
            heat_flux: Timeseries::new(D_OCEAN_HEAT_FLUX.as_str()),
            old_date: Time::NAN,
            logger: ComponentLogger::new(),
        }
    }

    pub fn heat_content_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.heat_content.get(date)
    }

    pub fn heat_flux_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.heat_flux.get(date)
    }

    /// Energy (ZJ) delivered by a flux (W/m2) held for one year.
    pub fn annual_uptake(flux: FloatValue) -> FloatValue {
        flux * EARTH_AREA * SECONDS_PER_YEAR / JOULES_PER_ZETTAJOULE
    }
}

impl Component<dyn HectorVisitor> for OceanComponent {
    fn name(&self) -> &str {
        OCEAN_COMPONENT_NAME
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        self.logger.open(OCEAN_COMPONENT_NAME);
        capabilities.register(D_OCEAN_HEAT_CONTENT, OCEAN_COMPONENT_NAME)?;
        capabilities.register(D_OCEAN_HEAT_FLUX, OCEAN_COMPONENT_NAME)?;
        Ok(())
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::same_step(D_HEAT_FLUX)]
    }

    fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        let result = match variable.as_str() {
            "uptake_fraction" => undated_value(variable, data, UnitTag::Unitless).map(|value| {
                self.parameters.uptake_fraction = value.value();
                value
            }),
            _ => Err(unrecognised(OCEAN_COMPONENT_NAME, variable)),
        };
        result.with_context(|| format!("could not parse var: {variable}"))
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        match variable {
            v if *v == D_OCEAN_HEAT_CONTENT => self.heat_content.get(require_date(date, v)?),
            v if *v == D_OCEAN_HEAT_FLUX => self.heat_flux.get(require_date(date, v)?),
            v => Err(unrecognised(OCEAN_COMPONENT_NAME, v)),
        }
    }

    fn prepare_to_run(&mut self, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        self.old_date = ctx.date();
        self.heat_content
            .set(ctx.date(), UnitValue::new(0.0, UnitTag::Zettajoules));
        self.heat_flux
            .set(ctx.date(), UnitValue::new(0.0, UnitTag::WPerM2));
        Ok(())
    }

    fn run(&mut self, date: Time, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        check_timestep(OCEAN_COMPONENT_NAME, self.old_date, date)?;
        let previous = self
            .heat_content
            .get(self.old_date)?
            .value_in(UnitTag::Zettajoules)?;

        let flux = if ctx.in_spinup() {
            0.0
        } else {
            self.parameters.uptake_fraction
                * ctx
                    .get_data(&D_HEAT_FLUX, Some(date))?
                    .value_in(UnitTag::WPerM2)?
        };
        let content = previous + Self::annual_uptake(flux);

        self.heat_flux.set(date, UnitValue::new(flux, UnitTag::WPerM2));
        self.heat_content
            .set(date, UnitValue::new(content, UnitTag::Zettajoules));
        self.old_date = date;
        self.logger.debug(format_args!("{date}: {content} ZJ"));
        Ok(())
    }

    fn shut_down(&mut self) {
        self.logger.close();
    }

    fn accept(&self, visitor: &mut (dyn HectorVisitor + 'static)) -> HectorResult<()> {
        visitor.visit_ocean(self)
    }
}
