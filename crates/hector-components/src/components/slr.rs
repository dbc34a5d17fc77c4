//! Global sea level rise.
//!
//! Semi-empirical model of Vermeer and Rahmstorf (2009): the rate of rise
//! has a term proportional to the warming above a base temperature `T0` and
//! a term proportional to the rate of warming.
//!
//! ```text
//! dH/dt = a (T - T0) + b dT/dt
//! ```

use super::{undated_value, unrecognised};
use crate::standard_data::{D_GLOBAL_TEMP, D_SL_RATE, D_SL_TOTAL};
use crate::visitor::HectorVisitor;
use hector_core::capability::{CapabilityRegistry, DataId};
use hector_core::component::{check_timestep, Component, Dependency, RunContext};
use hector_core::errors::{HectorResult, ResultExt};
use hector_core::logger::ComponentLogger;
use hector_core::message::{require_date, MessageData};
use hector_core::timeseries::{FloatValue, Time, Timeseries};
use hector_core::units::{UnitTag, UnitValue};
use serde::{Deserialize, Serialize};

pub const SLR_COMPONENT_NAME: &str = "slr";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlrParameters {
    /// Sensitivity of the rate of rise to temperature
    /// unit: cm/yr/K
    /// default: 0.56
    pub a: FloatValue,
    /// Base temperature
    /// unit: degC
    /// default: -0.41
    pub t0: FloatValue,
    /// Sensitivity to the rate of warming
    /// unit: cm/K
    /// default: -4.9
    pub b: FloatValue,
}

impl Default for SlrParameters {
    fn default() -> Self {
        Self {
            a: 0.56,
            t0: -0.41,
            b: -4.9,
        }
    }
}

#[derive(Debug)]
pub struct SlrComponent {
    parameters: SlrParameters,
    total: Timeseries<UnitValue>,
    rate: Timeseries<UnitValue>,
    old_date: Time,
    logger: ComponentLogger,
}

impl Default for SlrComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl SlrComponent {
    pub fn new() -> Self {
        Self::from_parameters(SlrParameters::default())
    }

    pub fn from_parameters(parameters: SlrParameters) -> Self {
        Self {
            parameters,
            total: Timeseries::new(D_SL_TOTAL.as_str()),
            rate: Timeseries::new(D_SL_RATE.as_str()),
            old_date: Time::NAN,
            logger: ComponentLogger::new(),
        }
    }

    pub fn parameters(&self) -> &SlrParameters {
        &self.parameters
    }

    pub fn sea_level_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.total.get(date)
    }

    pub fn rate_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.rate.get(date)
    }

    /// Rate of rise (cm/yr) over a year that warmed from `previous` to
    /// `current` (degC).
    pub fn calculate_rate(&self, current: FloatValue, previous: FloatValue) -> FloatValue {
        let p = &self.parameters;
        p.a * (current - p.t0) + p.b * (current - previous)
    }
}

impl Component<dyn HectorVisitor> for SlrComponent {
    fn name(&self) -> &str {
        SLR_COMPONENT_NAME
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        self.logger.open(SLR_COMPONENT_NAME);
        capabilities.register(D_SL_TOTAL, SLR_COMPONENT_NAME)?;
        capabilities.register(D_SL_RATE, SLR_COMPONENT_NAME)?;
        Ok(())
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![
            Dependency::same_step(D_GLOBAL_TEMP),
            Dependency::previous_step(D_GLOBAL_TEMP),
        ]
    }

    fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        let p = &mut self.parameters;
        let result = match variable.as_str() {
            "a" => undated_value(variable, data, UnitTag::CmPerYrPerK).map(|v| {
                p.a = v.value();
                v
            }),
            "T0" => undated_value(variable, data, UnitTag::DegC).map(|v| {
                p.t0 = v.value();
                v
            }),
            "b" => undated_value(variable, data, UnitTag::CmPerK).map(|v| {
                p.b = v.value();
                v
            }),
            _ => Err(unrecognised(SLR_COMPONENT_NAME, variable)),
        };
        result.with_context(|| format!("could not parse var: {variable}"))
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        match variable {
            v if *v == D_SL_TOTAL => self.total.get(require_date(date, v)?),
            v if *v == D_SL_RATE => self.rate.get(require_date(date, v)?),
            v => Err(unrecognised(SLR_COMPONENT_NAME, v)),
        }
    }

    fn prepare_to_run(&mut self, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        self.old_date = ctx.date();
        self.total.set(ctx.date(), UnitValue::new(0.0, UnitTag::Cm));
        self.rate.set(ctx.date(), UnitValue::new(0.0, UnitTag::CmPerYr));
        Ok(())
    }

    fn run(&mut self, date: Time, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        check_timestep(SLR_COMPONENT_NAME, self.old_date, date)?;
        let previous_total = self.total.get(self.old_date)?.value_in(UnitTag::Cm)?;

        let rate = if ctx.in_spinup() {
            0.0
        } else {
            let current = ctx
                .get_data(&D_GLOBAL_TEMP, Some(date))?
                .value_in(UnitTag::DegC)?;
            let previous = ctx
                .get_data(&D_GLOBAL_TEMP, Some(self.old_date))?
                .value_in(UnitTag::DegC)?;
            self.calculate_rate(current, previous)
        };
        let total = previous_total + rate;

        self.rate.set(date, UnitValue::new(rate, UnitTag::CmPerYr));
        self.total.set(date, UnitValue::new(total, UnitTag::Cm));
        self.old_date = date;
        self.logger
            .debug(format_args!("{date}: sl_tot = {total} cm, sl_rate = {rate} cm/yr"));
        Ok(())
    }

    fn shut_down(&mut self) {
        self.logger.close();
    }

    fn accept(&self, visitor: &mut (dyn HectorVisitor + 'static)) -> HectorResult<()> {
        visitor.visit_slr(self)
    }
}
