//! Tropospheric ozone.
//!
//! Ozone is a linear function of the log of methane and of the NOx, CO and
//! NMVOC emission rates. Spin-up holds it at the pre-industrial value `PO3`.

use super::{undated_value, unrecognised};
use crate::standard_data::{
    D_ATMOSPHERIC_CH4, D_ATMOSPHERIC_O3, D_EMISSIONS_CO, D_EMISSIONS_NMVOC, D_EMISSIONS_NOX,
    D_PREINDUSTRIAL_O3,
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

pub const OZONE_COMPONENT_NAME: &str = "ozone";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OzoneParameters {
    /// Pre-industrial tropospheric ozone
    /// unit: DU
    /// default: 30
    pub preindustrial_o3: FloatValue,
    /// default: 5.0
    pub ch4_coefficient: FloatValue,
    /// default: 0.125
    pub nox_coefficient: FloatValue,
    /// default: 0.0011
    pub co_coefficient: FloatValue,
    /// default: 0.0033
    pub nmvoc_coefficient: FloatValue,
}

impl Default for OzoneParameters {
    fn default() -> Self {
        Self {
            preindustrial_o3: 30.0,
            ch4_coefficient: 5.0,
            nox_coefficient: 0.125,
            co_coefficient: 0.0011,
            nmvoc_coefficient: 0.0033,
        }
    }
}

#[derive(Debug)]
pub struct OzoneComponent {
    parameters: OzoneParameters,
    ozone: Timeseries<UnitValue>,
    old_date: Time,
    logger: ComponentLogger,
}

impl Default for OzoneComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl OzoneComponent {
    pub fn new() -> Self {
        Self::from_parameters(OzoneParameters::default())
    }

    pub fn from_parameters(parameters: OzoneParameters) -> Self {
        Self {
            parameters,
            ozone: Timeseries::new(D_ATMOSPHERIC_O3.as_str()),
            old_date: Time::NAN,
            logger: ComponentLogger::new(),
        }
    }

    pub fn parameters(&self) -> &OzoneParameters {
        &self.parameters
    }

    pub fn ozone_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.ozone.get(date)
    }

    /// Ozone (DU) from CH4 (ppbv) and emission rates (Tg N, Tg CO, Tg NMVOC).
    pub fn calculate_ozone(
        &self,
        ch4: FloatValue,
        nox: FloatValue,
        co: FloatValue,
        nmvoc: FloatValue,
    ) -> FloatValue {
        let p = &self.parameters;
        p.ch4_coefficient * ch4.ln()
            + p.nox_coefficient * nox
            + p.co_coefficient * co
            + p.nmvoc_coefficient * nmvoc
    }

    fn apply_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        match variable {
            v if *v == D_PREINDUSTRIAL_O3 => {
                let value = undated_value(v, data, UnitTag::DobsonUnits)?;
                self.parameters.preindustrial_o3 = value.value();
                Ok(value)
            }
            v => Err(unrecognised(OZONE_COMPONENT_NAME, v)),
        }
    }
}

/// Emission rate of an optional precursor; unconfigured precursors are zero.
fn precursor(
    ctx: &RunContext<'_, dyn HectorVisitor>,
    datum: &DataId,
    date: Time,
    unit: UnitTag,
) -> HectorResult<FloatValue> {
    match ctx.get_data(datum, Some(date)) {
        Ok(value) => value.value_in(unit),
        Err(e) if e.kind() == hector_core::errors::ErrorKind::EmptySeries => Ok(0.0),
        Err(e) => Err(e),
    }
}

impl Component<dyn HectorVisitor> for OzoneComponent {
    fn name(&self) -> &str {
        OZONE_COMPONENT_NAME
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        self.logger.open(OZONE_COMPONENT_NAME);
        capabilities.register(D_ATMOSPHERIC_O3, OZONE_COMPONENT_NAME)?;
        capabilities.register(D_PREINDUSTRIAL_O3, OZONE_COMPONENT_NAME)?;
        Ok(())
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![
            Dependency::same_step(D_ATMOSPHERIC_CH4),
            Dependency::same_step(D_EMISSIONS_NOX),
            Dependency::same_step(D_EMISSIONS_CO),
            Dependency::same_step(D_EMISSIONS_NMVOC),
        ]
    }

    fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        self.apply_data(variable, data)
            .with_context(|| format!("could not parse var: {variable}"))
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        match variable {
            v if *v == D_ATMOSPHERIC_O3 => self.ozone.get(require_date(date, v)?),
            v if *v == D_PREINDUSTRIAL_O3 => {
                forbid_date(date, v)?;
                Ok(UnitValue::new(
                    self.parameters.preindustrial_o3,
                    UnitTag::DobsonUnits,
                ))
            }
            v => Err(unrecognised(OZONE_COMPONENT_NAME, v)),
        }
    }

    fn prepare_to_run(&mut self, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        self.old_date = ctx.date();
        self.ozone.set(
            ctx.date(),
            UnitValue::new(self.parameters.preindustrial_o3, UnitTag::DobsonUnits),
        );
        Ok(())
    }

    fn run(&mut self, date: Time, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        check_timestep(OZONE_COMPONENT_NAME, self.old_date, date)?;
        let ozone = if ctx.in_spinup() {
            self.parameters.preindustrial_o3
        } else {
            let ch4 = ctx
                .get_data(&D_ATMOSPHERIC_CH4, Some(date))?
                .value_in(UnitTag::PpbvCH4)?;
            let nox = precursor(ctx, &D_EMISSIONS_NOX, date, UnitTag::TgN)?;
            let co = precursor(ctx, &D_EMISSIONS_CO, date, UnitTag::TgCO)?;
            let nmvoc = precursor(ctx, &D_EMISSIONS_NMVOC, date, UnitTag::TgNMVOC)?;
            self.calculate_ozone(ch4, nox, co, nmvoc)
        };
        self.ozone
            .set(date, UnitValue::new(ozone, UnitTag::DobsonUnits));
        self.old_date = date;
        self.logger.debug(format_args!("{date}: O3 = {ozone} DU"));
        Ok(())
    }

    fn shut_down(&mut self) {
        self.logger.close();
    }

    fn accept(&self, visitor: &mut (dyn HectorVisitor + 'static)) -> HectorResult<()> {
        visitor.visit_ozone(self)
    }
}
