mod aerosols;
mod ch4;
mod forcing;
mod halocarbon;
mod ocean;
mod oh;
mod ozone;
mod simple_nbox;
mod slr;
mod temperature;

pub use aerosols::{
    AerosolParameters, BlackCarbonComponent, OrganicCarbonComponent, BLACK_CARBON_COMPONENT_NAME,
    ORGANIC_CARBON_COMPONENT_NAME,
};
pub use ch4::{CH4Component, CH4Parameters, CH4_COMPONENT_NAME};
pub use forcing::{ForcingComponent, ForcingParameters, ForcingTerm, FORCING_COMPONENT_NAME};
pub use halocarbon::{HalocarbonComponent, HalocarbonParameters};
pub use ocean::{OceanComponent, OceanParameters, OCEAN_COMPONENT_NAME};
pub use oh::{OHComponent, OHParameters, OH_COMPONENT_NAME};
pub use ozone::{OzoneComponent, OzoneParameters, OZONE_COMPONENT_NAME};
pub use simple_nbox::{
    CarbonFluxes, CarbonPools, SimpleNboxComponent, SimpleNboxParameters, PGC_PER_PPMV,
    SIMPLE_NBOX_COMPONENT_NAME,
};
pub use slr::{SlrComponent, SlrParameters, SLR_COMPONENT_NAME};
pub use temperature::{TemperatureComponent, TemperatureParameters, TEMPERATURE_COMPONENT_NAME};

use hector_core::capability::DataId;
use hector_core::errors::{HectorError, HectorResult};
use hector_core::message::MessageData;
use hector_core::timeseries::{Time, Timeseries};
use hector_core::units::{UnitTag, UnitValue};

/// A date-independent value from a `SetData` message.
pub(crate) fn undated_value(
    variable: &DataId,
    data: &MessageData,
    unit: UnitTag,
) -> HectorResult<UnitValue> {
    data.forbid_date(variable)?;
    data.parse(unit)
}

/// Store a dated value from a `SetData` message in `series`.
pub(crate) fn set_dated_value(
    series: &mut Timeseries<UnitValue>,
    variable: &DataId,
    data: &MessageData,
    unit: UnitTag,
) -> HectorResult<UnitValue> {
    let date = data.require_date(variable)?;
    let value = data.parse(unit)?;
    series.set(date, value);
    Ok(value)
}

pub(crate) fn unrecognised(component: &str, variable: &DataId) -> HectorError {
    HectorError::UnrecognisedVariable {
        component: component.to_string(),
        variable: variable.to_string(),
    }
}

/// Change of an optional emissions driver since its first stored value.
///
/// A driver that was never configured contributes no change.
pub(crate) fn emissions_change(
    series: &Timeseries<UnitValue>,
    date: Time,
    unit: UnitTag,
) -> HectorResult<f64> {
    if series.is_empty() {
        return Ok(0.0);
    }
    Ok(series.get(date)?.value_in(unit)? - series.first()?.value_in(unit)?)
}

pub(crate) fn require_positive(component: &str, name: &str, value: f64) -> HectorResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(HectorError::Configuration(format!(
            "{component}: {name} must be positive, got {value}"
        )))
    }
}
