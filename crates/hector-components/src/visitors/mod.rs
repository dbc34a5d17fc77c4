//! Output visitors.
//!
//! A [`RecordingVisitor`] walks the model after each visited round and turns
//! every quantity of every standard component into an [`OutputRecord`],
//! which it hands to a [`RecordSink`].

mod csv;

pub use csv::CsvSink;

use crate::components::{
    BlackCarbonComponent, CH4Component, ForcingComponent, HalocarbonComponent, OHComponent,
    OceanComponent, OrganicCarbonComponent, OzoneComponent, SimpleNboxComponent, SlrComponent,
    TemperatureComponent, BLACK_CARBON_COMPONENT_NAME, CH4_COMPONENT_NAME, FORCING_COMPONENT_NAME,
    OCEAN_COMPONENT_NAME, OH_COMPONENT_NAME, ORGANIC_CARBON_COMPONENT_NAME, OZONE_COMPONENT_NAME,
    SIMPLE_NBOX_COMPONENT_NAME, SLR_COMPONENT_NAME, TEMPERATURE_COMPONENT_NAME,
};
use crate::standard_data::{
    D_ATMOSPHERIC_CH4, D_ATMOSPHERIC_O3, D_DEEP_OCEAN_TEMP, D_GLOBAL_TEMP, D_HEAT_FLUX,
    D_LIFETIME_OH, D_OCEAN_HEAT_CONTENT, D_OCEAN_HEAT_FLUX, D_RF_BC, D_RF_OC, D_SL_RATE,
    D_SL_TOTAL,
};
use crate::visitor::HectorVisitor;
use hector_core::capability::DataId;
use hector_core::component::Component;
use hector_core::core::CoreState;
use hector_core::errors::HectorResult;
use hector_core::timeseries::Time;
use hector_core::units::UnitValue;
use hector_core::visitor::CoreVisitor;
use serde::{Deserialize, Serialize};

/// One output value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub run_name: String,
    pub spinup: bool,
    pub date: Time,
    pub component: String,
    pub variable: String,
    pub value: f64,
    pub units: String,
}

/// Destination for output records.
pub trait RecordSink {
    fn push(&mut self, record: OutputRecord) -> HectorResult<()>;
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<OutputRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[OutputRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<OutputRecord> {
        self.records
    }
}

impl RecordSink for MemorySink {
    fn push(&mut self, record: OutputRecord) -> HectorResult<()> {
        self.records.push(record);
        Ok(())
    }
}

/// Visitor writing one record per quantity per visited date.
///
/// Spin-up rounds are skipped unless enabled with
/// [`RecordingVisitor::with_spinup`].
#[derive(Debug)]
pub struct RecordingVisitor<S> {
    sink: S,
    include_spinup: bool,
    run_name: String,
    date: Time,
    spinup: bool,
}

/// Writes records as CSV.
pub type CsvOutputVisitor<W> = RecordingVisitor<CsvSink<W>>;

impl<S: RecordSink> RecordingVisitor<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            include_spinup: false,
            run_name: String::new(),
            date: Time::NAN,
            spinup: false,
        }
    }

    pub fn with_spinup(mut self, include_spinup: bool) -> Self {
        self.include_spinup = include_spinup;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn record(&mut self, component: &str, variable: &DataId, value: UnitValue) -> HectorResult<()> {
        self.sink.push(OutputRecord {
            run_name: self.run_name.clone(),
            spinup: self.spinup,
            date: self.date,
            component: component.to_string(),
            variable: variable.to_string(),
            value: value.value(),
            units: value.unit().symbol().to_string(),
        })
    }
}

impl<S: RecordSink> CoreVisitor for RecordingVisitor<S> {
    fn should_visit(&mut self, in_spinup: bool, date: Time) -> bool {
        self.date = date;
        self.spinup = in_spinup;
        self.include_spinup || !in_spinup
    }

    fn visit_core(&mut self, state: &CoreState) -> HectorResult<()> {
        self.run_name = state.run_name().to_string();
        Ok(())
    }
}

impl<S: RecordSink> HectorVisitor for RecordingVisitor<S> {
    fn visit_ch4(&mut self, component: &CH4Component) -> HectorResult<()> {
        let value = component.concentration_at(self.date)?;
        self.record(CH4_COMPONENT_NAME, &D_ATMOSPHERIC_CH4, value)
    }

    fn visit_oh(&mut self, component: &OHComponent) -> HectorResult<()> {
        let value = component.lifetime_at(self.date)?;
        self.record(OH_COMPONENT_NAME, &D_LIFETIME_OH, value)
    }

    fn visit_halocarbon(&mut self, component: &HalocarbonComponent) -> HectorResult<()> {
        let name = Component::<dyn HectorVisitor>::name(component).to_string();
        let concentration = component.concentration_at(self.date)?;
        self.record(&name, component.concentration_id(), concentration)?;
        let forcing = component.forcing_at(self.date)?;
        self.record(&name, component.forcing_id(), forcing)
    }

    fn visit_ozone(&mut self, component: &OzoneComponent) -> HectorResult<()> {
        let value = component.ozone_at(self.date)?;
        self.record(OZONE_COMPONENT_NAME, &D_ATMOSPHERIC_O3, value)
    }

    fn visit_black_carbon(&mut self, component: &BlackCarbonComponent) -> HectorResult<()> {
        let value = component.forcing_at(self.date)?;
        self.record(BLACK_CARBON_COMPONENT_NAME, &D_RF_BC, value)
    }

    fn visit_organic_carbon(&mut self, component: &OrganicCarbonComponent) -> HectorResult<()> {
        let value = component.forcing_at(self.date)?;
        self.record(ORGANIC_CARBON_COMPONENT_NAME, &D_RF_OC, value)
    }

    fn visit_simple_nbox(&mut self, component: &SimpleNboxComponent) -> HectorResult<()> {
        for id in component.outputs() {
            let value = component.output_at(id, self.date)?;
            self.record(SIMPLE_NBOX_COMPONENT_NAME, id, value)?;
        }
        Ok(())
    }

    fn visit_forcing(&mut self, component: &ForcingComponent) -> HectorResult<()> {
        for id in component.published() {
            let value = component.forcing_at(id, self.date)?;
            self.record(FORCING_COMPONENT_NAME, id, value)?;
        }
        Ok(())
    }

    fn visit_temperature(&mut self, component: &TemperatureComponent) -> HectorResult<()> {
        let date = self.date;
        self.record(
            TEMPERATURE_COMPONENT_NAME,
            &D_GLOBAL_TEMP,
            component.global_temperature_at(date)?,
        )?;
        self.record(
            TEMPERATURE_COMPONENT_NAME,
            &D_DEEP_OCEAN_TEMP,
            component.deep_temperature_at(date)?,
        )?;
        self.record(
            TEMPERATURE_COMPONENT_NAME,
            &D_HEAT_FLUX,
            component.heat_flux_at(date)?,
        )
    }

    fn visit_ocean(&mut self, component: &OceanComponent) -> HectorResult<()> {
        let date = self.date;
        self.record(
            OCEAN_COMPONENT_NAME,
            &D_OCEAN_HEAT_CONTENT,
            component.heat_content_at(date)?,
        )?;
        self.record(
            OCEAN_COMPONENT_NAME,
            &D_OCEAN_HEAT_FLUX,
            component.heat_flux_at(date)?,
        )
    }

    fn visit_slr(&mut self, component: &SlrComponent) -> HectorResult<()> {
        let date = self.date;
        self.record(SLR_COMPONENT_NAME, &D_SL_TOTAL, component.sea_level_at(date)?)?;
        self.record(SLR_COMPONENT_NAME, &D_SL_RATE, component.rate_at(date)?)
    }
}
