//! Radiative forcing.
//!
//! Collects forcing from every configured agent and sums it into `Ftot`.
//! CO2, methane and ozone forcing are computed here from the concentrations
//! published by their components; aerosol and halocarbon forcing are read
//! as-is.
//!
//! All forcings are relative to the state at the start of the run, so they
//! are zero throughout spin-up.

use super::{undated_value, unrecognised};
use crate::standard_data::{
    D_ATMOSPHERIC_CH4, D_ATMOSPHERIC_O3, D_CO2_CONCENTRATIONS, D_PREINDUSTRIAL_CH4,
    D_PREINDUSTRIAL_CO2, D_PREINDUSTRIAL_O3, D_RF_BC, D_RF_CH4, D_RF_CO2, D_RF_HALOCARBONS,
    D_RF_O3, D_RF_OC, D_RF_TOTAL,
};
use crate::visitor::HectorVisitor;
use hector_core::capability::{CapabilityRegistry, DataId};
use hector_core::component::{check_timestep, Component, Dependency, RunContext};
use hector_core::errors::{HectorResult, ResultExt};
use hector_core::logger::ComponentLogger;
use hector_core::message::{require_date, MessageData};
use hector_core::timeseries::{FloatValue, Time, Timeseries};
use hector_core::units::{UnitTag, UnitValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const FORCING_COMPONENT_NAME: &str = "forcing";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForcingParameters {
    /// default: 5.35
    pub co2_coefficient: FloatValue,
    /// default: 0.036
    pub ch4_coefficient: FloatValue,
    /// unit: W/m2 per DU
    /// default: 0.042
    pub o3_coefficient: FloatValue,
}

impl Default for ForcingParameters {
    fn default() -> Self {
        Self {
            co2_coefficient: 5.35,
            ch4_coefficient: 0.036,
            o3_coefficient: 0.042,
        }
    }
}

/// An agent contributing to total forcing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForcingTerm {
    CO2,
    CH4,
    O3,
    BlackCarbon,
    OrganicCarbon,
    /// A halocarbon forcing identifier; these are summed into `Fhalos`.
    Halocarbon(DataId),
    /// Any other forcing identifier, read as-is.
    Other(DataId),
}

impl ForcingTerm {
    /// The identifier this term is published or read under.
    pub fn id(&self) -> DataId {
        match self {
            ForcingTerm::CO2 => D_RF_CO2,
            ForcingTerm::CH4 => D_RF_CH4,
            ForcingTerm::O3 => D_RF_O3,
            ForcingTerm::BlackCarbon => D_RF_BC,
            ForcingTerm::OrganicCarbon => D_RF_OC,
            ForcingTerm::Halocarbon(id) | ForcingTerm::Other(id) => id.clone(),
        }
    }

    fn dependencies(&self) -> Vec<Dependency> {
        match self {
            ForcingTerm::CO2 => vec![
                Dependency::same_step(D_CO2_CONCENTRATIONS),
                Dependency::undated(D_PREINDUSTRIAL_CO2),
            ],
            ForcingTerm::CH4 => vec![
                Dependency::same_step(D_ATMOSPHERIC_CH4),
                Dependency::undated(D_PREINDUSTRIAL_CH4),
            ],
            ForcingTerm::O3 => vec![
                Dependency::same_step(D_ATMOSPHERIC_O3),
                Dependency::undated(D_PREINDUSTRIAL_O3),
            ],
            term => vec![Dependency::same_step(term.id())],
        }
    }
}

#[derive(Debug)]
pub struct ForcingComponent {
    parameters: ForcingParameters,
    terms: Vec<ForcingTerm>,
    forcings: BTreeMap<DataId, Timeseries<UnitValue>>,
    preindustrial_co2: FloatValue,
    preindustrial_ch4: FloatValue,
    preindustrial_o3: FloatValue,
    old_date: Time,
    logger: ComponentLogger,
}

impl Default for ForcingComponent {
    fn default() -> Self {
        Self::new()
    }
}

/// Forcings this component always publishes.
const PUBLISHED: [DataId; 5] = [D_RF_TOTAL, D_RF_CO2, D_RF_CH4, D_RF_O3, D_RF_HALOCARBONS];

fn is_published(id: &DataId) -> bool {
    PUBLISHED.iter().any(|p| p == id)
}

impl ForcingComponent {
    /// A forcing component with the CO2, CH4, O3, BC and OC terms.
    pub fn new() -> Self {
        Self::with_terms(
            ForcingParameters::default(),
            vec![
                ForcingTerm::CO2,
                ForcingTerm::CH4,
                ForcingTerm::O3,
                ForcingTerm::BlackCarbon,
                ForcingTerm::OrganicCarbon,
            ],
        )
    }

    pub fn with_terms(parameters: ForcingParameters, terms: Vec<ForcingTerm>) -> Self {
        let forcings = PUBLISHED
            .into_iter()
            .map(|id| {
                let series = Timeseries::new(id.as_str());
                (id, series)
            })
            .collect();
        Self {
            parameters,
            terms,
            forcings,
            preindustrial_co2: FloatValue::NAN,
            preindustrial_ch4: FloatValue::NAN,
            preindustrial_o3: FloatValue::NAN,
            old_date: Time::NAN,
            logger: ComponentLogger::new(),
        }
    }

    /// Add a term, ignoring terms already present.
    pub fn with_term(mut self, term: ForcingTerm) -> Self {
        if !self.terms.contains(&term) {
            self.terms.push(term);
        }
        self
    }

    pub fn terms(&self) -> &[ForcingTerm] {
        &self.terms
    }

    pub fn parameters(&self) -> &ForcingParameters {
        &self.parameters
    }

    /// Forcings other components can read from this one: `Ftot`, `FCO2`,
    /// `FCH4`, `FO3` and `Fhalos`.
    pub fn published(&self) -> impl Iterator<Item = &DataId> {
        self.forcings.keys().filter(|id| is_published(id))
    }

    pub fn forcing_at(&self, id: &DataId, date: Time) -> HectorResult<UnitValue> {
        match self.forcings.get(id) {
            Some(series) => series.get(date),
            None => Err(unrecognised(FORCING_COMPONENT_NAME, id)),
        }
    }

    pub fn co2_forcing(&self, ca: FloatValue, c0: FloatValue) -> FloatValue {
        self.parameters.co2_coefficient * (ca / c0).ln()
    }

    pub fn ch4_forcing(&self, ch4: FloatValue, m0: FloatValue) -> FloatValue {
        self.parameters.ch4_coefficient * (ch4.sqrt() - m0.sqrt())
    }

    pub fn o3_forcing(&self, o3: FloatValue, po3: FloatValue) -> FloatValue {
        self.parameters.o3_coefficient * (o3 - po3)
    }

    fn apply_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        let p = &mut self.parameters;
        let (field, unit) = match variable.as_str() {
            "co2_coefficient" => (&mut p.co2_coefficient, UnitTag::WPerM2),
            "ch4_coefficient" => (&mut p.ch4_coefficient, UnitTag::Unitless),
            "o3_coefficient" => (&mut p.o3_coefficient, UnitTag::Unitless),
            _ => return Err(unrecognised(FORCING_COMPONENT_NAME, variable)),
        };
        let value = undated_value(variable, data, unit)?;
        *field = value.value();
        Ok(value)
    }

    /// Value of one term at `date`, W/m2.
    fn term_forcing(
        &self,
        term: &ForcingTerm,
        date: Time,
        ctx: &RunContext<'_, dyn HectorVisitor>,
    ) -> HectorResult<FloatValue> {
        match term {
            ForcingTerm::CO2 => {
                let ca = ctx
                    .get_data(&D_CO2_CONCENTRATIONS, Some(date))?
                    .value_in(UnitTag::PpmvCO2)?;
                Ok(self.co2_forcing(ca, self.preindustrial_co2))
            }
            ForcingTerm::CH4 => {
                let ch4 = ctx
                    .get_data(&D_ATMOSPHERIC_CH4, Some(date))?
                    .value_in(UnitTag::PpbvCH4)?;
                Ok(self.ch4_forcing(ch4, self.preindustrial_ch4))
            }
            ForcingTerm::O3 => {
                let o3 = ctx
                    .get_data(&D_ATMOSPHERIC_O3, Some(date))?
                    .value_in(UnitTag::DobsonUnits)?;
                Ok(self.o3_forcing(o3, self.preindustrial_o3))
            }
            term => ctx
                .get_data(&term.id(), Some(date))?
                .value_in(UnitTag::WPerM2),
        }
    }

    fn record(&mut self, id: &DataId, date: Time, value: FloatValue) {
        self.forcings
            .entry(id.clone())
            .or_insert_with(|| Timeseries::new(id.as_str()))
            .set(date, UnitValue::new(value, UnitTag::WPerM2));
    }
}

impl Component<dyn HectorVisitor> for ForcingComponent {
    fn name(&self) -> &str {
        FORCING_COMPONENT_NAME
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        self.logger.open(FORCING_COMPONENT_NAME);
        for datum in PUBLISHED {
            capabilities.register(datum, FORCING_COMPONENT_NAME)?;
        }
        Ok(())
    }

    fn dependencies(&self) -> Vec<Dependency> {
        self.terms
            .iter()
            .flat_map(ForcingTerm::dependencies)
            .collect()
    }

    fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        self.apply_data(variable, data)
            .with_context(|| format!("could not parse var: {variable}"))
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        match self.forcings.get(variable) {
            Some(series) if is_published(variable) => {
                series.get(require_date(date, variable)?)
            }
            _ => Err(unrecognised(FORCING_COMPONENT_NAME, variable)),
        }
    }

    fn prepare_to_run(&mut self, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        if self.terms.contains(&ForcingTerm::CO2) {
            self.preindustrial_co2 = ctx
                .get_data(&D_PREINDUSTRIAL_CO2, None)?
                .value_in(UnitTag::PpmvCO2)?;
            super::require_positive(FORCING_COMPONENT_NAME, "C0", self.preindustrial_co2)?;
        }
        if self.terms.contains(&ForcingTerm::CH4) {
            self.preindustrial_ch4 = ctx
                .get_data(&D_PREINDUSTRIAL_CH4, None)?
                .value_in(UnitTag::PpbvCH4)?;
        }
        if self.terms.contains(&ForcingTerm::O3) {
            self.preindustrial_o3 = ctx
                .get_data(&D_PREINDUSTRIAL_O3, None)?
                .value_in(UnitTag::DobsonUnits)?;
        }

        let date = ctx.date();
        self.old_date = date;
        let ids: Vec<DataId> = self
            .forcings
            .keys()
            .cloned()
            .chain(self.terms.iter().map(ForcingTerm::id))
            .collect();
        for id in ids {
            self.record(&id, date, 0.0);
        }
        Ok(())
    }

    fn run(&mut self, date: Time, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        check_timestep(FORCING_COMPONENT_NAME, self.old_date, date)?;

        let mut values = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            let value = if ctx.in_spinup() {
                0.0
            } else {
                self.term_forcing(term, date, ctx)
                    .with_context(|| format!("could not compute forcing {}", term.id()))?
            };
            values.push((term.clone(), value));
        }

        let total: FloatValue = values.iter().map(|(_, v)| v).sum();
        let halos: FloatValue = values
            .iter()
            .filter(|(t, _)| matches!(t, ForcingTerm::Halocarbon(_)))
            .map(|(_, v)| v)
            .sum();

        for id in PUBLISHED {
            self.record(&id, date, 0.0);
        }
        for (term, value) in &values {
            self.record(&term.id(), date, *value);
        }
        self.record(&D_RF_HALOCARBONS, date, halos);
        self.record(&D_RF_TOTAL, date, total);

        self.old_date = date;
        self.logger.debug(format_args!("{date}: Ftot = {total} W/m2"));
        Ok(())
    }

    fn shut_down(&mut self) {
        self.logger.close();
    }

    fn accept(&self, visitor: &mut (dyn HectorVisitor + 'static)) -> HectorResult<()> {
        visitor.visit_forcing(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn co2_forcing_doubling() {
        let component = ForcingComponent::new();
        assert_relative_eq!(component.co2_forcing(556.0, 278.0), 5.35 * 2.0f64.ln());
        assert_relative_eq!(component.co2_forcing(278.0, 278.0), 0.0);
    }

    #[test]
    fn ch4_and_o3_forcing() {
        let component = ForcingComponent::new();
        assert_relative_eq!(component.ch4_forcing(900.0, 400.0), 0.036 * 10.0);
        assert_relative_eq!(component.o3_forcing(40.0, 30.0), 0.42, max_relative = 1e-12);
    }

    #[test]
    fn terms_are_unique_and_drive_dependencies() {
        let component = ForcingComponent::with_terms(ForcingParameters::default(), vec![])
            .with_term(ForcingTerm::Halocarbon(DataId::from("SF6_forcing")))
            .with_term(ForcingTerm::Halocarbon(DataId::from("SF6_forcing")))
            .with_term(ForcingTerm::BlackCarbon);
        assert_eq!(component.terms().len(), 2);
        let deps = Component::<dyn HectorVisitor>::dependencies(&component);
        assert_eq!(
            deps,
            vec![
                Dependency::same_step(DataId::from("SF6_forcing")),
                Dependency::same_step(D_RF_BC),
            ]
        );
    }

    #[test]
    fn co2_comes_from_the_carbon_cycle() {
        let mut component = ForcingComponent::new();
        let deps = Component::<dyn HectorVisitor>::dependencies(&component);
        assert!(deps.contains(&Dependency::same_step(D_CO2_CONCENTRATIONS)));
        assert!(deps.contains(&Dependency::undated(D_PREINDUSTRIAL_CO2)));

        let ca = MessageData::text("300", "ppmv").dated(1900.0);
        let err = Component::<dyn HectorVisitor>::set_data(&mut component, &D_CO2_CONCENTRATIONS, &ca)
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            hector_core::errors::HectorError::UnrecognisedVariable { .. }
        ));
        Component::<dyn HectorVisitor>::set_data(
            &mut component,
            &DataId::from("co2_coefficient"),
            &MessageData::text("5.5", "W/m2"),
        )
        .unwrap();
        assert_relative_eq!(component.co2_forcing(556.0, 278.0), 5.5 * 2.0f64.ln());
    }

    #[test]
    fn only_published_forcings_are_readable() {
        let mut component = ForcingComponent::new();
        component.record(&D_RF_BC, 1800.0, 1.0);
        component.record(&D_RF_TOTAL, 1800.0, 1.0);
        assert!(Component::<dyn HectorVisitor>::get_data(&component, &D_RF_TOTAL, Some(1800.0)).is_ok());
        // FBC belongs to the black carbon component
        assert!(Component::<dyn HectorVisitor>::get_data(&component, &D_RF_BC, Some(1800.0)).is_err());
        assert_eq!(component.forcing_at(&D_RF_BC, 1800.0).unwrap().value(), 1.0);
    }
}
