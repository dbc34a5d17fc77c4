//! Atmospheric methane.
//!
//! Tracks the global CH4 concentration from anthropogenic and natural
//! emissions and three sinks: soil uptake, stratospheric destruction and
//! tropospheric OH. The OH lifetime is read from the OH component for the
//! previous year, since OH in turn depends on this year's methane.
//!
//! # Inputs
//!
//! - `CH4_emissions` (Tg CH4/yr) - anthropogenic emissions, interpolated
//! - `TAU_OH` (yr) - OH lifetime from the OH component, previous year
//!
//! # Outputs
//!
//! - `CH4` (ppbv) - atmospheric concentration
//! - `preindustrial_CH4` (ppbv), `CH4N` (Tg CH4/yr) - parameters
//!
//! During spin-up the concentration is held at its pre-industrial value.

use super::{set_dated_value, undated_value, unrecognised};
use crate::standard_data::{
    D_ATMOSPHERIC_CH4, D_CONVERSION_CH4, D_EMISSIONS_CH4, D_LIFETIME_OH, D_LIFETIME_SOIL,
    D_LIFETIME_STRAT, D_NATURAL_CH4, D_PREINDUSTRIAL_CH4,
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

pub const CH4_COMPONENT_NAME: &str = "CH4";

/// Parameters for the methane component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CH4Parameters {
    /// Pre-industrial CH4 concentration
    /// unit: ppbv
    /// default: 653
    pub preindustrial_ch4: FloatValue,

    /// Natural CH4 emissions
    /// unit: Tg CH4/yr
    /// default: 300
    pub natural_emissions: FloatValue,

    /// Lifetime with respect to soil uptake
    /// unit: yr
    /// default: 160
    pub tau_soil: FloatValue,

    /// Lifetime with respect to stratospheric destruction
    /// unit: yr
    /// default: 120
    pub tau_strat: FloatValue,

    /// Mass of CH4 per unit of concentration
    /// unit: Tg/ppbv
    /// default: 2.78
    pub uc_ch4: FloatValue,
}

impl Default for CH4Parameters {
    fn default() -> Self {
        Self {
            preindustrial_ch4: 653.0,
            natural_emissions: 300.0,
            tau_soil: 160.0,
            tau_strat: 120.0,
            uc_ch4: 2.78,
        }
    }
}

#[derive(Debug)]
pub struct CH4Component {
    parameters: CH4Parameters,
    emissions: Timeseries<UnitValue>,
    concentration: Timeseries<UnitValue>,
    old_date: Time,
    logger: ComponentLogger,
}

impl Default for CH4Component {
    fn default() -> Self {
        Self::new()
    }
}

impl CH4Component {
    pub fn new() -> Self {
        Self::from_parameters(CH4Parameters::default())
    }

    pub fn from_parameters(parameters: CH4Parameters) -> Self {
        let mut emissions = Timeseries::new(D_EMISSIONS_CH4.as_str());
        emissions.allow_interp(true);
        Self {
            parameters,
            emissions,
            concentration: Timeseries::new(D_ATMOSPHERIC_CH4.as_str()),
            old_date: Time::NAN,
            logger: ComponentLogger::new(),
        }
    }

    pub fn parameters(&self) -> &CH4Parameters {
        &self.parameters
    }

    pub fn concentration_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.concentration.get(date)
    }

    pub fn emissions_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.emissions.get(date)
    }

    /// Concentration one year on from `previous` (ppbv), given this year's
    /// anthropogenic emissions (Tg CH4) and last year's OH lifetime (yr).
    pub fn calculate_concentration(
        &self,
        previous: FloatValue,
        emissions: FloatValue,
        tau_oh: FloatValue,
    ) -> FloatValue {
        let p = &self.parameters;
        let sources = (emissions + p.natural_emissions) / p.uc_ch4;
        let sinks = previous / p.tau_soil + previous / p.tau_strat + previous / tau_oh;
        previous + sources - sinks
    }

    fn apply_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        let p = &mut self.parameters;
        match variable {
            v if *v == D_PREINDUSTRIAL_CH4 => {
                let value = undated_value(v, data, UnitTag::PpbvCH4)?;
                p.preindustrial_ch4 = value.value();
                Ok(value)
            }
            v if *v == D_EMISSIONS_CH4 => {
                set_dated_value(&mut self.emissions, v, data, UnitTag::TgCH4)
            }
            v if *v == D_NATURAL_CH4 => {
                let value = undated_value(v, data, UnitTag::TgCH4)?;
                p.natural_emissions = value.value();
                Ok(value)
            }
            v if *v == D_LIFETIME_SOIL => {
                let value = undated_value(v, data, UnitTag::Years)?;
                p.tau_soil = value.value();
                Ok(value)
            }
            v if *v == D_LIFETIME_STRAT => {
                let value = undated_value(v, data, UnitTag::Years)?;
                p.tau_strat = value.value();
                Ok(value)
            }
            v if *v == D_CONVERSION_CH4 => {
                let value = undated_value(v, data, UnitTag::TgPerPpbvCH4)?;
                p.uc_ch4 = value.value();
                Ok(value)
            }
            v => Err(unrecognised(CH4_COMPONENT_NAME, v)),
        }
    }
}

impl Component<dyn HectorVisitor> for CH4Component {
    fn name(&self) -> &str {
        CH4_COMPONENT_NAME
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        self.logger.open(CH4_COMPONENT_NAME);
        for datum in [
            D_ATMOSPHERIC_CH4,
            D_PREINDUSTRIAL_CH4,
            D_NATURAL_CH4,
            D_EMISSIONS_CH4,
        ] {
            capabilities.register(datum, CH4_COMPONENT_NAME)?;
        }
        Ok(())
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::previous_step(D_LIFETIME_OH)]
    }

    fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        self.apply_data(variable, data)
            .with_context(|| format!("could not parse var: {variable}"))
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        let p = &self.parameters;
        match variable {
            v if *v == D_ATMOSPHERIC_CH4 => self.concentration.get(require_date(date, v)?),
            v if *v == D_EMISSIONS_CH4 => self.emissions.get(require_date(date, v)?),
            v if *v == D_PREINDUSTRIAL_CH4 => {
                forbid_date(date, v)?;
                Ok(UnitValue::new(p.preindustrial_ch4, UnitTag::PpbvCH4))
            }
            v if *v == D_NATURAL_CH4 => {
                forbid_date(date, v)?;
                Ok(UnitValue::new(p.natural_emissions, UnitTag::TgCH4))
            }
            v => Err(unrecognised(CH4_COMPONENT_NAME, v)),
        }
    }

    fn prepare_to_run(&mut self, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        let p = &self.parameters;
        for (name, value) in [
            ("preindustrial CH4", p.preindustrial_ch4),
            ("Tsoil", p.tau_soil),
            ("Tstrat", p.tau_strat),
            ("UC_CH4", p.uc_ch4),
        ] {
            super::require_positive(CH4_COMPONENT_NAME, name, value)?;
        }

        self.old_date = ctx.date();
        self.concentration.set(
            ctx.date(),
            UnitValue::new(p.preindustrial_ch4, UnitTag::PpbvCH4),
        );
        self.logger.debug(format_args!(
            "starting at {} with {} ppbv",
            ctx.date(),
            p.preindustrial_ch4
        ));
        Ok(())
    }

    fn run(&mut self, date: Time, ctx: &RunContext<'_, dyn HectorVisitor>) -> HectorResult<()> {
        check_timestep(CH4_COMPONENT_NAME, self.old_date, date)?;
        let previous = self
            .concentration
            .get(self.old_date)?
            .value_in(UnitTag::PpbvCH4)?;

        let next = if ctx.in_spinup() {
            previous
        } else {
            let emissions = self.emissions.get(date)?.value_in(UnitTag::TgCH4)?;
            let tau_oh = ctx
                .get_data(&D_LIFETIME_OH, Some(self.old_date))?
                .value_in(UnitTag::Years)?;
            self.calculate_concentration(previous, emissions, tau_oh)
        };

        self.concentration
            .set(date, UnitValue::new(next, UnitTag::PpbvCH4));
        self.old_date = date;
        self.logger.debug(format_args!("{date}: CH4 = {next} ppbv"));
        Ok(())
    }

    fn shut_down(&mut self) {
        self.logger.close();
    }

    fn accept(&self, visitor: &mut (dyn HectorVisitor + 'static)) -> HectorResult<()> {
        visitor.visit_ch4(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hector_core::config::CoreConfig;
    use hector_core::core::CoreState;
    use hector_core::errors::HectorError;
    use is_close::is_close;

    fn set(component: &mut CH4Component, variable: DataId, data: MessageData) -> HectorResult<UnitValue> {
        Component::<dyn HectorVisitor>::set_data(component, &variable, &data)
    }

    #[test]
    fn mass_balance() {
        let component = CH4Component::new();
        let previous = 1800.0;
        let next = component.calculate_concentration(previous, 350.0, 9.0);
        let expected = previous + (350.0 + 300.0) / 2.78
            - previous / 160.0
            - previous / 120.0
            - previous / 9.0;
        assert!(is_close!(next, expected));
    }

    #[test]
    fn parameters_fill_in_defaults() {
        let parameters: CH4Parameters =
            serde_json::from_str(r#"{"tau_soil": 150.0, "preindustrial_ch4": 700.0}"#).unwrap();
        assert_eq!(
            parameters,
            CH4Parameters {
                tau_soil: 150.0,
                preindustrial_ch4: 700.0,
                ..CH4Parameters::default()
            }
        );
        let component = CH4Component::from_parameters(parameters);
        assert_eq!(component.parameters().uc_ch4, 2.78);
    }

    #[test]
    fn set_data_parses_units() {
        let mut component = CH4Component::new();
        let value = set(&mut component, D_PREINDUSTRIAL_CH4, MessageData::text("700", "ppbv")).unwrap();
        assert_eq!(value, UnitValue::new(700.0, UnitTag::PpbvCH4));
        assert_eq!(component.parameters().preindustrial_ch4, 700.0);

        set(
            &mut component,
            D_EMISSIONS_CH4,
            MessageData::text("300000", "Gg CH4").dated(1800.0),
        )
        .unwrap();
        set(
            &mut component,
            D_EMISSIONS_CH4,
            MessageData::text("400", "Tg CH4").dated(1810.0),
        )
        .unwrap();
        // emissions interpolate
        assert!(is_close!(component.emissions_at(1805.0).unwrap().value(), 350.0));
    }

    #[test]
    fn set_data_rejects_unknown_variables_and_bad_dates() {
        let mut component = CH4Component::new();
        let err = set(&mut component, DataId::from("CH5"), MessageData::text("1", "")).unwrap_err();
        assert_eq!(
            err.chain(),
            vec![
                "unknown variable name while parsing CH4: CH5".to_string(),
                "could not parse var: CH5".to_string(),
            ]
        );

        let err = set(
            &mut component,
            D_PREINDUSTRIAL_CH4,
            MessageData::text("700", "ppbv").dated(1800.0),
        )
        .unwrap_err();
        assert!(matches!(err.root_cause(), HectorError::InvalidDate { .. }));

        let err = set(&mut component, D_EMISSIONS_CH4, MessageData::text("300", "Tg CH4")).unwrap_err();
        assert!(matches!(err.root_cause(), HectorError::InvalidDate { .. }));

        let err = set(&mut component, D_PREINDUSTRIAL_CH4, MessageData::text("700", "Tg N")).unwrap_err();
        assert!(matches!(err.root_cause(), HectorError::IncompatibleUnits { .. }));
    }

    #[test]
    fn get_data_checks_dates() {
        let component = CH4Component::new();
        let get = |variable: &DataId, date| {
            Component::<dyn HectorVisitor>::get_data(&component, variable, date)
        };
        assert_eq!(
            get(&D_NATURAL_CH4, None).unwrap(),
            UnitValue::new(300.0, UnitTag::TgCH4)
        );
        assert!(matches!(
            get(&D_PREINDUSTRIAL_CH4, Some(1800.0)),
            Err(HectorError::InvalidDate { .. })
        ));
        assert!(matches!(
            get(&D_ATMOSPHERIC_CH4, None),
            Err(HectorError::InvalidDate { .. })
        ));
    }

    #[test]
    fn spinup_holds_and_enforces_timestep() {
        let config = CoreConfig {
            start_date: 1800.0,
            end_date: 1810.0,
            spinup_years: 2,
            ..CoreConfig::default()
        };
        let registry = CapabilityRegistry::new();
        let state = CoreState::new(&config);
        let mut component = CH4Component::new();

        let ctx = RunContext::detached(&state, &registry);
        component.prepare_to_run(&ctx).unwrap();

        // no emissions and no OH: fine while spinning up
        let state = state.at(1799.0, true);
        let ctx = RunContext::detached(&state, &registry);
        component.run(1799.0, &ctx).unwrap();
        assert_eq!(
            component.concentration_at(1799.0).unwrap(),
            UnitValue::new(653.0, UnitTag::PpbvCH4)
        );

        let state = state.at(1801.0, true);
        let ctx = RunContext::detached(&state, &registry);
        assert!(matches!(
            component.run(1801.0, &ctx),
            Err(HectorError::Timestep { .. })
        ));
    }
}
