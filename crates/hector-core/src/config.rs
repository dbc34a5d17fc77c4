//! TOML configuration of a run.
//!
//! The `[core]` table sets up the run itself. Every other table is named
//! after a component and sets that component's variables:
//!
//! ```toml
//! [core]
//! run_name = "ssp245"
//! start_date = 1745.0
//! end_date = 2100.0
//! spinup_years = 10
//!
//! [CH4]
//! preindustrial_CH4 = "653 ppbv"
//! Tsoil = 160
//! CH4_emissions = { 1746 = "300 Tg CH4", 2100 = "400 Tg CH4" }
//! ```
//!
//! Scalars are either bare numbers, taken to be in the unit the component
//! expects, or strings holding a number followed by a unit. Tables keyed by
//! year are time series.

use crate::capability::DataId;
use crate::core::Core;
use crate::errors::{HectorError, HectorResult, ResultExt};
use crate::message::MessageData;
use crate::timeseries::Time;
use crate::visitor::CoreVisitor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Settings for the core itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Label written alongside every output record.
    pub run_name: String,
    /// First date of the historical run. The state at this date is the
    /// spun-up initial condition.
    pub start_date: Time,
    /// Last date of the historical run.
    pub end_date: Time,
    /// Number of one-year spin-up steps run before `start_date`.
    pub spinup_years: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            run_name: "default".to_string(),
            start_date: 1745.0,
            end_date: 2100.0,
            spinup_years: 0,
        }
    }
}

impl CoreConfig {
    pub fn validate(&self) -> HectorResult<()> {
        if !self.start_date.is_finite() || !self.end_date.is_finite() {
            return Err(HectorError::Configuration(
                "start and end dates must be finite".to_string(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(HectorError::Configuration(format!(
                "end date {} is before start date {}",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }
}

/// A single configured value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Number(f64),
    Text(String),
}

impl ConfigValue {
    /// Split into the value and unit strings of a `SetData` message.
    pub fn to_message(&self) -> MessageData {
        match self {
            ConfigValue::Number(value) => MessageData::text(value.to_string(), ""),
            ConfigValue::Text(text) => {
                let text = text.trim();
                match text.split_once(char::is_whitespace) {
                    Some((value, unit)) => MessageData::text(value, unit.trim()),
                    None => MessageData::text(text, ""),
                }
            }
        }
    }
}

/// A configured variable: a scalar or a series keyed by year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigEntry {
    Value(ConfigValue),
    Series(BTreeMap<String, ConfigValue>),
}

impl ConfigEntry {
    /// The `SetData` messages this entry expands into.
    pub fn to_messages(&self) -> HectorResult<Vec<MessageData>> {
        match self {
            ConfigEntry::Value(value) => Ok(vec![value.to_message()]),
            ConfigEntry::Series(series) => series
                .iter()
                .map(|(date, value)| {
                    let date: Time = date.trim().parse().map_err(
                        |e: std::num::ParseFloatError| HectorError::Parse {
                            input: date.clone(),
                            reason: e.to_string(),
                        },
                    )?;
                    Ok(value.to_message().dated(date))
                })
                .collect(),
        }
    }
}

/// Everything needed to set up a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub core: CoreConfig,
    /// Variables to set, by component name then variable name.
    #[serde(flatten)]
    pub components: BTreeMap<String, BTreeMap<String, ConfigEntry>>,
}

impl SimulationConfig {
    pub fn from_toml_str(source: &str) -> HectorResult<Self> {
        let config: SimulationConfig = toml::from_str(source)?;
        config.core.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> HectorResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(HectorError::from)
            .with_context(|| format!("could not read {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("could not parse {}", path.display()))
    }

    /// Names of the configured component sections.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Send every configured variable to its component.
    pub fn apply<V: CoreVisitor + ?Sized + 'static>(&self, core: &mut Core<V>) -> HectorResult<()> {
        for (component, variables) in &self.components {
            for (variable, entry) in variables {
                let datum = DataId::new(variable.clone());
                apply_entry(core, component, &datum, entry)
                    .with_context(|| format!("could not apply {component}.{variable}"))?;
            }
        }
        Ok(())
    }
}

fn apply_entry<V: CoreVisitor + ?Sized + 'static>(
    core: &mut Core<V>,
    component: &str,
    datum: &DataId,
    entry: &ConfigEntry,
) -> HectorResult<()> {
    for message in entry.to_messages()? {
        core.set_data(component, datum, &message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[core]
run_name = "test"
start_date = 1800.0
end_date = 1810.0
spinup_years = 5

[CH4]
preindustrial_CH4 = "700 ppbv"
Tsoil = 160
CH4_emissions = { 1801 = "300 Tg CH4", "1810.0" = "310 Tg CH4" }
"#;

    #[test]
    fn parses_core_and_components() {
        let config = SimulationConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.core.run_name, "test");
        assert_eq!(config.core.spinup_years, 5);
        assert_eq!(config.sections().collect::<Vec<_>>(), vec!["CH4"]);

        let ch4 = &config.components["CH4"];
        assert_eq!(
            ch4["preindustrial_CH4"].to_messages().unwrap(),
            vec![MessageData::text("700", "ppbv")]
        );
        assert_eq!(
            ch4["Tsoil"].to_messages().unwrap(),
            vec![MessageData::text("160", "")]
        );

        let emissions = ch4["CH4_emissions"].to_messages().unwrap();
        assert_eq!(emissions.len(), 2);
        assert_eq!(emissions[0], MessageData::text("300", "Tg CH4").dated(1801.0));
        assert_eq!(emissions[1].date, Some(1810.0));
    }

    #[test]
    fn core_defaults() {
        let config = SimulationConfig::from_toml_str("").unwrap();
        assert_eq!(config.core, CoreConfig::default());
        assert!(config.components.is_empty());
    }

    #[test]
    fn rejects_reversed_dates() {
        let err = SimulationConfig::from_toml_str("[core]\nstart_date = 2000.0\nend_date = 1900.0\n")
            .unwrap_err();
        assert!(matches!(err, HectorError::Configuration(_)));
    }

    #[test]
    fn rejects_bad_series_dates() {
        let config = SimulationConfig::from_toml_str("[CH4]\nCH4_emissions = { soon = 1.0 }\n").unwrap();
        assert!(matches!(
            config.components["CH4"]["CH4_emissions"].to_messages(),
            Err(HectorError::Parse { .. })
        ));
    }

    #[test]
    fn invalid_toml() {
        assert!(matches!(
            SimulationConfig::from_toml_str("[core"),
            Err(HectorError::Toml(_))
        ));
    }
}
