use crate::components::{
    BlackCarbonComponent, CH4Component, ForcingComponent, ForcingTerm, HalocarbonComponent,
    OHComponent, OceanComponent, OrganicCarbonComponent, OzoneComponent, SimpleNboxComponent,
    SlrComponent, TemperatureComponent,
};
use crate::visitor::HectorCore;
use hector_core::config::SimulationConfig;
use hector_core::errors::{HectorResult, ResultExt};

/// Suffix of configuration sections that each add a halocarbon component.
pub const HALOCARBON_SECTION_SUFFIX: &str = "_halocarbon";

/// Gases with a `<gas>_halocarbon` section in `config`.
pub fn configured_halocarbons(config: &SimulationConfig) -> Vec<String> {
    config
        .sections()
        .filter_map(|section| section.strip_suffix(HALOCARBON_SECTION_SUFFIX))
        .filter(|gas| !gas.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build, initialise and configure the standard model.
///
/// Components are added so that every same-step read is of a component that
/// has already run: halocarbons, CH4, OH, ozone, black and organic carbon,
/// the carbon cycle, forcing, temperature, ocean and sea level.
pub fn standard_core(config: &SimulationConfig) -> HectorResult<HectorCore> {
    let mut core = HectorCore::new(config.core.clone())?;

    let gases = configured_halocarbons(config);
    let mut forcing = ForcingComponent::new();
    for gas in &gases {
        let component = HalocarbonComponent::new(gas);
        forcing = forcing.with_term(ForcingTerm::Halocarbon(component.forcing_id().clone()));
        core.add_component(Box::new(component))?;
    }

    core.add_component(Box::new(CH4Component::new()))?;
    core.add_component(Box::new(OHComponent::new()))?;
    core.add_component(Box::new(OzoneComponent::new()))?;
    core.add_component(Box::new(BlackCarbonComponent::new()))?;
    core.add_component(Box::new(OrganicCarbonComponent::new()))?;
    core.add_component(Box::new(SimpleNboxComponent::new()))?;
    core.add_component(Box::new(forcing))?;
    core.add_component(Box::new(TemperatureComponent::new()))?;
    core.add_component(Box::new(OceanComponent::new()))?;
    core.add_component(Box::new(SlrComponent::new()))?;

    core.init().context("could not initialise the standard model")?;
    config.apply(&mut core)?;
    tracing::info!(
        halocarbons = gases.len(),
        run = config.core.run_name.as_str(),
        "standard model ready"
    );
    Ok(core)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halocarbon_sections() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [SF6_halocarbon]
            H0 = "0 pptv"

            [CFC11_halocarbon]

            [CH4]
            preindustrial_CH4 = "700 ppbv"
            "#,
        )
        .unwrap();
        assert_eq!(configured_halocarbons(&config), vec!["CFC11", "SF6"]);
    }

    #[test]
    fn standard_order_is_valid() {
        let core = standard_core(&SimulationConfig::default()).unwrap();
        let names: Vec<&str> = core.component_names().collect();
        assert_eq!(
            names,
            vec![
                "CH4",
                "OH",
                "ozone",
                "bc",
                "oc",
                "simpleNbox",
                "forcing",
                "temperature",
                "ocean",
                "slr"
            ]
        );
        let dot = core.as_dot().unwrap();
        assert!(dot.contains("TAU_OH"));
        assert!(dot.contains("label = \"Ca\""));
    }
}
