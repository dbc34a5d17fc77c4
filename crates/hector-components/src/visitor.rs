use crate::components::{
    BlackCarbonComponent, CH4Component, ForcingComponent, HalocarbonComponent, OHComponent,
    OceanComponent, OrganicCarbonComponent, OzoneComponent, SimpleNboxComponent, SlrComponent,
    TemperatureComponent,
};
use hector_core::core::Core;
use hector_core::errors::HectorResult;
use hector_core::visitor::CoreVisitor;

/// Visitor over the standard components.
///
/// Every method defaults to doing nothing, so a visitor only implements the
/// components it cares about. Each component's `accept` calls the method for
/// its own type.
pub trait HectorVisitor: CoreVisitor {
    fn visit_ch4(&mut self, _component: &CH4Component) -> HectorResult<()> {
        Ok(())
    }

    fn visit_oh(&mut self, _component: &OHComponent) -> HectorResult<()> {
        Ok(())
    }

    fn visit_halocarbon(&mut self, _component: &HalocarbonComponent) -> HectorResult<()> {
        Ok(())
    }

    fn visit_ozone(&mut self, _component: &OzoneComponent) -> HectorResult<()> {
        Ok(())
    }

    fn visit_black_carbon(&mut self, _component: &BlackCarbonComponent) -> HectorResult<()> {
        Ok(())
    }

    fn visit_organic_carbon(&mut self, _component: &OrganicCarbonComponent) -> HectorResult<()> {
        Ok(())
    }

    fn visit_simple_nbox(&mut self, _component: &SimpleNboxComponent) -> HectorResult<()> {
        Ok(())
    }

    fn visit_forcing(&mut self, _component: &ForcingComponent) -> HectorResult<()> {
        Ok(())
    }

    fn visit_temperature(&mut self, _component: &TemperatureComponent) -> HectorResult<()> {
        Ok(())
    }

    fn visit_ocean(&mut self, _component: &OceanComponent) -> HectorResult<()> {
        Ok(())
    }

    fn visit_slr(&mut self, _component: &SlrComponent) -> HectorResult<()> {
        Ok(())
    }
}

/// A core running the standard components.
pub type HectorCore = Core<dyn HectorVisitor>;
