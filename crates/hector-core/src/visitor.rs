use crate::core::CoreState;
use crate::errors::HectorResult;
use crate::timeseries::Time;

/// Visitor interface known to the core.
///
/// Model crates extend this with one method per concrete component type and
/// instantiate [`Core`](crate::core::Core) with that trait as a trait object.
/// Visitors decide for themselves which dates they are interested in.
pub trait CoreVisitor {
    /// Whether to visit the model after the round that ran to `date`.
    fn should_visit(&mut self, in_spinup: bool, date: Time) -> bool;

    /// Called before any component is visited.
    fn visit_core(&mut self, _state: &CoreState) -> HectorResult<()> {
        Ok(())
    }
}
