use crate::capability::{CapabilityRegistry, DataId};
use crate::core::CoreState;
use crate::errors::{HectorError, HectorResult};
use crate::message::{Message, MessageData};
use crate::timeseries::Time;
use crate::units::UnitValue;
use std::fmt::Debug;

/// When a component reads a datum relative to its own step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// The value for the date currently being run. The provider must run
    /// first, so it has to be registered earlier.
    SameStep,
    /// The value from the previous date.
    PreviousStep,
    /// A date-independent value such as a pre-industrial baseline.
    Undated,
}

/// A datum a component reads from another component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub datum: DataId,
    pub timing: Timing,
}

impl Dependency {
    pub fn same_step(datum: DataId) -> Self {
        Self {
            datum,
            timing: Timing::SameStep,
        }
    }

    pub fn previous_step(datum: DataId) -> Self {
        Self {
            datum,
            timing: Timing::PreviousStep,
        }
    }

    pub fn undated(datum: DataId) -> Self {
        Self {
            datum,
            timing: Timing::Undated,
        }
    }
}

/// A physical component of the model.
///
/// `V` is the visitor type the model is built for. Components call back into
/// the visitor method for their own concrete type from [`Component::accept`],
/// which lets output code see each component's full public interface without
/// downcasting.
///
/// Lifecycle: `init` once, any number of `set_data` calls, `prepare_to_run`
/// once, `run` once per date in increasing one-year steps, then `shut_down`.
pub trait Component<V: ?Sized>: Debug {
    fn name(&self) -> &str;

    /// Register capabilities and open the component's logger.
    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()>;

    /// Data this component reads from other components.
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    /// Receive configuration. Returns the stored value in the unit the
    /// component keeps it in.
    fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue>;

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue>;

    /// Record the initial state at the first date of the run.
    fn prepare_to_run(&mut self, ctx: &RunContext<'_, V>) -> HectorResult<()>;

    /// Advance the component to `date`.
    fn run(&mut self, date: Time, ctx: &RunContext<'_, V>) -> HectorResult<()>;

    fn shut_down(&mut self);

    fn accept(&self, visitor: &mut V) -> HectorResult<()>;

    fn handle_message(
        &mut self,
        message: Message,
        datum: &DataId,
        data: &MessageData,
    ) -> HectorResult<UnitValue> {
        match message {
            Message::GetData => self.get_data(datum, data.date),
            Message::SetData => self.set_data(datum, data),
        }
    }
}

/// Fail unless `to` is exactly one year after `from`.
pub fn check_timestep(component: &str, from: Time, to: Time) -> HectorResult<()> {
    if to - from != 1.0 {
        return Err(HectorError::Timestep {
            component: component.to_string(),
            from,
            to,
        });
    }
    Ok(())
}

/// View of the rest of the model handed to a component while it prepares or
/// runs.
///
/// Only `GetData` may be sent through it; while the model runs each datum is
/// written by its provider alone. Components that run earlier in the current
/// round can be read at the current date, later ones only at earlier dates.
pub struct RunContext<'a, V: ?Sized + 'static> {
    state: &'a CoreState,
    capabilities: &'a CapabilityRegistry,
    caller: String,
    earlier: &'a [Box<dyn Component<V>>],
    later: &'a [Box<dyn Component<V>>],
}

impl<'a, V: ?Sized + 'static> RunContext<'a, V> {
    pub(crate) fn new(
        state: &'a CoreState,
        capabilities: &'a CapabilityRegistry,
        caller: String,
        earlier: &'a [Box<dyn Component<V>>],
        later: &'a [Box<dyn Component<V>>],
    ) -> Self {
        Self {
            state,
            capabilities,
            caller,
            earlier,
            later,
        }
    }

    /// A context with no other components, for driving a single component
    /// on its own.
    pub fn detached(state: &'a CoreState, capabilities: &'a CapabilityRegistry) -> Self {
        Self::new(
            state,
            capabilities,
            String::new(),
            Default::default(),
            Default::default(),
        )
    }

    pub fn state(&self) -> &CoreState {
        self.state
    }

    /// The date the round is running to.
    pub fn date(&self) -> Time {
        self.state.current_date()
    }

    pub fn in_spinup(&self) -> bool {
        self.state.in_spinup()
    }

    pub fn send_message(
        &self,
        message: Message,
        datum: &DataId,
        data: &MessageData,
    ) -> HectorResult<UnitValue> {
        if message == Message::SetData {
            return Err(HectorError::Forbidden(format!(
                "{} cannot set '{datum}' while the model runs",
                self.caller
            )));
        }
        self.get_data(datum, data.date)
    }

    pub fn get_data(&self, datum: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        let provider = self.capabilities.provider(datum)?;

        if let Some(component) = self.earlier.iter().find(|c| c.name() == provider) {
            return component.get_data(datum, date);
        }
        if let Some(component) = self.later.iter().find(|c| c.name() == provider) {
            if date == Some(self.date()) {
                return Err(HectorError::DependencyOrder {
                    consumer: self.caller.clone(),
                    provider: provider.to_string(),
                    datum: datum.to_string(),
                });
            }
            return component.get_data(datum, date);
        }
        Err(HectorError::Forbidden(format!(
            "{} cannot read '{datum}' from {provider} through the core",
            self.caller
        )))
    }
}
