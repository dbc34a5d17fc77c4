//! The core owns the components of a model and drives them through a run.
//!
//! A run has three parts:
//!
//! 1. every component prepares at `start_date - spinup_years`,
//! 2. spin-up rounds run one year at a time up to `start_date` with the
//!    spin-up flag set, letting components relax toward their pre-industrial
//!    state,
//! 3. historical rounds run one year at a time from `start_date + 1` up to
//!    `end_date`.
//!
//! Within a round components run in registration order. After each round
//! every visitor that asks for the date is walked over the model.
//!
//! Components never hold references to each other. They read other
//! components through a [`RunContext`], which routes requests by the
//! capability registry.

use crate::capability::{CapabilityRegistry, DataId};
use crate::component::{Component, Dependency, RunContext, Timing};
use crate::config::CoreConfig;
use crate::errors::{HectorError, HectorResult, ResultExt};
use crate::message::{Message, MessageData};
use crate::timeseries::Time;
use crate::units::UnitValue;
use crate::visitor::CoreVisitor;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Graph;
use std::fmt;


/// Lifecycle of a [`Core`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructed,
    Initialized,
    SpinningUp,
    Running,
    ShutDown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Constructed => "constructed",
            Phase::Initialized => "initialized",
            Phase::SpinningUp => "spinning up",
            Phase::Running => "running",
            Phase::ShutDown => "shut down",
        };
        f.write_str(name)
    }
}

/// Run-wide state shared with components and visitors.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreState {
    run_name: String,
    start_date: Time,
    end_date: Time,
    spinup_years: u32,
    current_date: Time,
    in_spinup: bool,
}

impl CoreState {
    pub fn new(config: &CoreConfig) -> Self {
        let mut state = Self {
            run_name: config.run_name.clone(),
            start_date: config.start_date,
            end_date: config.end_date,
            spinup_years: config.spinup_years,
            current_date: config.start_date,
            in_spinup: false,
        };
        state.current_date = state.run_start();
        state
    }

    /// The same state positioned at `date`.
    pub fn at(mut self, date: Time, in_spinup: bool) -> Self {
        self.current_date = date;
        self.in_spinup = in_spinup;
        self
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn start_date(&self) -> Time {
        self.start_date
    }

    pub fn end_date(&self) -> Time {
        self.end_date
    }

    pub fn spinup_years(&self) -> u32 {
        self.spinup_years
    }

    /// Date at which components record their initial state.
    pub fn run_start(&self) -> Time {
        self.start_date - self.spinup_years as Time
    }

    pub fn current_date(&self) -> Time {
        self.current_date
    }

    pub fn in_spinup(&self) -> bool {
        self.in_spinup
    }
}

type DependencyGraph = Graph<String, Dependency>;

/// Orchestrates the components of a model.
///
/// `V` is the visitor trait object the model's components accept.
pub struct Core<V: ?Sized + 'static> {
    state: CoreState,
    phase: Phase,
    components: Vec<Box<dyn Component<V>>>,
    capabilities: CapabilityRegistry,
}

impl<V: ?Sized + 'static> fmt::Debug for Core<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("components", &self.components)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl<V: ?Sized + 'static> Core<V> {
    /// Shut every component down.
    ///
    /// Shutting down is irreversible. Calling this again does nothing.
    pub fn shut_down(&mut self) {
        if self.phase == Phase::ShutDown {
            return;
        }
        for component in self.components.iter_mut() {
            component.shut_down();
        }
        tracing::info!(run = self.state.run_name(), "core shut down");
        self.phase = Phase::ShutDown;
    }
}

impl<V: ?Sized + 'static> Drop for Core<V> {
    fn drop(&mut self) {
        if self.phase != Phase::Constructed {
            self.shut_down();
        }
    }
}

impl<V: CoreVisitor + ?Sized + 'static> Core<V> {
    pub fn new(config: CoreConfig) -> HectorResult<Self> {
        config.validate()?;
        Ok(Self {
            state: CoreState::new(&config),
            phase: Phase::Constructed,
            components: Vec::new(),
            capabilities: CapabilityRegistry::new(),
        })
    }

    pub fn state(&self) -> &CoreState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    /// Names of the components in registration order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.name())
    }

    pub fn component(&self, name: &str) -> Option<&dyn Component<V>> {
        self.components
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    fn expect_phase(&self, expected: Phase, action: &str) -> HectorResult<()> {
        if self.phase != expected {
            return Err(self.phase_error(action));
        }
        Ok(())
    }

    fn phase_error(&self, action: &str) -> HectorError {
        HectorError::InvalidPhase {
            action: action.to_string(),
            phase: self.phase.to_string(),
        }
    }

    fn index_of(&self, name: &str) -> HectorResult<usize> {
        self.components
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| HectorError::UnknownComponent(name.to_string()))
    }

    /// Add a component. Components run in the order they are added.
    pub fn add_component(&mut self, component: Box<dyn Component<V>>) -> HectorResult<()> {
        self.expect_phase(Phase::Constructed, "add a component")?;
        if self.index_of(component.name()).is_ok() {
            return Err(HectorError::Configuration(format!(
                "a component named '{}' is already registered",
                component.name()
            )));
        }
        tracing::debug!(component = component.name(), "added component");
        self.components.push(component);
        Ok(())
    }

    /// Record that `component` provides `datum`.
    ///
    /// Only possible before `init`, which checks every read against the
    /// registry.
    pub fn register_capability(&mut self, datum: DataId, component: &str) -> HectorResult<()> {
        self.expect_phase(Phase::Constructed, "register a capability")?;
        self.index_of(component)?;
        self.capabilities.register(datum, component)
    }

    /// Initialise every component, then check that every declared
    /// dependency has a provider that runs early enough.
    pub fn init(&mut self) -> HectorResult<()> {
        self.expect_phase(Phase::Constructed, "initialise")?;
        if let Err(err) = self.init_components() {
            self.shut_down();
            return Err(err);
        }
        self.phase = Phase::Initialized;
        tracing::info!(
            run = self.state.run_name(),
            components = self.components.len(),
            capabilities = self.capabilities.len(),
            "core initialised"
        );
        Ok(())
    }

    fn init_components(&mut self) -> HectorResult<()> {
        for component in self.components.iter_mut() {
            let name = component.name().to_string();
            component
                .init(&mut self.capabilities)
                .with_context(|| format!("could not initialise {name}"))?;
        }
        self.validate_dependencies()
    }

    /// Graph of which component reads which other component.
    ///
    /// Nodes are components in registration order, edges point from the
    /// provider of a datum to the component reading it.
    pub fn dependency_graph(&self) -> HectorResult<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        let nodes: Vec<NodeIndex> = self
            .components
            .iter()
            .map(|c| graph.add_node(c.name().to_string()))
            .collect();

        for (consumer, component) in self.components.iter().enumerate() {
            for dependency in component.dependencies() {
                let provider = self
                    .capabilities
                    .provider(&dependency.datum)
                    .with_context(|| format!("{} depends on it", component.name()))?;
                let provider = self.index_of(provider)?;
                graph.add_edge(nodes[provider], nodes[consumer], dependency);
            }
        }
        Ok(graph)
    }

    fn validate_dependencies(&self) -> HectorResult<()> {
        let graph = self.dependency_graph()?;
        let same_step = graph.filter_map(
            |_, name| Some(name.clone()),
            |_, dependency| (dependency.timing == Timing::SameStep).then(|| dependency.clone()),
        );

        if let Err(cycle) = petgraph::algo::toposort(&same_step, None) {
            return Err(HectorError::DependencyCycle(
                same_step[cycle.node_id()].clone(),
            ));
        }

        for edge in same_step.edge_references() {
            if edge.source().index() > edge.target().index() {
                return Err(HectorError::DependencyOrder {
                    consumer: same_step[edge.target()].clone(),
                    provider: same_step[edge.source()].clone(),
                    datum: edge.weight().datum.to_string(),
                });
            }
        }
        Ok(())
    }

    /// The dependency graph in Graphviz format.
    pub fn as_dot(&self) -> HectorResult<String> {
        let graph = self.dependency_graph()?;
        let dot = Dot::with_attr_getters(
            &graph,
            &[Config::EdgeNoLabel],
            &|_, edge| {
                let style = match edge.weight().timing {
                    Timing::SameStep => "solid",
                    Timing::PreviousStep => "dashed",
                    Timing::Undated => "dotted",
                };
                format!("label = \"{}\", style = {style}", edge.weight().datum)
            },
            &|_, _| String::new(),
        );
        Ok(format!("{dot:?}"))
    }

    /// Route a message to the component providing `datum`.
    ///
    /// `SetData` is only accepted before the run starts and returns the value
    /// as the component stored it.
    pub fn send_message(
        &mut self,
        message: Message,
        datum: &DataId,
        data: &MessageData,
    ) -> HectorResult<UnitValue> {
        let provider = self.capabilities.provider(datum)?.to_string();
        if message == Message::SetData
            && !matches!(self.phase, Phase::Constructed | Phase::Initialized)
        {
            return Err(self.phase_error(&format!("set '{datum}'")));
        }
        let index = self.index_of(&provider)?;
        self.components[index]
            .handle_message(message, datum, data)
            .with_context(|| format!("{provider} could not handle {message} for '{datum}'"))
    }

    /// Read `datum` from its provider.
    pub fn get_data(&self, datum: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        let provider = self.capabilities.provider(datum)?;
        let index = self.index_of(provider)?;
        self.components[index]
            .get_data(datum, date)
            .with_context(|| format!("{provider} could not provide '{datum}'"))
    }

    /// Set a variable on a component addressed by name.
    ///
    /// Configuration uses this, since settable parameters are not
    /// necessarily registered capabilities.
    pub fn set_data(
        &mut self,
        component: &str,
        variable: &DataId,
        data: &MessageData,
    ) -> HectorResult<UnitValue> {
        if !matches!(self.phase, Phase::Constructed | Phase::Initialized) {
            return Err(self.phase_error(&format!("set '{variable}' on {component}")));
        }
        let index = self.index_of(component)?;
        self.components[index].set_data(variable, data)
    }

    /// Run the model from its initial state to the end date.
    ///
    /// If any component fails the run stops, every component is shut down
    /// and the error is returned.
    pub fn run(&mut self, visitors: &mut [&mut V]) -> HectorResult<()> {
        self.expect_phase(Phase::Initialized, "run")?;
        let result = self.run_all(visitors);
        if let Err(err) = &result {
            tracing::error!(date = self.state.current_date, "run aborted: {err}");
            self.shut_down();
        }
        result
    }

    fn run_all(&mut self, visitors: &mut [&mut V]) -> HectorResult<()> {
        let run_start = self.state.run_start();
        self.state.current_date = run_start;
        self.state.in_spinup = false;
        self.each_component(|component, ctx| {
            let name = component.name().to_string();
            component
                .prepare_to_run(ctx)
                .with_context(|| format!("{name} could not prepare to run"))
        })?;

        if self.state.spinup_years > 0 {
            self.phase = Phase::SpinningUp;
            self.state.in_spinup = true;
            tracing::info!(from = run_start, to = self.state.start_date, "spinning up");
            for year in 1..=self.state.spinup_years {
                self.run_round(run_start + year as Time, visitors)?;
            }
        }

        self.phase = Phase::Running;
        self.state.in_spinup = false;
        tracing::info!(
            from = self.state.start_date,
            to = self.state.end_date,
            "running historical period"
        );
        let mut date = self.state.start_date + 1.0;
        while date <= self.state.end_date {
            self.run_round(date, visitors)?;
            date += 1.0;
        }
        Ok(())
    }

    fn run_round(&mut self, date: Time, visitors: &mut [&mut V]) -> HectorResult<()> {
        tracing::debug!(date, spinup = self.state.in_spinup, "running round");
        self.state.current_date = date;
        self.each_component(|component, ctx| {
            let name = component.name().to_string();
            component
                .run(date, ctx)
                .with_context(|| format!("{name} failed running to {date}"))
        })?;

        for visitor in visitors.iter_mut() {
            if visitor.should_visit(self.state.in_spinup, date) {
                self.accept(&mut **visitor)?;
            }
        }
        Ok(())
    }

    /// Call `f` on each component in registration order, with a context that
    /// exposes every other component.
    fn each_component<F>(&mut self, mut f: F) -> HectorResult<()>
    where
        F: FnMut(&mut Box<dyn Component<V>>, &RunContext<'_, V>) -> HectorResult<()>,
    {
        for index in 0..self.components.len() {
            let (earlier, rest) = self.components.split_at_mut(index);
            let Some((component, later)) = rest.split_first_mut() else {
                break;
            };
            let ctx = RunContext::new(
                &self.state,
                &self.capabilities,
                component.name().to_string(),
                earlier,
                later,
            );
            f(component, &ctx)?;
        }
        Ok(())
    }

    /// Walk `visitor` over the core and then every component.
    pub fn accept(&self, visitor: &mut V) -> HectorResult<()> {
        visitor.visit_core(&self.state)?;
        for component in &self.components {
            component
                .accept(visitor)
                .with_context(|| format!("could not visit {}", component.name()))?;
        }
        Ok(())
    }
}
