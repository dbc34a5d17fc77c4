//! Small components used to exercise the core in tests.

use crate::capability::{CapabilityRegistry, DataId};
use crate::component::{check_timestep, Component, Dependency, RunContext};
use crate::errors::{HectorError, HectorResult};
use crate::logger::ComponentLogger;
use crate::message::{forbid_date, require_date, MessageData};
use crate::timeseries::{Time, Timeseries};
use crate::units::{UnitTag, UnitValue};
use crate::visitor::CoreVisitor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const D_COUNT: DataId = DataId::from_static("count");
pub const D_OFFSET: DataId = DataId::from_static("offset");
pub const D_DOUBLED: DataId = DataId::from_static("doubled");

pub trait TestVisitor: CoreVisitor {
    fn visit_counter(&mut self, _component: &Counter) -> HectorResult<()> {
        Ok(())
    }

    fn visit_doubler(&mut self, _component: &Doubler) -> HectorResult<()> {
        Ok(())
    }
}

/// Counts the years since the start of the historical period, plus an
/// offset. Holds at the offset while spinning up.
#[derive(Debug)]
pub struct Counter {
    offset: f64,
    count: Timeseries<UnitValue>,
    old_date: Time,
    logger: ComponentLogger,
    closes: Arc<AtomicUsize>,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            offset: 0.0,
            count: Timeseries::new("count"),
            old_date: 0.0,
            logger: ComponentLogger::new(),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared count of how many times the logger was closed.
    pub fn closes(&self) -> Arc<AtomicUsize> {
        self.closes.clone()
    }

    pub fn count_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.count.get(date)
    }
}

impl<V: TestVisitor + ?Sized> Component<V> for Counter {
    fn name(&self) -> &str {
        "counter"
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        self.logger.open("counter");
        capabilities.register(D_COUNT, "counter")?;
        capabilities.register(D_OFFSET, "counter")
    }

    fn set_data(&mut self, variable: &DataId, data: &MessageData) -> HectorResult<UnitValue> {
        match variable.as_str() {
            "offset" => {
                data.forbid_date(variable)?;
                let value = data.parse(UnitTag::Unitless)?;
                self.offset = value.value();
                Ok(value)
            }
            _ => Err(HectorError::UnrecognisedVariable {
                component: "counter".to_string(),
                variable: variable.to_string(),
            }),
        }
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        match variable.as_str() {
            "count" => self.count.get(require_date(date, variable)?),
            "offset" => {
                forbid_date(date, variable)?;
                Ok(UnitValue::unitless(self.offset))
            }
            _ => Err(HectorError::UnrecognisedVariable {
                component: "counter".to_string(),
                variable: variable.to_string(),
            }),
        }
    }

    fn prepare_to_run(&mut self, ctx: &RunContext<'_, V>) -> HectorResult<()> {
        self.old_date = ctx.date();
        self.count.set(ctx.date(), UnitValue::unitless(self.offset));
        Ok(())
    }

    fn run(&mut self, date: Time, ctx: &RunContext<'_, V>) -> HectorResult<()> {
        check_timestep("counter", self.old_date, date)?;
        let value = if ctx.in_spinup() {
            self.offset
        } else {
            self.offset + (date - ctx.state().start_date())
        };
        self.count.set(date, UnitValue::unitless(value));
        self.old_date = date;
        self.logger.debug(format_args!("count {value} at {date}"));
        Ok(())
    }

    fn shut_down(&mut self) {
        if self.logger.close() {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn accept(&self, visitor: &mut V) -> HectorResult<()> {
        visitor.visit_counter(self)
    }
}

/// Doubles the counter in the same step.
#[derive(Debug)]
pub struct Doubler {
    doubled: Timeseries<UnitValue>,
    /// Fail when asked to run to this date.
    fail_at: Option<Time>,
    logger: ComponentLogger,
}

impl Doubler {
    pub fn new() -> Self {
        Self {
            doubled: Timeseries::new("doubled"),
            fail_at: None,
            logger: ComponentLogger::new(),
        }
    }

    pub fn failing_at(date: Time) -> Self {
        Self {
            fail_at: Some(date),
            ..Self::new()
        }
    }

    pub fn doubled_at(&self, date: Time) -> HectorResult<UnitValue> {
        self.doubled.get(date)
    }
}

impl<V: TestVisitor + ?Sized> Component<V> for Doubler {
    fn name(&self) -> &str {
        "doubler"
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        self.logger.open("doubler");
        capabilities.register(D_DOUBLED, "doubler")
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::same_step(D_COUNT)]
    }

    fn set_data(&mut self, variable: &DataId, _data: &MessageData) -> HectorResult<UnitValue> {
        Err(HectorError::UnrecognisedVariable {
            component: "doubler".to_string(),
            variable: variable.to_string(),
        })
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        if *variable != D_DOUBLED {
            return Err(HectorError::UnrecognisedVariable {
                component: "doubler".to_string(),
                variable: variable.to_string(),
            });
        }
        self.doubled.get(require_date(date, variable)?)
    }

    fn prepare_to_run(&mut self, ctx: &RunContext<'_, V>) -> HectorResult<()> {
        let count = ctx.get_data(&D_COUNT, Some(ctx.date()))?;
        self.doubled.set(ctx.date(), count * 2.0);
        Ok(())
    }

    fn run(&mut self, date: Time, ctx: &RunContext<'_, V>) -> HectorResult<()> {
        if self.fail_at == Some(date) {
            return Err(HectorError::Forbidden(format!("refusing to run to {date}")));
        }
        let count = ctx.get_data(&D_COUNT, Some(date))?;
        self.doubled.set(date, count * 2.0);
        Ok(())
    }

    fn shut_down(&mut self) {
        self.logger.close();
    }

    fn accept(&self, visitor: &mut V) -> HectorResult<()> {
        visitor.visit_doubler(self)
    }
}

/// Copies another datum in the same step under its own name.
#[derive(Debug)]
pub struct Follower {
    name: &'static str,
    provides: DataId,
    reads: DataId,
    values: Timeseries<UnitValue>,
}

impl Follower {
    pub fn new(name: &'static str, provides: DataId, reads: DataId) -> Self {
        let values = Timeseries::new(provides.as_str());
        Self {
            name,
            provides,
            reads,
            values,
        }
    }
}

impl<V: TestVisitor + ?Sized> Component<V> for Follower {
    fn name(&self) -> &str {
        self.name
    }

    fn init(&mut self, capabilities: &mut CapabilityRegistry) -> HectorResult<()> {
        capabilities.register(self.provides.clone(), self.name)
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::same_step(self.reads.clone())]
    }

    fn set_data(&mut self, variable: &DataId, _data: &MessageData) -> HectorResult<UnitValue> {
        Err(HectorError::UnrecognisedVariable {
            component: self.name.to_string(),
            variable: variable.to_string(),
        })
    }

    fn get_data(&self, variable: &DataId, date: Option<Time>) -> HectorResult<UnitValue> {
        if *variable != self.provides {
            return Err(HectorError::UnrecognisedVariable {
                component: self.name.to_string(),
                variable: variable.to_string(),
            });
        }
        self.values.get(require_date(date, variable)?)
    }

    fn prepare_to_run(&mut self, ctx: &RunContext<'_, V>) -> HectorResult<()> {
        self.values.set(ctx.date(), UnitValue::unitless(0.0));
        Ok(())
    }

    fn run(&mut self, date: Time, ctx: &RunContext<'_, V>) -> HectorResult<()> {
        let value = ctx.get_data(&self.reads, Some(date))?;
        self.values.set(date, value);
        Ok(())
    }

    fn shut_down(&mut self) {}

    fn accept(&self, _visitor: &mut V) -> HectorResult<()> {
        Ok(())
    }
}
