//! Per-component logging handle.
//!
//! Each component owns a [`ComponentLogger`]. It is opened during `init` and
//! closed during `shut_down`; events are emitted inside a `tracing` span named
//! after the component so that subscribers can filter or route each
//! component's output separately. Messages logged while the handle is closed
//! are dropped.

use std::fmt::Display;
use tracing::Span;

#[derive(Debug, Default)]
pub struct ComponentLogger {
    span: Option<Span>,
    component: String,
}

impl ComponentLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the handle for `component`.
    ///
    /// Reopening an open handle keeps the existing span.
    pub fn open(&mut self, component: &str) {
        if self.span.is_some() {
            return;
        }
        let span = tracing::debug_span!("component", name = component);
        tracing::debug!(parent: &span, "hello {component}");
        self.component = component.to_string();
        self.span = Some(span);
    }

    pub fn is_open(&self) -> bool {
        self.span.is_some()
    }

    /// Close the handle, returning whether it was open.
    pub fn close(&mut self) -> bool {
        match self.span.take() {
            Some(span) => {
                tracing::debug!(parent: &span, "goodbye {}", self.component);
                true
            }
            None => false,
        }
    }

    pub fn debug(&self, message: impl Display) {
        if let Some(span) = &self.span {
            tracing::debug!(parent: span, "{message}");
        }
    }

    pub fn info(&self, message: impl Display) {
        if let Some(span) = &self.span {
            tracing::info!(parent: span, "{message}");
        }
    }

    pub fn warn(&self, message: impl Display) {
        if let Some(span) = &self.span {
            tracing::warn!(parent: span, "{message}");
        }
    }
}

impl Drop for ComponentLogger {
    fn drop(&mut self) {
        self.close();
    }
}
