use crate::timeseries::Time;
use thiserror::Error;

/// Error type for invalid operations.
///
/// Errors are never swallowed: a component that cannot complete an operation
/// returns one of these and the core aborts the run. Call sites that want to
/// say *where* a failure happened wrap it with [`ResultExt::context`], which
/// keeps the original error as the source.
#[derive(Error, Debug)]
pub enum HectorError {
    #[error("{0}")]
    Configuration(String),
    #[error("capability '{datum}' is already provided by '{existing}', '{requested}' cannot also register it")]
    DuplicateCapability {
        datum: String,
        existing: String,
        requested: String,
    },
    #[error("no component provides '{0}'")]
    UnknownVariable(String),
    #[error("unknown variable name while parsing {component}: {variable}")]
    UnrecognisedVariable { component: String, variable: String },
    #[error("no component named '{0}'")]
    UnknownComponent(String),
    #[error("{consumer} reads '{datum}' from {provider} in the same step, but {provider} runs later")]
    DependencyOrder {
        consumer: String,
        provider: String,
        datum: String,
    },
    #[error("same-step dependencies form a cycle through '{0}'")]
    DependencyCycle(String),
    #[error("could not parse '{input}' as a number: {reason}")]
    Parse { input: String, reason: String },
    #[error("unknown message '{0}'")]
    UnknownMessage(String),
    #[error("invalid date for '{variable}': {reason}")]
    InvalidDate { variable: String, reason: String },
    #[error("cannot convert from '{from}' to '{to}'")]
    IncompatibleUnits { from: String, to: String },
    #[error("unknown unit '{0}'")]
    UnknownUnit(String),
    #[error("no value in '{series}' at {date}: {reason}")]
    Lookup {
        series: String,
        date: Time,
        reason: String,
    },
    #[error("series '{0}' is empty")]
    EmptySeries(String),
    #[error("{component} must advance one year at a time, asked to go from {from} to {to}")]
    Timestep { component: String, from: Time, to: Time },
    #[error("cannot {action} while the core is {phase}")]
    InvalidPhase { action: String, phase: String },
    #[error("{0}")]
    Forbidden(String),
    #[error("numerical integration failed: {0}")]
    Integration(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("{context}")]
    Context {
        context: String,
        #[source]
        source: Box<HectorError>,
    },
}

/// Coarse classification of a [`HectorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    InvalidDate,
    Unit,
    Lookup,
    EmptySeries,
    Lifecycle,
    Io,
}

impl HectorError {
    /// The innermost error, with every added context note removed.
    pub fn root_cause(&self) -> &HectorError {
        let mut current = self;
        while let HectorError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Classify the root cause of this error.
    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            HectorError::InvalidDate { .. } => ErrorKind::InvalidDate,
            HectorError::IncompatibleUnits { .. } | HectorError::UnknownUnit(_) => ErrorKind::Unit,
            HectorError::Lookup { .. } => ErrorKind::Lookup,
            HectorError::EmptySeries(_) => ErrorKind::EmptySeries,
            HectorError::Timestep { .. }
            | HectorError::InvalidPhase { .. }
            | HectorError::Forbidden(_)
            | HectorError::Integration(_) => ErrorKind::Lifecycle,
            HectorError::Io(_) => ErrorKind::Io,
            _ => ErrorKind::Configuration,
        }
    }

    /// Messages from the original cause outwards.
    ///
    /// The first entry describes the root cause and each following entry is
    /// a note added while the error travelled back up, in the order they
    /// were added.
    pub fn chain(&self) -> Vec<String> {
        let mut notes = Vec::new();
        let mut current = self;
        while let HectorError::Context { context, source } = current {
            notes.push(context.clone());
            current = source;
        }
        notes.push(current.to_string());
        notes.reverse();
        notes
    }

    pub fn context(self, context: impl Into<String>) -> Self {
        HectorError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Convenience type for `Result<T, HectorError>`.
pub type HectorResult<T> = Result<T, HectorError>;

/// Attach a description of the failing operation to an error.
pub trait ResultExt<T> {
    fn context<C: Into<String>>(self, context: C) -> HectorResult<T>;

    fn with_context<C: Into<String>, F: FnOnce() -> C>(self, f: F) -> HectorResult<T>;
}

impl<T> ResultExt<T> for HectorResult<T> {
    fn context<C: Into<String>>(self, context: C) -> HectorResult<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<C: Into<String>, F: FnOnce() -> C>(self, f: F) -> HectorResult<T> {
        self.map_err(|e| e.context(f()))
    }
}
