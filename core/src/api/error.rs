//! Public error types for the bridge.
//!
//! Every native failure is converted at the boundary into exactly one
//! [`Error`]; [`Error::kind`] classifies it.

use bia_runtime::Fault;
use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The runtime could not allocate an engine or a value.
    Allocation,
    /// A handle, view or engine was used outside its valid state.
    Lifecycle,
    /// A host value could not cross the boundary, or a cast did not apply.
    Coercion,
    /// A global or function name was rejected.
    Registration,
    /// Script execution failed.
    Execution,
    /// An argument index or keyword does not exist in the current call.
    Argument,
    /// The standard library could not be loaded.
    Library,
}

/// Public error type for all bridge operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("allocation failed: {0}")]
    Allocation(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error("cannot register `{name}`: {reason}")]
    Registration { name: String, reason: String },

    /// Aggregate script failure. The runtime's diagnostic is logged, not kept.
    #[error("execution failed")]
    Execution,

    /// Raised by a host closure to abort the running script.
    #[error("{0}")]
    Callback(String),

    #[error("argument index {index} out of range for {count} argument(s)")]
    OutOfRange { index: usize, count: usize },

    #[error("no keyword argument named `{0}`")]
    MissingKeyword(String),

    #[error("standard library rejected: {0}")]
    Library(String),
}

impl Error {
    /// Error for a host closure that wants the running script to fail.
    pub fn callback(message: impl Into<String>) -> Self {
        Error::Callback(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Allocation(_) => ErrorKind::Allocation,
            Error::Lifecycle(_) => ErrorKind::Lifecycle,
            Error::Coercion(_) => ErrorKind::Coercion,
            Error::Registration { .. } => ErrorKind::Registration,
            Error::Execution | Error::Callback(_) => ErrorKind::Execution,
            Error::OutOfRange { .. } | Error::MissingKeyword(_) => ErrorKind::Argument,
            Error::Library(_) => ErrorKind::Library,
        }
    }
}

/// Misuse of a handle, a parameters view or an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("handle has already been released")]
    Released,

    #[error("handle is already managed by the collector")]
    AlreadyManaged,

    #[error("parameters used after the call returned")]
    InvalidParameters,

    #[error("engine is closed")]
    EngineClosed,

    #[error("value is no longer alive")]
    StaleValue,

    #[error("no collector is active on this thread")]
    NoActiveGc,
}

/// Failure to convert between a host value and a runtime value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("unsupported host type `{type_name}`")]
    Unsupported { type_name: &'static str },

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{value} does not fit in {target}")]
    Overflow { value: i64, target: &'static str },

    #[error("string contains an interior NUL byte")]
    InteriorNul,

    #[error("string is not valid UTF-8")]
    InvalidUtf8,
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::EngineGone => LifecycleError::EngineClosed.into(),
            Fault::OutOfMemory { limit } => {
                Error::Allocation(format!("live value limit of {} reached", limit))
            }
            Fault::StaleValue => LifecycleError::StaleValue.into(),
            Fault::NotOwned | Fault::AlreadyManaged => LifecycleError::AlreadyManaged.into(),
            Fault::StaleFrame => LifecycleError::InvalidParameters.into(),
            Fault::TypeMismatch { expected, found } => {
                CoercionError::TypeMismatch { expected, found }.into()
            }
            Fault::InvalidString => CoercionError::InvalidUtf8.into(),
            Fault::OutOfRange { index, count } => Error::OutOfRange { index, count },
            Fault::NotFound(name) => Error::MissingKeyword(name),
            Fault::Rejected { name, reason } => Error::Registration {
                name,
                reason: reason.to_string(),
            },
            Fault::LibraryLoaded => Error::Library(fault.to_string()),
            Fault::Script(err) => {
                tracing::debug!(%err, "Script failed");
                Error::Execution
            }
            Fault::Arity { .. } | Fault::Callback(_) => {
                tracing::debug!(%fault, "Script failed");
                Error::Execution
            }
        }
    }
}
