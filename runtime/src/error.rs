//! Fault codes reported across the native contract.

use core::fmt;
use thiserror::Error;

/// Failure of a native operation.
///
/// Every operation in [`crate::sys`] reports failure through exactly one of
/// these. They mirror the status codes of a C API; callers are expected to
/// translate them into their own error types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Fault {
    #[error("engine has been freed")]
    EngineGone,

    #[error("live value limit of {limit} reached")]
    OutOfMemory { limit: usize },

    #[error("stale value reference")]
    StaleValue,

    #[error("value is owned by the collector")]
    NotOwned,

    #[error("value is already managed")]
    AlreadyManaged,

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("string is not valid UTF-8")]
    InvalidString,

    #[error("argument index {index} out of range for {count} argument(s)")]
    OutOfRange { index: usize, count: usize },

    #[error("expected {expected} argument(s), got {found}")]
    Arity { expected: usize, found: usize },

    #[error("no keyword argument named `{0}`")]
    NotFound(String),

    #[error("call frame is no longer active")]
    StaleFrame,

    #[error("name `{name}` rejected: {reason}")]
    Rejected { name: String, reason: &'static str },

    #[error("standard library is already loaded")]
    LibraryLoaded,

    #[error("host callback failed: {0}")]
    Callback(String),

    #[error("script failed: {0}")]
    Script(ScriptError),
}

/// Error raised while parsing or executing a script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ScriptError {
    pub(crate) fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl core::error::Error for ScriptError {}
