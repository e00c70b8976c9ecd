//! Public API for embedding the Bia runtime.
//!
//! An [`Engine`] owns one runtime instance. Values go in through
//! [`Engine::put_value`] or a [`Gc`](crate::values::Gc) creation session,
//! host closures through [`Engine::put_function`], and scripts through
//! [`Engine::run`]. Every failure is reported once, as an [`Error`] whose
//! [`ErrorKind`] tells the caller which part of the protocol went wrong.

pub mod engine;
pub mod error;
pub mod options;

pub use engine::Engine;
pub use error::{CoercionError, Error, ErrorKind, LifecycleError, Result};
pub use options::{EngineOptions, Output, OutputBuffer};

#[cfg(test)]
mod engine_test;
#[cfg(test)]
mod error_test;
