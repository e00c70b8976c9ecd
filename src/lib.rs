//! Bia Bridge - embed the Bia scripting runtime in a Rust host
//!
//! # Overview
//!
//! The runtime is garbage collected and owns every value a script can see.
//! The bridge lets a host:
//!
//! - create values and hand them over to the collector
//! - bind global names to host values
//! - register closures that scripts call like ordinary functions
//! - read a call's arguments through a view that expires with the call
//!
//! # Quick Start
//!
//! ```
//! use bia_bridge::{Engine, EngineOptions, OutputBuffer};
//!
//! let output = OutputBuffer::new();
//! let mut engine = Engine::with_options(EngineOptions::default().capture(output.clone())).unwrap();
//!
//! engine.use_library(["demo"]).unwrap();
//! engine
//!     .put_function("foo", |_params| Ok(Some(99.into())))
//!     .unwrap();
//! engine.run_str("import io; io.print(foo())").unwrap();
//!
//! assert_eq!(output.contents(), "99\n");
//! ```
//!
//! # Ownership
//!
//! A value created by the host starts out owned by the host. Calling
//! [`Creation::start_monitoring`] hands it to the collector, [`Creation::release`]
//! frees it. Either happens at most once; afterwards the handle reports
//! [`LifecycleError::Released`] or [`LifecycleError::AlreadyManaged`].
//!
//! ```
//! use bia_bridge::{Engine, Error, LifecycleError};
//!
//! let engine = Engine::new().unwrap();
//! let mut value = engine.gc().unwrap().create(42).unwrap();
//! value.start_monitoring().unwrap();
//! assert_eq!(
//!     value.release(),
//!     Err(Error::Lifecycle(LifecycleError::AlreadyManaged))
//! );
//! ```

// Re-export public API from bia_bridge_core
pub use bia_bridge_core::api::{
    CoercionError, Engine, EngineOptions, Error, ErrorKind, LifecycleError, Output, OutputBuffer,
    Result,
};

// Re-export handles and conversions
pub use bia_bridge_core::values::{
    self, CallbackState, Creation, FromMember, Gc, GcStats, HostValue, Member, Ownership,
    Parameters,
};
