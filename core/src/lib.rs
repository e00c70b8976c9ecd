//! Host-side bridge to the Bia scripting runtime.
//!
//! The runtime owns its values and collects them; the host creates values,
//! hands them over, reads arguments of host function calls and registers
//! closures the runtime can call. Everything crossing the boundary goes
//! through a handle with an explicit ownership state, so misuse (double
//! release, reading arguments after a call returned, touching a closed engine)
//! surfaces as an [`api::Error`] instead of a dangling native reference.
//!
//! # Example
//!
//! ```
//! use bia_bridge_core::api::{Engine, EngineOptions, OutputBuffer};
//!
//! let output = OutputBuffer::new();
//! let mut engine = Engine::with_options(EngineOptions::default().capture(output.clone())).unwrap();
//!
//! engine.put_value("greeting", "hello").unwrap();
//! engine
//!     .put_function("twice", |params| {
//!         let n: i64 = params.arg(0)?;
//!         Ok(Some((n * 2).into()))
//!     })
//!     .unwrap();
//!
//! engine.run_str("print(greeting, twice(21))").unwrap();
//! assert_eq!(output.contents(), "hello 42\n");
//! ```

pub mod api;
pub mod values;

pub use api::{Engine, EngineOptions, Error, ErrorKind, Result};
pub use values::{Creation, Gc, HostValue, Member, Ownership, Parameters};
