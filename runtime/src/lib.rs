//! Bia reference runtime.
//!
//! A small, self-contained implementation of the native contract that the
//! bridge in `bia-bridge-core` is written against. Everything a host may touch
//! lives in [`sys`]: opaque engine, collector, value and argument references,
//! plus the fixed set of operations on them. The rest of the crate is private.
//!
//! The language understood here is intentionally tiny: imports, `let`
//! bindings, literals, dictionaries, member access and calls with positional
//! and keyword arguments. It is enough to drive host callbacks and to observe
//! values flowing in both directions.
//!
//! # Memory model
//!
//! Values live in a generational slot heap. A value is either *unmanaged*
//! (owned by whoever created it through [`sys`], never collected) or
//! *managed* (owned by the collector). Collection is mark-and-sweep with
//! globals, loaded modules, unmanaged values, live call frames and pinned
//! temporaries as roots. It only runs between top-level statements or when
//! explicitly requested.

pub mod sys;

mod bsl;
mod error;
mod heap;
mod interp;
mod options;
mod parser;
mod value;

pub use error::{Fault, ScriptError};
pub use heap::GcStats;
pub use options::{Output, OutputBuffer, RuntimeOptions};
