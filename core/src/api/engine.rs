//! The embedding engine.

use std::ffi::CString;

use bia_runtime::sys::{self, RawEngine};

use super::{CoercionError, EngineOptions, Error, LifecycleError, Result};
use crate::values::function::{CallbackState, Registry};
use crate::values::{Gc, HostValue, Parameters};

/// Owner of one Bia runtime instance.
///
/// The engine manages:
/// - the runtime instance (closed by [`Engine::close`] or on drop)
/// - the host functions registered with it, kept alive until it closes
///
/// Once closed, every operation fails with [`LifecycleError::EngineClosed`],
/// and every handle derived from the engine becomes invalid.
///
/// # Example
///
/// ```
/// use bia_bridge_core::api::{Engine, EngineOptions, OutputBuffer};
///
/// let output = OutputBuffer::new();
/// let mut engine = Engine::with_options(EngineOptions::default().capture(output.clone())).unwrap();
///
/// let mut calls: i64 = 0;
/// engine
///     .put_function("next", move |_| {
///         calls += 1;
///         Ok(Some(calls.into()))
///     })
///     .unwrap();
///
/// engine.run_str("print(next()); print(next())").unwrap();
/// assert_eq!(output.contents(), "1\n2\n");
/// ```
pub struct Engine {
    raw: Option<RawEngine>,
    functions: Registry,
    options: EngineOptions,
}

impl Engine {
    /// Create an engine with default options.
    pub fn new() -> Result<Self> {
        Self::with_options(EngineOptions::default())
    }

    /// Create an engine. Fails if the runtime cannot allocate its state.
    pub fn with_options(options: EngineOptions) -> Result<Self> {
        let raw = sys::engine_new(options.to_runtime())
            .ok_or_else(|| Error::Allocation("runtime state".to_string()))?;
        tracing::debug!(max_values = ?options.max_values, "Engine created");
        Ok(Self {
            raw: Some(raw),
            functions: Registry::default(),
            options,
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn is_closed(&self) -> bool {
        self.raw.is_none()
    }

    /// The engine's collector.
    pub fn gc(&self) -> Result<Gc> {
        Ok(Gc::from_raw(sys::engine_gc(self.raw()?)))
    }

    /// Load the standard library with `options` as the script's arguments.
    pub fn use_library<I, S>(&mut self, options: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let options = options
            .into_iter()
            .map(|option| CString::new(option.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| CoercionError::InteriorNul)?;
        let args: Vec<_> = options.iter().map(CString::as_c_str).collect();

        sys::engine_use_bsl(self.raw_mut()?, &args).map_err(|fault| match Error::from(fault) {
            err @ (Error::Library(_) | Error::Lifecycle(_)) => err,
            err => Error::Library(err.to_string()),
        })?;
        tracing::debug!(options = args.len(), "Standard library loaded");
        Ok(())
    }

    /// Bind `name` to `value` in the global namespace.
    ///
    /// Both the name and the value are created, bound and then handed to the
    /// collector. If any step fails, whatever was created is released.
    pub fn put_value(&mut self, name: &str, value: impl Into<HostValue>) -> Result<()> {
        let gc = self.gc()?;
        // Dropping a pending creation releases it.
        let mut ident = gc.create(name)?;
        let mut value = gc.create(value)?;
        sys::engine_put(self.raw_mut()?, &ident.raw_member(), &value.raw_member())?;
        ident.start_monitoring()?;
        value.start_monitoring()?;
        tracing::debug!(name, "Global bound");
        Ok(())
    }

    /// Register `function` under `name`.
    ///
    /// The closure runs synchronously, on the thread calling [`Engine::run`],
    /// every time a script calls `name`. It receives a [`Parameters`] view that
    /// is only valid until it returns.
    pub fn put_function<F>(&mut self, name: &str, function: F) -> Result<()>
    where
        F: FnMut(Parameters) -> Result<Option<HostValue>> + Send + 'static,
    {
        let raw = self.raw.as_mut().ok_or(LifecycleError::EngineClosed)?;
        self.functions.register(raw, name, Box::new(function))
    }

    /// Parse and execute `source`.
    ///
    /// Any parse or runtime failure, including a failing host function, is
    /// reported as [`Error::Execution`]; the details are logged.
    pub fn run(&mut self, source: &[u8]) -> Result<()> {
        tracing::debug!(bytes = source.len(), "Running script");
        sys::engine_run(self.raw_mut()?, source).map_err(|fault| match Error::from(fault) {
            err @ Error::Lifecycle(LifecycleError::EngineClosed) => err,
            _ => Error::Execution,
        })
    }

    pub fn run_str(&mut self, source: &str) -> Result<()> {
        self.run(source.as_bytes())
    }

    /// Names of the registered host functions, sorted.
    pub fn function_names(&self) -> Vec<&str> {
        self.functions.names()
    }

    pub fn function_state(&self, name: &str) -> Option<CallbackState> {
        self.functions.get(name).map(|context| context.state())
    }

    /// How many times the host function `name` has been called.
    pub fn invocations(&self, name: &str) -> Option<u64> {
        self.functions.get(name).map(|context| context.invocations())
    }

    /// Close the runtime instance and release every registered function.
    pub fn close(&mut self) -> Result<()> {
        let raw = self.raw.take().ok_or(LifecycleError::EngineClosed)?;
        sys::engine_free(raw);
        self.functions.release_all();
        tracing::debug!("Engine closed");
        Ok(())
    }

    fn raw(&self) -> Result<&RawEngine> {
        Ok(self.raw.as_ref().ok_or(LifecycleError::EngineClosed)?)
    }

    fn raw_mut(&mut self) -> Result<&mut RawEngine> {
        Ok(self.raw.as_mut().ok_or(LifecycleError::EngineClosed)?)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if !self.is_closed() {
            let _ = self.close();
        }
    }
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("closed", &self.is_closed())
            .field("functions", &self.function_names())
            .finish_non_exhaustive()
    }
}
