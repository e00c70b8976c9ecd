//! Host functions callable from scripts.
//!
//! Every host function is installed with the same [`trampoline`] and a
//! capability token: an `Arc` of its [`CallbackContext`]. The runtime hands the
//! token back unchanged on every call and the trampoline resolves it by
//! downcast. Contexts are owned by the engine's [`Registry`] and live exactly
//! as long as the engine does.

use std::ffi::CString;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, TryLockError};

use bia_runtime::Fault;
use bia_runtime::sys::{self, RawEngine, RawMember, RawParameters, Token};
use hashbrown::HashMap;

use super::{Gc, HostValue, Parameters, lock};
use crate::api::{CoercionError, Error, LifecycleError, Result};

/// A boxed host closure.
///
/// `Ok(None)` returns `nil` to the script. `Err` aborts the running script.
pub type HostFunction = Box<dyn FnMut(Parameters) -> Result<Option<HostValue>> + Send>;

/// Lifecycle of a registered host function.
///
/// `Created -> Registered -> Released`; the last transition happens when the
/// owning engine closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackState {
    Created,
    Registered,
    Released,
}

/// Everything the trampoline needs to run one host function.
pub(crate) struct CallbackContext {
    name: String,
    function: Mutex<Option<HostFunction>>,
    state: Mutex<CallbackState>,
    invocations: AtomicU64,
}

impl CallbackContext {
    fn new(name: &str, function: HostFunction) -> Self {
        Self {
            name: name.to_string(),
            function: Mutex::new(Some(function)),
            state: Mutex::new(CallbackState::Created),
            invocations: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> CallbackState {
        *lock(&self.state)
    }

    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    fn set_state(&self, state: CallbackState) {
        *lock(&self.state) = state;
    }

    fn invoke(&self, raw: RawParameters) -> Result<Option<RawMember>> {
        if self.state() != CallbackState::Registered {
            return Err(LifecycleError::EngineClosed.into());
        }
        let mut guard = match self.function.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                return Err(Error::callback(format!("`{}` is already running", self.name)));
            }
        };
        let Some(function) = guard.as_mut() else {
            return Err(LifecycleError::EngineClosed.into());
        };
        let calls = self.invocations.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(function = %self.name, calls, "Invoking host function");

        let params = Parameters::new(raw);
        let result = {
            let _scope = params.scope();
            panic::catch_unwind(AssertUnwindSafe(|| function(params)))
        };
        drop(guard);

        let result =
            result.map_err(|_| Error::callback(format!("`{}` panicked", self.name)))?;
        let Some(value) = result? else {
            return Ok(None);
        };
        let mut creation = Gc::active()?.create(value)?;
        creation.start_monitoring()?;
        Ok(Some(creation.raw_member()))
    }
}

/// The single entry point the runtime calls for every host function.
pub(crate) fn trampoline(raw: RawParameters, token: &Token) -> Result<Option<RawMember>, Fault> {
    let Some(context) = token.downcast_ref::<CallbackContext>() else {
        return Err(Fault::Callback("unrecognized host function token".to_string()));
    };
    context.invoke(raw).map_err(|err| {
        tracing::warn!(function = %context.name, error = %err, "Host function failed");
        Fault::Callback(err.to_string())
    })
}

/// Host functions registered with one engine, by name.
#[derive(Default)]
pub(crate) struct Registry {
    contexts: HashMap<String, Arc<CallbackContext>>,
}

impl Registry {
    pub fn register(&mut self, raw: &mut RawEngine, name: &str, function: HostFunction) -> Result<()> {
        if self.contexts.contains_key(name) {
            return Err(Error::Registration {
                name: name.to_string(),
                reason: "already registered".to_string(),
            });
        }
        let native_name = CString::new(name).map_err(|_| CoercionError::InteriorNul)?;

        let context = Arc::new(CallbackContext::new(name, function));
        let token: Token = context.clone();
        sys::engine_put_function(raw, &native_name, trampoline, token)?;
        context.set_state(CallbackState::Registered);
        self.contexts.insert(name.to_string(), context);
        tracing::debug!(function = name, "Registered host function");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CallbackContext> {
        self.contexts.get(name).map(|context| &**context)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contexts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Release every context and drop its closure. Called once the runtime
    /// can no longer call them; the names and counters stay queryable.
    pub fn release_all(&mut self) {
        for context in self.contexts.values() {
            context.set_state(CallbackState::Released);
            lock(&context.function).take();
        }
    }
}
