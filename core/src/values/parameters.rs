//! Arguments of one host function call.

use std::ffi::CString;
use std::sync::{Arc, Mutex};

use bia_runtime::sys::{self, RawParameters};

use super::member::{Member, Origin};
use super::{FromMember, lock};
use crate::api::{CoercionError, Error, LifecycleError, Result};

/// Call-scoped view of a host function's arguments.
///
/// Every operation takes an internal lock and fails with
/// [`LifecycleError::InvalidParameters`] once the call has returned, so a
/// view (or a [`Member`] read from it) that escapes the closure, for example
/// into another thread, can never reach a completed call's arguments.
#[derive(Clone)]
pub struct Parameters {
    call: Arc<Mutex<Option<RawParameters>>>,
}

impl Parameters {
    pub(crate) fn new(raw: RawParameters) -> Self {
        Self {
            call: Arc::new(Mutex::new(Some(raw))),
        }
    }

    /// Number of positional arguments.
    pub fn size(&self) -> Result<usize> {
        self.with_call(|raw| Ok(sys::parameters_count(raw)?))
    }

    /// The positional argument at `index`.
    pub fn at(&self, index: usize) -> Result<Member> {
        self.with_call(|raw| {
            let count = sys::parameters_count(raw)?;
            if index >= count {
                return Err(Error::OutOfRange { index, count });
            }
            Ok(self.member(sys::parameters_at(raw, index)?))
        })
    }

    /// The keyword argument `name`.
    pub fn get(&self, name: &str) -> Result<Member> {
        self.with_call(|raw| {
            let key = CString::new(name).map_err(|_| CoercionError::InteriorNul)?;
            Ok(self.member(sys::parameters_kwargs_find(raw, &key)?))
        })
    }

    /// The positional argument at `index`, cast to `T`.
    pub fn arg<T: FromMember>(&self, index: usize) -> Result<T> {
        self.at(index)?.cast()
    }

    /// The keyword argument `name`, cast to `T`.
    pub fn kwarg<T: FromMember>(&self, name: &str) -> Result<T> {
        self.get(name)?.cast()
    }

    /// Whether the call this view belongs to is still running.
    pub fn is_valid(&self) -> bool {
        lock(&self.call).is_some()
    }

    /// Invalidate the view when the returned guard is dropped.
    pub(crate) fn scope(&self) -> CallScope {
        CallScope {
            call: self.call.clone(),
        }
    }

    fn member(&self, raw: sys::RawMember) -> Member {
        Member::new(raw, Origin::Call(self.call.clone()))
    }

    fn with_call<T>(&self, f: impl FnOnce(&RawParameters) -> Result<T>) -> Result<T> {
        let call = lock(&self.call);
        match call.as_ref() {
            Some(raw) => f(raw),
            None => Err(LifecycleError::InvalidParameters.into()),
        }
    }
}

impl core::fmt::Debug for Parameters {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Parameters")
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// Clears the raw call context under the view's lock when dropped, including
/// during unwinding.
pub(crate) struct CallScope {
    call: Arc<Mutex<Option<RawParameters>>>,
}

impl Drop for CallScope {
    fn drop(&mut self) {
        lock(&self.call).take();
    }
}
