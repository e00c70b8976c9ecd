//! Borrowed references to runtime values.

use std::sync::{Arc, Mutex};

use bia_runtime::Fault;
use bia_runtime::sys::{self, RawMember, RawParameters};

use super::{FromMember, Ownership, lock};
use crate::api::{LifecycleError, Result};

/// What a member's validity is scoped to.
#[derive(Clone)]
pub(crate) enum Origin {
    /// An argument of a host function call; valid until the call returns.
    Call(Arc<Mutex<Option<RawParameters>>>),
    /// A peeked creation; valid until the creation is released.
    Handle(Arc<Mutex<Ownership>>),
}

/// Borrowed, read-only access to a runtime value.
///
/// A member owns nothing. It is valid only while the scope that produced it
/// is: the host function call for arguments, the handle for peeked
/// creations. Every read after that fails with a [`LifecycleError`].
#[derive(Clone)]
pub struct Member {
    raw: RawMember,
    origin: Origin,
}

impl Member {
    pub(crate) fn new(raw: RawMember, origin: Origin) -> Self {
        Self { raw, origin }
    }

    /// Read the value as `T`.
    pub fn cast<T: FromMember>(&self) -> Result<T> {
        T::from_member(self)
    }

    /// Read the value into `out`. `out` is left untouched on failure.
    pub fn cast_into<T: FromMember>(&self, out: &mut T) -> Result<()> {
        *out = self.cast()?;
        Ok(())
    }

    /// Whether the value is the runtime's `nil`.
    pub fn is_null(&self) -> Result<bool> {
        self.read(sys::member_is_nil)
    }

    /// Name of the value's runtime type.
    pub fn type_name(&self) -> Result<&'static str> {
        self.read(sys::member_type_name)
    }

    /// Run a native read while the producing scope is locked and still valid.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&RawMember) -> Result<T, Fault>) -> Result<T> {
        match &self.origin {
            Origin::Call(call) => {
                let call = lock(call);
                if call.is_none() {
                    return Err(LifecycleError::InvalidParameters.into());
                }
                Ok(f(&self.raw)?)
            }
            Origin::Handle(state) => {
                let state = lock(state);
                if *state == Ownership::Invalidated {
                    return Err(LifecycleError::Released.into());
                }
                Ok(f(&self.raw)?)
            }
        }
    }
}

impl core::fmt::Debug for Member {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let scope = match &self.origin {
            Origin::Call(_) => "call",
            Origin::Handle(_) => "handle",
        };
        f.debug_struct("Member")
            .field("raw", &self.raw)
            .field("scope", &scope)
            .finish()
    }
}
