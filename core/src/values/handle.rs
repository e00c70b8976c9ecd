//! Owned value handles and their ownership protocol.
//!
//! A freshly created runtime value belongs to the host ([`Ownership::OwnedPending`]).
//! Exactly one of two transitions ends that state:
//!
//! ```text
//! OwnedPending --release()----------> Invalidated
//! OwnedPending --start_monitoring()-> Managed
//! ```
//!
//! Any other transition is a [`LifecycleError`]. Once a handle is Managed, the
//! host only holds a non-owning reference: the collector decides when the
//! value goes away.

use std::sync::{Arc, Mutex};

use bia_runtime::sys::{self, RawCreation, RawMember};

use super::member::{Member, Origin};
use super::{Gc, HostValue, lock};
use crate::api::{LifecycleError, Result};

/// Ownership state of a [`Creation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// Created by the host and not yet handed to the collector.
    OwnedPending,
    /// Owned by the collector.
    Managed,
    /// Released. The handle must not be used again.
    Invalidated,
}

impl Ownership {
    fn require_pending(self) -> Result<(), LifecycleError> {
        match self {
            Ownership::OwnedPending => Ok(()),
            Ownership::Managed => Err(LifecycleError::AlreadyManaged),
            Ownership::Invalidated => Err(LifecycleError::Released),
        }
    }
}

/// A runtime value created by the host.
///
/// Obtained from [`Gc::create`]. Dropping a creation that is still
/// OwnedPending releases it.
pub struct Creation {
    raw: RawCreation,
    gc: Gc,
    state: Arc<Mutex<Ownership>>,
}

impl Creation {
    pub(crate) fn new(raw: RawCreation, gc: Gc) -> Self {
        Self {
            raw,
            gc,
            state: Arc::new(Mutex::new(Ownership::OwnedPending)),
        }
    }

    pub fn state(&self) -> Ownership {
        *lock(&self.state)
    }

    /// Insert `key: value` into a dictionary that is still OwnedPending.
    ///
    /// Key and value are created, inserted and handed to the collector before
    /// this returns. On failure the dictionary keeps its previous entries and
    /// stays OwnedPending.
    pub fn put(&mut self, key: &str, value: impl Into<HostValue>) -> Result<()> {
        lock(&self.state).require_pending()?;

        // Dropping a pending creation releases it, so every early return
        // below reclaims what was created so far.
        let mut key = self.gc.create(key)?;
        let mut value = self.gc.create(value)?;
        sys::creation_dict_put(&self.raw, &key.raw_member(), &value.raw_member())?;
        key.start_monitoring()?;
        value.start_monitoring()?;
        Ok(())
    }

    /// Free the value. The handle becomes Invalidated.
    pub fn release(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.require_pending()?;
        sys::creation_free(&self.raw)?;
        *state = Ownership::Invalidated;
        tracing::trace!("Creation released");
        Ok(())
    }

    /// Hand the value to the collector. The handle becomes Managed.
    pub fn start_monitoring(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.require_pending()?;
        sys::creation_start_monitoring(&self.raw)?;
        *state = Ownership::Managed;
        tracing::trace!("Creation handed to the collector");
        Ok(())
    }

    /// Borrow the value without changing its ownership.
    pub fn peek(&self) -> Result<Member> {
        if self.state() == Ownership::Invalidated {
            return Err(LifecycleError::Released.into());
        }
        Ok(Member::new(
            self.raw_member(),
            Origin::Handle(self.state.clone()),
        ))
    }

    pub(crate) fn raw_member(&self) -> RawMember {
        sys::creation_peek(&self.raw)
    }
}

impl core::fmt::Debug for Creation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Creation")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Drop for Creation {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        if *state != Ownership::OwnedPending {
            return;
        }
        *state = Ownership::Invalidated;
        if let Err(fault) = sys::creation_free(&self.raw) {
            // The engine is gone, or the value with it.
            tracing::debug!(%fault, "Dropped creation could not be released");
        }
    }
}
