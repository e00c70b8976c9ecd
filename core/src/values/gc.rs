//! Collector handles and creation sessions.

use core::any::Any;
use std::ffi::CString;

use bia_runtime::sys::{self, RawGc};

pub use bia_runtime::GcStats;

use super::{Creation, HostValue};
use crate::api::{CoercionError, LifecycleError, Result};

/// Handle onto an engine's collector.
///
/// Cheap to clone and usable from any thread, including threads spawned by a
/// host closure. Once the engine is closed every operation fails with
/// [`LifecycleError::EngineClosed`].
#[derive(Clone)]
pub struct Gc {
    raw: RawGc,
}

impl Gc {
    pub(crate) fn from_raw(raw: RawGc) -> Self {
        Self { raw }
    }

    /// The collector of the engine currently running a script on this thread.
    ///
    /// Only available inside a host function call.
    pub fn active() -> Result<Self> {
        sys::active_gc()
            .map(Self::from_raw)
            .ok_or_else(|| LifecycleError::NoActiveGc.into())
    }

    /// Create a runtime value from a host value.
    ///
    /// The result is OwnedPending. Mappings are built entry by entry; if any
    /// entry fails, the half-built container is released and never exposed.
    pub fn create(&self, value: impl Into<HostValue>) -> Result<Creation> {
        let value = value.into();
        let raw = match &value {
            HostValue::Int(v) => sys::create_llong(&self.raw, *v)?,
            HostValue::Float(v) => sys::create_double(&self.raw, *v)?,
            HostValue::Str(s) => {
                let s = CString::new(s.as_str()).map_err(|_| CoercionError::InteriorNul)?;
                sys::create_cstring(&self.raw, &s)?
            }
            HostValue::Map(_) => sys::create_dict(&self.raw)?,
        };

        let mut creation = Creation::new(raw, self.clone());
        if let HostValue::Map(entries) = value {
            for (key, value) in entries {
                creation.put(&key, value)?;
            }
        }
        Ok(creation)
    }

    /// Create a runtime value from a host value of a type only known at runtime.
    ///
    /// Fails with [`CoercionError::Unsupported`] for anything outside the
    /// closed set [`HostValue`] covers; no handle is produced then.
    pub fn create_any<T: Any>(&self, value: &T) -> Result<Creation> {
        self.create(HostValue::from_any(value)?)
    }

    /// Run a full collection.
    pub fn collect(&self) -> Result<GcStats> {
        let stats = sys::gc_collect(&self.raw)?;
        tracing::debug!(collected = stats.collected, live = stats.live, "Collected");
        Ok(stats)
    }

    pub fn stats(&self) -> Result<GcStats> {
        Ok(sys::gc_stats(&self.raw)?)
    }
}

impl core::fmt::Debug for Gc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Gc").field(&self.raw).finish()
    }
}
