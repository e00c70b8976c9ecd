//! Values crossing the host/runtime boundary.
//!
//! - [`HostValue`]: the closed set of host values the runtime can receive.
//! - [`Gc`] and [`Creation`]: allocating runtime values and handing them over.
//! - [`Member`] and [`FromMember`]: borrowed reads of runtime values.
//! - [`Parameters`]: the arguments of one host function call.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod casting;
pub mod function;
pub mod gc;
pub mod handle;
pub mod host;
pub mod member;
pub mod parameters;

pub use casting::FromMember;
pub use function::{CallbackState, HostFunction};
pub use gc::{Gc, GcStats};
pub use handle::{Creation, Ownership};
pub use host::HostValue;
pub use member::Member;
pub use parameters::Parameters;

static_assertions::assert_impl_all!(Gc: Send, Sync, Clone);
static_assertions::assert_impl_all!(Creation: Send, Sync);
static_assertions::assert_impl_all!(Member: Send, Sync, Clone);
static_assertions::assert_impl_all!(Parameters: Send, Sync, Clone);

/// The guarded data is plain state, so a panic while holding the lock cannot
/// leave it half-updated.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod handle_test;
#[cfg(test)]
mod host_test;
