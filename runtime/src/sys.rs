//! The native contract.
//!
//! This is the complete surface a host may use, shaped after a C embedding
//! API: opaque references, free functions, and a status ([`Fault`]) for every
//! fallible operation. References never keep the engine alive; once the
//! engine is freed every operation on them fails with [`Fault::EngineGone`].
//!
//! Values created here are *unmanaged*: the creator must either free them
//! ([`creation_free`]) or hand them to the collector
//! ([`creation_start_monitoring`]). The runtime validates both transitions, but
//! hosts are expected to track ownership themselves.

use core::any::Any;
use core::cell::RefCell;
use core::fmt;
use std::ffi::{CStr, CString};
use std::sync::{Arc, Weak};

use bumpalo::Bump;

use crate::bsl;
use crate::error::Fault;
use crate::heap::{GcStats, Heap, Shared};
use crate::interp::Interpreter;
use crate::options::RuntimeOptions;
use crate::parser;
use crate::value::{HostFunction, Value, ValueId, is_identifier};

/// Opaque context token handed back unchanged on every trampoline call.
pub type Token = Arc<dyn Any + Send + Sync>;

/// Fixed entry point for every host function.
///
/// Receives the arguments of one call and the token given at registration.
/// `Ok(None)` means "no value" and becomes `nil`. A returned member must be
/// managed by this engine's collector.
pub type Trampoline = fn(RawParameters, &Token) -> Result<Option<RawMember>, Fault>;

thread_local! {
    static ACTIVE: RefCell<Vec<Weak<Shared>>> = const { RefCell::new(Vec::new()) };
}

/// An engine instance. Freed by [`engine_free`] or by dropping it.
pub struct RawEngine {
    shared: Arc<Shared>,
}

/// A collector handle. Cheap to clone and usable from any thread.
#[derive(Clone)]
pub struct RawGc {
    shared: Weak<Shared>,
}

/// An unmanaged value, fresh from a `create_*` call.
pub struct RawCreation {
    id: ValueId,
    shared: Weak<Shared>,
}

/// A borrowed reference to a value.
#[derive(Clone)]
pub struct RawMember {
    pub(crate) id: ValueId,
    pub(crate) shared: Weak<Shared>,
}

/// The argument context of one host function call.
pub struct RawParameters {
    pub(crate) frame: u64,
    pub(crate) shared: Weak<Shared>,
}

impl fmt::Debug for RawEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawEngine").finish_non_exhaustive()
    }
}

impl fmt::Debug for RawGc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawGc")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl fmt::Debug for RawCreation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawCreation").field(&self.id.index).finish()
    }
}

impl fmt::Debug for RawMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawMember").field(&self.id.index).finish()
    }
}

impl fmt::Debug for RawParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawParameters").field(&self.frame).finish()
    }
}

fn upgrade(shared: &Weak<Shared>) -> Result<Arc<Shared>, Fault> {
    shared.upgrade().ok_or(Fault::EngineGone)
}

fn with_heap<T>(
    shared: &Weak<Shared>,
    f: impl FnOnce(&mut Heap) -> Result<T, Fault>,
) -> Result<T, Fault> {
    let shared = upgrade(shared)?;
    let mut heap = shared.lock();
    f(&mut heap)
}

fn same_engine(a: &Weak<Shared>, b: &Weak<Shared>) -> Result<(), Fault> {
    if Weak::ptr_eq(a, b) {
        Ok(())
    } else {
        Err(Fault::StaleValue)
    }
}

// ============================================================================
// Engine lifecycle
// ============================================================================

/// Create an engine. Returns `None` if its initial state cannot be allocated.
pub fn engine_new(options: RuntimeOptions) -> Option<RawEngine> {
    let shared = match Shared::new(&options) {
        Ok(shared) => shared,
        Err(fault) => {
            tracing::debug!(%fault, "Engine allocation failed");
            return None;
        }
    };
    if let Err(fault) = bsl::install_builtins(&mut shared.lock()) {
        tracing::debug!(%fault, "Engine allocation failed");
        return None;
    }
    Some(RawEngine {
        shared: Arc::new(shared),
    })
}

/// Free an engine. Every reference derived from it becomes stale.
pub fn engine_free(engine: RawEngine) {
    drop(engine);
}

/// Load the standard library, exposing `args` as the script's argument vector.
pub fn engine_use_bsl(engine: &mut RawEngine, args: &[&CStr]) -> Result<(), Fault> {
    let argv = args
        .iter()
        .map(|arg| arg.to_str().map(str::to_string))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| Fault::InvalidString)?;
    bsl::load(&mut engine.shared.lock(), argv)
}

/// Parse and execute `code`.
pub fn engine_run(engine: &mut RawEngine, code: &[u8]) -> Result<(), Fault> {
    let source = core::str::from_utf8(code).map_err(|_| Fault::InvalidString)?;
    let arena = Bump::new();
    let program = parser::parse(&arena, source).map_err(Fault::Script)?;

    let _active = ActiveGuard::enter(&engine.shared);
    Interpreter::new(&engine.shared)
        .execute(program)
        .map_err(Fault::Script)
}

/// Bind the string value `name` to `value` in the global namespace.
pub fn engine_put(engine: &mut RawEngine, name: &RawMember, value: &RawMember) -> Result<(), Fault> {
    let own = Arc::downgrade(&engine.shared);
    same_engine(&own, &name.shared)?;
    same_engine(&own, &value.shared)?;

    let mut heap = engine.shared.lock();
    let name = heap.str(name.id)?.to_string();
    heap.get(value.id)?;
    check_name(&heap, &name)?;
    heap.set_global(&name, value.id);
    Ok(())
}

/// Install a host function under `name`.
pub fn engine_put_function(
    engine: &mut RawEngine,
    name: &CStr,
    trampoline: Trampoline,
    token: Token,
) -> Result<(), Fault> {
    let name = name.to_str().map_err(|_| Fault::InvalidString)?;
    let mut heap = engine.shared.lock();
    check_name(&heap, name)?;
    let function = heap.alloc(
        Value::Host(HostFunction {
            name: name.to_string(),
            trampoline,
            token,
        }),
        true,
    )?;
    heap.set_global(name, function);
    Ok(())
}

fn check_name(heap: &Heap, name: &str) -> Result<(), Fault> {
    let reason = if !is_identifier(name) {
        "not a valid identifier"
    } else if heap.has_global(name) {
        "already bound"
    } else {
        return Ok(());
    };
    Err(Fault::Rejected {
        name: name.to_string(),
        reason,
    })
}

// ============================================================================
// Collector
// ============================================================================

pub fn engine_gc(engine: &RawEngine) -> RawGc {
    RawGc {
        shared: Arc::downgrade(&engine.shared),
    }
}

/// The collector of the innermost engine currently running on this thread.
pub fn active_gc() -> Option<RawGc> {
    ACTIVE.with(|active| {
        active
            .borrow()
            .last()
            .map(|shared| RawGc {
                shared: shared.clone(),
            })
    })
}

pub fn gc_collect(gc: &RawGc) -> Result<GcStats, Fault> {
    with_heap(&gc.shared, |heap| Ok(heap.collect()))
}

pub fn gc_stats(gc: &RawGc) -> Result<GcStats, Fault> {
    with_heap(&gc.shared, |heap| Ok(heap.stats()))
}

struct ActiveGuard;

impl ActiveGuard {
    fn enter(shared: &Arc<Shared>) -> Self {
        ACTIVE.with(|active| active.borrow_mut().push(Arc::downgrade(shared)));
        ActiveGuard
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            active.borrow_mut().pop();
        });
    }
}

// ============================================================================
// Value creation and lifecycle
// ============================================================================

fn create(gc: &RawGc, value: Value) -> Result<RawCreation, Fault> {
    let id = with_heap(&gc.shared, |heap| heap.alloc(value, false))?;
    Ok(RawCreation {
        id,
        shared: gc.shared.clone(),
    })
}

pub fn create_llong(gc: &RawGc, value: i64) -> Result<RawCreation, Fault> {
    create(gc, Value::Int(value))
}

pub fn create_double(gc: &RawGc, value: f64) -> Result<RawCreation, Fault> {
    create(gc, Value::Float(value))
}

pub fn create_cstring(gc: &RawGc, value: &CStr) -> Result<RawCreation, Fault> {
    let value = value.to_str().map_err(|_| Fault::InvalidString)?;
    create(gc, Value::Str(value.to_string()))
}

pub fn create_dict(gc: &RawGc) -> Result<RawCreation, Fault> {
    create(gc, Value::Dict(Vec::new()))
}

/// Insert `key: value` into an unmanaged dictionary.
pub fn creation_dict_put(
    creation: &RawCreation,
    key: &RawMember,
    value: &RawMember,
) -> Result<(), Fault> {
    same_engine(&creation.shared, &key.shared)?;
    same_engine(&creation.shared, &value.shared)?;
    with_heap(&creation.shared, |heap| {
        heap.dict_put(creation.id, key.id, value.id)
    })
}

/// Free an unmanaged value.
pub fn creation_free(creation: &RawCreation) -> Result<(), Fault> {
    with_heap(&creation.shared, |heap| heap.free(creation.id))
}

/// Hand an unmanaged value over to the collector.
pub fn creation_start_monitoring(creation: &RawCreation) -> Result<(), Fault> {
    with_heap(&creation.shared, |heap| heap.promote(creation.id))
}

pub fn creation_peek(creation: &RawCreation) -> RawMember {
    RawMember {
        id: creation.id,
        shared: creation.shared.clone(),
    }
}

// ============================================================================
// Inspection
// ============================================================================

pub fn member_cast_llong(member: &RawMember) -> Result<i64, Fault> {
    with_heap(&member.shared, |heap| match heap.get(member.id)? {
        Value::Int(v) => Ok(*v),
        other => Err(Fault::TypeMismatch {
            expected: "int",
            found: other.type_name(),
        }),
    })
}

/// Integers widen to doubles.
pub fn member_cast_double(member: &RawMember) -> Result<f64, Fault> {
    with_heap(&member.shared, |heap| match heap.get(member.id)? {
        Value::Float(v) => Ok(*v),
        Value::Int(v) => Ok(*v as f64),
        other => Err(Fault::TypeMismatch {
            expected: "float",
            found: other.type_name(),
        }),
    })
}

/// Copy a string value out of the runtime.
pub fn member_cast_cstring(member: &RawMember) -> Result<CString, Fault> {
    let text = with_heap(&member.shared, |heap| heap.str(member.id).map(str::to_string))?;
    CString::new(text).map_err(|_| Fault::InvalidString)
}

pub fn member_is_nil(member: &RawMember) -> Result<bool, Fault> {
    with_heap(&member.shared, |heap| {
        Ok(matches!(heap.get(member.id)?, Value::Nil))
    })
}

/// Name of the value's runtime type.
pub fn member_type_name(member: &RawMember) -> Result<&'static str, Fault> {
    with_heap(&member.shared, |heap| Ok(heap.get(member.id)?.type_name()))
}

// ============================================================================
// Arguments
// ============================================================================

pub fn parameters_count(params: &RawParameters) -> Result<usize, Fault> {
    with_heap(&params.shared, |heap| {
        Ok(heap.frame(params.frame)?.args.positional.len())
    })
}

pub fn parameters_at(params: &RawParameters, index: usize) -> Result<RawMember, Fault> {
    let id = with_heap(&params.shared, |heap| {
        let positional = &heap.frame(params.frame)?.args.positional;
        positional.get(index).copied().ok_or(Fault::OutOfRange {
            index,
            count: positional.len(),
        })
    })?;
    Ok(RawMember {
        id,
        shared: params.shared.clone(),
    })
}

pub fn parameters_kwargs_find(params: &RawParameters, name: &CStr) -> Result<RawMember, Fault> {
    let name = name.to_str().map_err(|_| Fault::InvalidString)?;
    let id = with_heap(&params.shared, |heap| {
        heap.frame(params.frame)?
            .args
            .keywords
            .iter()
            .find(|(keyword, _)| keyword == name)
            .map(|(_, id)| *id)
            .ok_or_else(|| Fault::NotFound(name.to_string()))
    })?;
    Ok(RawMember {
        id,
        shared: params.shared.clone(),
    })
}

#[cfg(test)]
#[path = "sys_test.rs"]
mod sys_test;
