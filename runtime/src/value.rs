//! Runtime value representation.

use core::fmt;

use smallvec::SmallVec;

use crate::error::Fault;
use crate::heap::Shared;
use crate::sys::{Token, Trampoline};

/// Generational reference to a heap slot.
///
/// A freed slot bumps its generation, so ids handed out before the free can
/// never alias a later allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ValueId {
    pub index: u32,
    pub generation: u32,
}

/// Signature of functions implemented inside the runtime.
pub(crate) type BuiltinFn = fn(&Shared, &CallArgs) -> Result<Option<ValueId>, Fault>;

/// Arguments of a single call, as seen by builtins and host frames.
#[derive(Debug, Default)]
pub(crate) struct CallArgs {
    pub positional: SmallVec<[ValueId; 4]>,
    pub keywords: SmallVec<[(String, ValueId); 2]>,
}

impl CallArgs {
    pub fn ids(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.positional
            .iter()
            .copied()
            .chain(self.keywords.iter().map(|(_, id)| *id))
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

/// A function implemented by the host, reached through its trampoline.
pub(crate) struct HostFunction {
    pub name: String,
    pub trampoline: Trampoline,
    pub token: Token,
}

pub(crate) struct Module {
    pub name: &'static str,
    pub members: Vec<(&'static str, ValueId)>,
}

pub(crate) enum Value {
    Nil,
    Int(i64),
    Float(f64),
    Str(String),
    /// Insertion-ordered entries; keys are always `Str` values.
    Dict(Vec<(ValueId, ValueId)>),
    Builtin(Builtin),
    Host(HostFunction),
    Module(Module),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Dict(_) => "dict",
            Value::Builtin(_) | Value::Host(_) => "function",
            Value::Module(_) => "module",
        }
    }

    /// Values directly reachable from this one.
    pub fn children(&self) -> impl Iterator<Item = ValueId> + '_ {
        let (entries, members): (&[(ValueId, ValueId)], &[(&'static str, ValueId)]) = match self {
            Value::Dict(entries) => (entries.as_slice(), &[]),
            Value::Module(module) => (&[], module.members.as_slice()),
            _ => (&[], &[]),
        };
        entries
            .iter()
            .flat_map(|(k, v)| [*k, *v])
            .chain(members.iter().map(|(_, id)| *id))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Float(v) => write!(f, "Float({})", v),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Dict(entries) => write!(f, "Dict({} entries)", entries.len()),
            Value::Builtin(b) => write!(f, "Builtin({})", b.name),
            Value::Host(h) => write!(f, "Host({})", h.name),
            Value::Module(m) => write!(f, "Module({})", m.name),
        }
    }
}

/// Check that `name` can be bound in the global namespace.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !matches!(name, "import" | "let" | "nil")
}
