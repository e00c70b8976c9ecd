//! Builtins and the Bia standard library (BSL).
//!
//! `print` is always available. The `io` and `sys` modules only exist after
//! the host loads the standard library; `sys` exposes the options the host
//! passed at load time as the script's argument vector.

use crate::error::Fault;
use crate::heap::{Heap, Shared};
use crate::value::{Builtin, CallArgs, Module, Value, ValueId};

const PRINT: Builtin = Builtin {
    name: "print",
    func: print,
};

/// Install the builtins every engine starts with.
pub(crate) fn install_builtins(heap: &mut Heap) -> Result<(), Fault> {
    heap.install_builtin(PRINT)
}

/// Load the standard library modules.
pub(crate) fn load(heap: &mut Heap, argv: Vec<String>) -> Result<(), Fault> {
    if heap.has_modules() {
        return Err(Fault::LibraryLoaded);
    }

    let io_print = heap.alloc(Value::Builtin(PRINT), true)?;
    let io = heap.alloc(
        Value::Module(Module {
            name: "io",
            members: vec![("print", io_print)],
        }),
        true,
    )?;

    let argc = heap.alloc(Value::Int(argv.len() as i64), true)?;
    let arg = heap.alloc(
        Value::Builtin(Builtin {
            name: "arg",
            func: sys_arg,
        }),
        true,
    )?;
    let sys = heap.alloc(
        Value::Module(Module {
            name: "sys",
            members: vec![("argc", argc), ("arg", arg)],
        }),
        true,
    )?;

    heap.install_module("io", io);
    heap.install_module("sys", sys);
    heap.argv = argv;
    tracing::debug!(argc = heap.argv.len(), "Standard library loaded");
    Ok(())
}

/// `print(values...)`: space-separated text of every positional argument.
fn print(shared: &Shared, args: &CallArgs) -> Result<Option<ValueId>, Fault> {
    let line = {
        let heap = shared.lock();
        let mut parts = Vec::with_capacity(args.positional.len());
        for id in &args.positional {
            parts.push(heap.render(*id)?);
        }
        parts.join(" ")
    };
    shared.output.write_line(&line);
    Ok(None)
}

/// `sys.arg(i)`: the i-th library option, or `nil` when out of range.
fn sys_arg(shared: &Shared, args: &CallArgs) -> Result<Option<ValueId>, Fault> {
    let mut heap = shared.lock();
    let index = match args.positional.as_slice() {
        [id] => match heap.get(*id)? {
            Value::Int(i) => *i,
            other => {
                return Err(Fault::TypeMismatch {
                    expected: "int",
                    found: other.type_name(),
                });
            }
        },
        _ => {
            return Err(Fault::Arity {
                expected: 1,
                found: args.positional.len(),
            });
        }
    };

    let arg = usize::try_from(index)
        .ok()
        .and_then(|i| heap.argv.get(i))
        .cloned();
    match arg {
        Some(arg) => heap.alloc(Value::Str(arg), true).map(Some),
        None => Ok(None),
    }
}
