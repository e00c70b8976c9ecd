//! Statement interpreter.

use std::sync::{Arc, Weak};

use crate::error::ScriptError;
use crate::heap::Shared;
use crate::parser::{Arg, Expr, ExprKind, Pos, Stmt};
use crate::sys::{RawParameters, Token, Trampoline};
use crate::value::{BuiltinFn, CallArgs, Value, ValueId};

enum Callee {
    Builtin(&'static str, BuiltinFn),
    Host(String, Trampoline, Token),
}

/// Drops pins above `depth` when it goes out of scope.
struct PinScope<'s> {
    shared: &'s Shared,
    depth: usize,
}

impl Drop for PinScope<'_> {
    fn drop(&mut self) {
        self.shared.lock().unpin_to(self.depth);
    }
}

/// Pops a host call frame when it goes out of scope.
struct FrameScope<'s> {
    shared: &'s Shared,
    frame: u64,
}

impl Drop for FrameScope<'_> {
    fn drop(&mut self) {
        self.shared.lock().pop_frame(self.frame);
    }
}

pub(crate) struct Interpreter<'s> {
    shared: &'s Arc<Shared>,
}

impl<'s> Interpreter<'s> {
    pub fn new(shared: &'s Arc<Shared>) -> Self {
        Self { shared }
    }

    pub fn execute(&self, program: &[Stmt<'_>]) -> Result<(), ScriptError> {
        for statement in program {
            self.statement(statement)?;
            self.shared.lock().maybe_collect();
        }
        Ok(())
    }

    fn statement(&self, statement: &Stmt<'_>) -> Result<(), ScriptError> {
        match statement {
            Stmt::Import { name, pos } => {
                let mut heap = self.shared.lock();
                match heap.module(name) {
                    Some(module) => {
                        heap.set_global(name, module);
                        Ok(())
                    }
                    None if !heap.has_modules() => Err(pos.error(format!(
                        "no module named `{}` (standard library not loaded)",
                        name
                    ))),
                    None => Err(pos.error(format!("no module named `{}`", name))),
                }
            }
            Stmt::Let { name, value } => {
                let id = self.eval(value)?;
                self.shared.lock().set_global(name, id);
                Ok(())
            }
            Stmt::Expr(expr) => self.eval(expr).map(|_| ()),
        }
    }

    fn alloc(&self, value: Value, pos: Pos) -> Result<ValueId, ScriptError> {
        self.shared
            .lock()
            .alloc(value, true)
            .map_err(|fault| pos.error(fault.to_string()))
    }

    fn eval(&self, expr: &Expr<'_>) -> Result<ValueId, ScriptError> {
        let pos = expr.pos;
        match &expr.kind {
            ExprKind::Nil => Ok(self.shared.lock().nil()),
            ExprKind::Int(v) => self.alloc(Value::Int(*v), pos),
            ExprKind::Float(v) => self.alloc(Value::Float(*v), pos),
            ExprKind::Str(s) => self.alloc(Value::Str(s.to_string()), pos),
            ExprKind::Ident(name) => self
                .shared
                .lock()
                .global(name)
                .ok_or_else(|| pos.error(format!("`{}` is not defined", name))),
            ExprKind::Field { target, name } => {
                let target = self.eval(target)?;
                let heap = self.shared.lock();
                let found = match heap.get(target) {
                    Ok(Value::Module(module)) => module
                        .members
                        .iter()
                        .find(|(member, _)| member == name)
                        .map(|(_, id)| *id),
                    Ok(Value::Dict(_)) => heap.dict_get(target, name).ok().flatten(),
                    Ok(other) => {
                        return Err(pos.error(format!(
                            "cannot access `{}` on a value of type {}",
                            name,
                            other.type_name()
                        )));
                    }
                    Err(fault) => return Err(pos.error(fault.to_string())),
                };
                found.ok_or_else(|| pos.error(format!("no member named `{}`", name)))
            }
            ExprKind::Dict(entries) => self.with_pins(|| {
                let mut evaluated = Vec::with_capacity(entries.len());
                for (key, value) in entries.iter() {
                    let value = self.eval(value)?;
                    self.shared.lock().pin(value);
                    evaluated.push((*key, value));
                }

                let mut heap = self.shared.lock();
                let dict = heap
                    .alloc(Value::Dict(Vec::new()), false)
                    .map_err(|fault| pos.error(fault.to_string()))?;
                let result = evaluated.into_iter().try_for_each(|(key, value)| {
                    let key = heap.alloc(Value::Str(key.to_string()), true)?;
                    heap.dict_put(dict, key, value)
                });
                match result.and_then(|()| heap.promote(dict)) {
                    Ok(()) => Ok(dict),
                    Err(fault) => {
                        let _ = heap.free(dict);
                        Err(pos.error(fault.to_string()))
                    }
                }
            }),
            ExprKind::Call { callee, args } => self.with_pins(|| self.call(callee, args, pos)),
        }
    }

    /// Run `f`, releasing every pin it created afterwards, even if it unwinds.
    fn with_pins<T>(&self, f: impl FnOnce() -> T) -> T {
        let _pins = PinScope {
            shared: self.shared.as_ref(),
            depth: self.shared.lock().pin_depth(),
        };
        f()
    }

    fn call(&self, callee: &Expr<'_>, args: &[Arg<'_>], pos: Pos) -> Result<ValueId, ScriptError> {
        let callee_id = self.eval(callee)?;
        self.shared.lock().pin(callee_id);

        let mut call_args = CallArgs::default();
        for arg in args {
            let (keyword, expr) = match arg {
                Arg::Positional(expr) => (None, expr),
                Arg::Keyword(name, expr) => (Some(*name), expr),
            };
            let id = self.eval(expr)?;
            self.shared.lock().pin(id);
            match keyword {
                Some(name) => call_args.keywords.push((name.to_string(), id)),
                None => call_args.positional.push(id),
            }
        }

        let target = {
            let heap = self.shared.lock();
            match heap.get(callee_id) {
                Ok(Value::Builtin(builtin)) => Callee::Builtin(builtin.name, builtin.func),
                Ok(Value::Host(host)) => {
                    Callee::Host(host.name.clone(), host.trampoline, host.token.clone())
                }
                Ok(other) => {
                    return Err(pos.error(format!(
                        "value of type {} is not callable",
                        other.type_name()
                    )));
                }
                Err(fault) => return Err(pos.error(fault.to_string())),
            }
        };

        let result = match target {
            Callee::Builtin(name, func) => func(self.shared, &call_args)
                .map_err(|fault| pos.error(format!("{}: {}", name, fault)))?,
            Callee::Host(name, trampoline, token) => {
                self.call_host(&name, trampoline, &token, call_args, pos)?
            }
        };
        Ok(result.unwrap_or_else(|| self.shared.lock().nil()))
    }

    fn call_host(
        &self,
        name: &str,
        trampoline: Trampoline,
        token: &Token,
        args: CallArgs,
        pos: Pos,
    ) -> Result<Option<ValueId>, ScriptError> {
        let frame = FrameScope {
            shared: self.shared.as_ref(),
            frame: self.shared.lock().push_frame(args),
        };
        tracing::trace!(function = name, frame = frame.frame, "Calling host function");

        // The heap must stay unlocked while the host runs: it allocates through
        // the same collector.
        let params = RawParameters {
            frame: frame.frame,
            shared: Arc::downgrade(self.shared),
        };
        let outcome = trampoline(params, token);
        drop(frame);

        let heap = self.shared.lock();
        match outcome {
            Ok(None) => Ok(None),
            Ok(Some(member)) => {
                if !Weak::ptr_eq(&member.shared, &Arc::downgrade(self.shared)) {
                    return Err(pos.error(format!(
                        "{}: returned a value from another engine",
                        name
                    )));
                }
                match heap.is_managed(member.id) {
                    Ok(true) => Ok(Some(member.id)),
                    Ok(false) => Err(pos.error(format!(
                        "{}: returned a value that is not managed",
                        name
                    ))),
                    Err(fault) => Err(pos.error(format!("{}: {}", name, fault))),
                }
            }
            Err(fault) => Err(pos.error(format!("{}: {}", name, fault))),
        }
    }
}
