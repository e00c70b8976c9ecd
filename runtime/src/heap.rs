//! Generational value heap and mark-and-sweep collector.

use std::sync::{Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;

use crate::error::Fault;
use crate::options::{Output, RuntimeOptions};
use crate::value::{Builtin, CallArgs, Value, ValueId};

const MAX_RENDER_DEPTH: usize = 32;

/// State shared by an engine, its collector handles and its value references.
pub(crate) struct Shared {
    heap: Mutex<Heap>,
    pub output: Output,
}

impl Shared {
    pub fn new(options: &RuntimeOptions) -> Result<Self, Fault> {
        Ok(Self {
            heap: Mutex::new(Heap::new(options)?),
            output: options.output.clone(),
        })
    }

    /// Lock the heap. Never hold the guard while calling into the host.
    pub fn lock(&self) -> MutexGuard<'_, Heap> {
        // Heap operations leave the heap consistent before any point that can panic.
        self.heap.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Collector statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Values alive after the operation.
    pub live: usize,
    /// Live values owned by the collector.
    pub managed: usize,
    /// Live values owned by the host.
    pub unmanaged: usize,
    /// Values reclaimed by the operation (zero for a plain query).
    pub collected: usize,
}

struct Entry {
    value: Value,
    managed: bool,
    marked: bool,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// A live host call: the arguments stay rooted until the frame is popped.
pub(crate) struct Frame {
    pub args: CallArgs,
}

pub(crate) struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    max_values: Option<usize>,
    gc_threshold: usize,
    since_collect: usize,
    nil: ValueId,
    globals: HashMap<String, ValueId>,
    builtins: HashMap<&'static str, ValueId>,
    modules: HashMap<&'static str, ValueId>,
    frames: HashMap<u64, Frame>,
    next_frame: u64,
    pins: Vec<ValueId>,
    pub argv: Vec<String>,
}

impl Heap {
    fn new(options: &RuntimeOptions) -> Result<Self, Fault> {
        let mut heap = Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            max_values: options.max_values,
            gc_threshold: options.gc_threshold.max(1),
            since_collect: 0,
            nil: ValueId {
                index: 0,
                generation: 0,
            },
            globals: HashMap::new(),
            builtins: HashMap::new(),
            modules: HashMap::new(),
            frames: HashMap::new(),
            next_frame: 1,
            pins: Vec::new(),
            argv: Vec::new(),
        };
        heap.nil = heap.alloc(Value::Nil, true)?;
        Ok(heap)
    }

    pub fn alloc(&mut self, value: Value, managed: bool) -> Result<ValueId, Fault> {
        if let Some(limit) = self.max_values {
            if self.live >= limit {
                return Err(Fault::OutOfMemory { limit });
            }
        }
        let entry = Some(Entry {
            value,
            managed,
            marked: false,
        });
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = entry;
                ValueId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry,
                });
                ValueId {
                    index,
                    generation: 0,
                }
            }
        };
        self.live += 1;
        self.since_collect += 1;
        Ok(id)
    }

    fn entry(&self, id: ValueId) -> Result<&Entry, Fault> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(Fault::StaleValue)
    }

    fn entry_mut(&mut self, id: ValueId) -> Result<&mut Entry, Fault> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(Fault::StaleValue)
    }

    pub fn get(&self, id: ValueId) -> Result<&Value, Fault> {
        self.entry(id).map(|entry| &entry.value)
    }

    pub fn is_managed(&self, id: ValueId) -> Result<bool, Fault> {
        self.entry(id).map(|entry| entry.managed)
    }

    pub fn nil(&self) -> ValueId {
        self.nil
    }

    fn release_slot(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.live -= 1;
    }

    /// Free an unmanaged value. Only the value itself is freed; managed
    /// children are left to the collector.
    pub fn free(&mut self, id: ValueId) -> Result<(), Fault> {
        if self.entry(id)?.managed {
            return Err(Fault::NotOwned);
        }
        self.release_slot(id.index);
        Ok(())
    }

    /// Hand an unmanaged value over to the collector.
    pub fn promote(&mut self, id: ValueId) -> Result<(), Fault> {
        let entry = self.entry_mut(id)?;
        if entry.managed {
            return Err(Fault::AlreadyManaged);
        }
        entry.managed = true;
        Ok(())
    }

    pub fn str(&self, id: ValueId) -> Result<&str, Fault> {
        match self.get(id)? {
            Value::Str(s) => Ok(s),
            other => Err(Fault::TypeMismatch {
                expected: "string",
                found: other.type_name(),
            }),
        }
    }

    /// Insert or replace `key` in an unmanaged dictionary.
    pub fn dict_put(&mut self, dict: ValueId, key: ValueId, value: ValueId) -> Result<(), Fault> {
        let key_text = self.str(key)?.to_string();
        self.entry(value)?;

        let position = match self.get(dict)? {
            Value::Dict(entries) => entries
                .iter()
                .position(|(k, _)| matches!(self.get(*k), Ok(Value::Str(s)) if *s == key_text)),
            other => {
                return Err(Fault::TypeMismatch {
                    expected: "dict",
                    found: other.type_name(),
                });
            }
        };

        let entry = self.entry_mut(dict)?;
        if entry.managed {
            return Err(Fault::AlreadyManaged);
        }
        if let Value::Dict(entries) = &mut entry.value {
            match position {
                Some(i) => entries[i] = (key, value),
                None => entries.push((key, value)),
            }
        }
        Ok(())
    }

    /// Look up `key` in a dictionary value.
    pub fn dict_get(&self, dict: ValueId, key: &str) -> Result<Option<ValueId>, Fault> {
        match self.get(dict)? {
            Value::Dict(entries) => Ok(entries
                .iter()
                .find(|(k, _)| matches!(self.get(*k), Ok(Value::Str(s)) if s == key))
                .map(|(_, v)| *v)),
            other => Err(Fault::TypeMismatch {
                expected: "dict",
                found: other.type_name(),
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Namespaces
    // ------------------------------------------------------------------------

    pub fn global(&self, name: &str) -> Option<ValueId> {
        self.globals
            .get(name)
            .or_else(|| self.builtins.get(name))
            .copied()
    }

    /// Whether `name` is taken by a global or a builtin.
    pub fn has_global(&self, name: &str) -> bool {
        self.globals.contains_key(name) || self.builtins.contains_key(name)
    }

    /// Bind or rebind a global.
    pub fn set_global(&mut self, name: &str, id: ValueId) {
        self.globals.insert(name.to_string(), id);
    }

    pub fn install_builtin(&mut self, builtin: Builtin) -> Result<(), Fault> {
        let id = self.alloc(Value::Builtin(builtin), true)?;
        self.builtins.insert(builtin.name, id);
        Ok(())
    }

    pub fn install_module(&mut self, name: &'static str, id: ValueId) {
        self.modules.insert(name, id);
    }

    pub fn module(&self, name: &str) -> Option<ValueId> {
        self.modules.get(name).copied()
    }

    pub fn has_modules(&self) -> bool {
        !self.modules.is_empty()
    }

    // ------------------------------------------------------------------------
    // Frames and pins
    // ------------------------------------------------------------------------

    pub fn push_frame(&mut self, args: CallArgs) -> u64 {
        let id = self.next_frame;
        self.next_frame += 1;
        self.frames.insert(id, Frame { args });
        id
    }

    pub fn frame(&self, id: u64) -> Result<&Frame, Fault> {
        self.frames.get(&id).ok_or(Fault::StaleFrame)
    }

    pub fn pop_frame(&mut self, id: u64) {
        self.frames.remove(&id);
    }

    /// Keep `id` alive until the pin stack is truncated below it.
    pub fn pin(&mut self, id: ValueId) {
        self.pins.push(id);
    }

    pub fn pin_depth(&self) -> usize {
        self.pins.len()
    }

    pub fn unpin_to(&mut self, depth: usize) {
        self.pins.truncate(depth);
    }

    // ------------------------------------------------------------------------
    // Collection
    // ------------------------------------------------------------------------

    pub fn stats(&self) -> GcStats {
        let managed = self
            .slots
            .iter()
            .filter_map(|slot| slot.entry.as_ref())
            .filter(|entry| entry.managed)
            .count();
        GcStats {
            live: self.live,
            managed,
            unmanaged: self.live - managed,
            collected: 0,
        }
    }

    pub fn maybe_collect(&mut self) {
        if self.since_collect >= self.gc_threshold {
            self.collect();
        }
    }

    pub fn collect(&mut self) -> GcStats {
        let mut stack: Vec<ValueId> = Vec::new();
        stack.push(self.nil);
        stack.extend(self.globals.values().copied());
        stack.extend(self.builtins.values().copied());
        stack.extend(self.modules.values().copied());
        stack.extend(self.frames.values().flat_map(|frame| frame.args.ids()));
        stack.extend(self.pins.iter().copied());
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(entry) = &slot.entry {
                if !entry.managed {
                    stack.push(ValueId {
                        index: index as u32,
                        generation: slot.generation,
                    });
                }
            }
        }

        while let Some(id) = stack.pop() {
            let Ok(entry) = self.entry_mut(id) else {
                continue;
            };
            if entry.marked {
                continue;
            }
            entry.marked = true;
            stack.extend(entry.value.children());
        }

        let mut collected = 0;
        for index in 0..self.slots.len() {
            let reclaim = match &mut self.slots[index].entry {
                Some(entry) if entry.marked => {
                    entry.marked = false;
                    false
                }
                Some(_) => true,
                None => false,
            };
            if reclaim {
                self.release_slot(index as u32);
                collected += 1;
            }
        }

        self.since_collect = 0;
        tracing::debug!(collected, live = self.live, "Collection finished");
        GcStats {
            collected,
            ..self.stats()
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Text form used by the printing builtins.
    pub fn render(&self, id: ValueId) -> Result<String, Fault> {
        let mut out = String::new();
        self.render_into(id, &mut out, 0)?;
        Ok(out)
    }

    fn render_into(&self, id: ValueId, out: &mut String, depth: usize) -> Result<(), Fault> {
        use core::fmt::Write;

        match self.get(id)? {
            Value::Nil => out.push_str("nil"),
            Value::Int(v) => {
                let _ = write!(out, "{}", v);
            }
            Value::Float(v) => {
                let _ = write!(out, "{:?}", v);
            }
            Value::Str(s) => out.push_str(s),
            Value::Dict(_) if depth >= MAX_RENDER_DEPTH => out.push_str("{...}"),
            Value::Dict(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{:?}: ", self.str(*key)?);
                    match self.get(*value)? {
                        Value::Str(s) => {
                            let _ = write!(out, "{:?}", s);
                        }
                        _ => self.render_into(*value, out, depth + 1)?,
                    }
                }
                out.push('}');
            }
            Value::Builtin(builtin) => {
                let _ = write!(out, "<function {}>", builtin.name);
            }
            Value::Host(host) => {
                let _ = write!(out, "<function {}>", host.name);
            }
            Value::Module(module) => {
                let _ = write!(out, "<module {}>", module.name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "heap_test.rs"]
mod heap_test;
