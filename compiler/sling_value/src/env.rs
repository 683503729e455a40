//! Frame arena for variable scoping.
//!
//! Frames live in an [`EnvArena`] and are addressed by [`FrameId`]
//! (slot index plus generation). Closures and child frames hold an
//! [`EnvRef`], a counted handle carrying a weak pointer back to the arena.
//!
//! # Release protocol
//!
//! Cloning an `EnvRef` takes the arena lock and bumps the slot count.
//! Dropping one never locks: it pushes the id onto a lock-free release
//! queue. The arena drains the queue at safe points (frame allocation,
//! scope exit, [`EnvArena::collect`]) and frees frames whose count reaches
//! zero. Freed frames are dropped after the lock is released, since their
//! values may hold further handles. Frames that reference each other (a
//! closure stored in its own defining frame) stay alive until the arena
//! itself is dropped.
//!
//! Values are `Arc`-backed, so cloning a value under the lock never clones
//! an `EnvRef`. That keeps every lock acquisition non-reentrant.

use std::fmt;
use std::sync::{Arc, Weak};

use crossbeam::queue::SegQueue;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::EvalError;
use crate::value::{ClassValue, Value};

/// Slot index plus generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId {
    index: u32,
    generation: u32,
}

/// What kind of block a frame belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// Top level of a script or script library.
    Module,
    Function,
    /// Class body; functions defined here do not close over it.
    Class,
}

/// Class and receiver of the method a frame executes, for `super()`.
#[derive(Clone, Debug)]
pub struct MethodOwner {
    pub class: Arc<ClassValue>,
    pub receiver: Value,
}

/// A single scope.
#[derive(Debug)]
pub struct Frame {
    vars: FxHashMap<String, Value>,
    parent: Option<EnvRef>,
    kind: FrameKind,
    globals: FxHashSet<String>,
    nonlocals: FxHashSet<String>,
    owner: Option<MethodOwner>,
}

impl Frame {
    pub fn new(kind: FrameKind, parent: Option<EnvRef>) -> Self {
        Frame {
            vars: FxHashMap::default(),
            parent,
            kind,
            globals: FxHashSet::default(),
            nonlocals: FxHashSet::default(),
            owner: None,
        }
    }

    #[must_use]
    pub fn with_vars(mut self, vars: FxHashMap<String, Value>) -> Self {
        self.vars = vars;
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: Option<MethodOwner>) -> Self {
        self.owner = owner;
        self
    }
}

struct Slot {
    generation: u32,
    refs: usize,
    frame: Option<Frame>,
}

#[derive(Default)]
struct Slots {
    entries: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Slots {
    fn frame(&self, id: FrameId) -> Option<&Frame> {
        let slot = self.entries.get(id.index as usize)?;
        if slot.generation == id.generation {
            slot.frame.as_ref()
        } else {
            None
        }
    }

    fn frame_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        let slot = self.entries.get_mut(id.index as usize)?;
        if slot.generation == id.generation {
            slot.frame.as_mut()
        } else {
            None
        }
    }

    fn parent_id(&self, id: FrameId) -> Option<FrameId> {
        self.frame(id)?.parent.as_ref().map(|p| p.id)
    }

    fn insert(&mut self, frame: Frame) -> FrameId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.entries[index as usize];
            slot.refs = 1;
            slot.frame = Some(frame);
            return FrameId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        self.entries.push(Slot {
            generation: 0,
            refs: 1,
            frame: Some(frame),
        });
        FrameId {
            index,
            generation: 0,
        }
    }

    fn retain(&mut self, id: FrameId) {
        if let Some(slot) = self.entries.get_mut(id.index as usize) {
            if slot.generation == id.generation {
                slot.refs += 1;
            }
        }
    }

    /// Drop one count; returns the frame once it is unreferenced.
    fn release(&mut self, id: FrameId) -> Option<Frame> {
        let slot = self.entries.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.refs = slot.refs.saturating_sub(1);
        if slot.refs > 0 {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        slot.frame.take()
    }

    /// Outermost frame of the chain starting at `id`.
    fn root(&self, mut id: FrameId) -> FrameId {
        while let Some(parent) = self.parent_id(id) {
            id = parent;
        }
        id
    }
}

/// Arena of frames shared by one runtime.
pub struct EnvArena {
    slots: Mutex<Slots>,
    released: SegQueue<FrameId>,
    this: Weak<EnvArena>,
}

impl EnvArena {
    pub fn new() -> Arc<EnvArena> {
        Arc::new_cyclic(|this| EnvArena {
            slots: Mutex::new(Slots::default()),
            released: SegQueue::new(),
            this: this.clone(),
        })
    }

    fn handle(&self, id: FrameId) -> EnvRef {
        EnvRef {
            id,
            arena: self.this.clone(),
        }
    }

    /// Allocate a frame; the returned handle holds its only count.
    pub fn alloc(&self, frame: Frame) -> EnvRef {
        self.collect();
        let id = self.slots.lock().insert(frame);
        self.handle(id)
    }

    /// Allocate an empty frame.
    pub fn push(&self, kind: FrameKind, parent: Option<&EnvRef>) -> EnvRef {
        self.alloc(Frame::new(kind, parent.cloned()))
    }

    /// Free frames whose handles were all dropped.
    pub fn collect(&self) {
        loop {
            let mut freed = Vec::new();
            {
                let mut slots = self.slots.lock();
                while let Some(id) = self.released.pop() {
                    if let Some(frame) = slots.release(id) {
                        freed.push(frame);
                    }
                }
            }
            if freed.is_empty() {
                return;
            }
            tracing::trace!(count = freed.len(), "freeing frames");
            // Dropping frames may release more handles.
            drop(freed);
        }
    }

    /// Number of frames currently allocated.
    pub fn live_frames(&self) -> usize {
        self.slots.lock().live
    }

    /// Resolve a name along the frame chain.
    pub fn get(&self, env: &EnvRef, name: &str) -> Option<Value> {
        let slots = self.slots.lock();
        let mut id = env.id;
        loop {
            let frame = slots.frame(id)?;
            if frame.globals.contains(name) {
                let root = slots.root(id);
                return slots.frame(root)?.vars.get(name).cloned();
            }
            if let Some(value) = frame.vars.get(name) {
                return Some(value.clone());
            }
            id = frame.parent.as_ref()?.id;
        }
    }

    /// Assign a name, honoring `global` and `nonlocal` declarations.
    pub fn set(&self, env: &EnvRef, name: &str, value: Value) {
        let old = {
            let mut slots = self.slots.lock();
            let target = Self::assign_target(&slots, env.id, name);
            match slots.frame_mut(target) {
                Some(frame) => frame.vars.insert(name.to_string(), value),
                None => Some(value),
            }
        };
        drop(old);
    }

    fn assign_target(slots: &Slots, id: FrameId, name: &str) -> FrameId {
        let Some(frame) = slots.frame(id) else {
            return id;
        };
        if frame.globals.contains(name) {
            return slots.root(id);
        }
        if frame.nonlocals.contains(name) {
            let mut cursor = slots.parent_id(id);
            while let Some(candidate) = cursor {
                if slots
                    .frame(candidate)
                    .is_some_and(|f| f.kind != FrameKind::Class && f.vars.contains_key(name))
                {
                    return candidate;
                }
                cursor = slots.parent_id(candidate);
            }
        }
        id
    }

    /// Bind directly in this frame, ignoring declarations.
    pub fn define(&self, env: &EnvRef, name: impl Into<String>, value: Value) {
        let old = self
            .slots
            .lock()
            .frame_mut(env.id)
            .and_then(|frame| frame.vars.insert(name.into(), value));
        drop(old);
    }

    /// Remove a binding; returns whether it existed.
    pub fn delete(&self, env: &EnvRef, name: &str) -> bool {
        let removed = {
            let mut slots = self.slots.lock();
            let target = Self::assign_target(&slots, env.id, name);
            slots
                .frame_mut(target)
                .and_then(|frame| frame.vars.remove(name))
        };
        removed.is_some()
    }

    pub fn declare_global(&self, env: &EnvRef, name: &str) {
        if let Some(frame) = self.slots.lock().frame_mut(env.id) {
            frame.globals.insert(name.to_string());
        }
    }

    /// Declare `name` nonlocal; an enclosing function frame must bind it.
    pub fn declare_nonlocal(&self, env: &EnvRef, name: &str) -> Result<(), EvalError> {
        let mut slots = self.slots.lock();
        let mut cursor = slots.parent_id(env.id);
        let mut found = false;
        while let Some(candidate) = cursor {
            if let Some(frame) = slots.frame(candidate) {
                if frame.kind == FrameKind::Function && frame.vars.contains_key(name) {
                    found = true;
                    break;
                }
            }
            cursor = slots.parent_id(candidate);
        }
        if !found {
            return Err(EvalError::exception(
                "SyntaxError",
                format!("no binding for nonlocal '{name}' found"),
            ));
        }
        if let Some(frame) = slots.frame_mut(env.id) {
            frame.nonlocals.insert(name.to_string());
        }
        Ok(())
    }

    pub fn contains_local(&self, env: &EnvRef, name: &str) -> bool {
        self.slots
            .lock()
            .frame(env.id)
            .is_some_and(|frame| frame.vars.contains_key(name))
    }

    /// Bindings of this frame only, sorted by name.
    pub fn locals(&self, env: &EnvRef) -> Vec<(String, Value)> {
        let mut vars: Vec<(String, Value)> = self
            .slots
            .lock()
            .frame(env.id)
            .map(|frame| {
                frame
                    .vars
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        vars.sort_by(|a, b| a.0.cmp(&b.0));
        vars
    }

    /// Nearest frame that a function defined in `env` should close over.
    pub fn closure_scope(&self, env: &EnvRef) -> EnvRef {
        let mut slots = self.slots.lock();
        let mut id = env.id;
        while let Some(frame) = slots.frame(id) {
            match (&frame.kind, &frame.parent) {
                (FrameKind::Class, Some(parent)) => id = parent.id,
                _ => break,
            }
        }
        slots.retain(id);
        drop(slots);
        self.handle(id)
    }

    /// Method context of the innermost enclosing method call.
    pub fn method_owner(&self, env: &EnvRef) -> Option<MethodOwner> {
        let slots = self.slots.lock();
        let mut id = env.id;
        loop {
            let frame = slots.frame(id)?;
            if let Some(owner) = &frame.owner {
                return Some(owner.clone());
            }
            id = frame.parent.as_ref()?.id;
        }
    }

    fn retain(&self, id: FrameId) {
        self.slots.lock().retain(id);
    }
}

impl fmt::Debug for EnvArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvArena")
            .field("live", &self.live_frames())
            .finish_non_exhaustive()
    }
}

/// Counted handle to a frame.
pub struct EnvRef {
    id: FrameId,
    arena: Weak<EnvArena>,
}

impl EnvRef {
    #[inline]
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// The owning arena, if it is still alive.
    pub fn arena(&self) -> Option<Arc<EnvArena>> {
        self.arena.upgrade()
    }
}

impl Clone for EnvRef {
    fn clone(&self) -> Self {
        if let Some(arena) = self.arena.upgrade() {
            arena.retain(self.id);
        }
        EnvRef {
            id: self.id,
            arena: self.arena.clone(),
        }
    }
}

impl Drop for EnvRef {
    fn drop(&mut self) {
        if let Some(arena) = self.arena.upgrade() {
            arena.released.push(self.id);
        }
    }
}

impl PartialEq for EnvRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.arena, &other.arena)
    }
}

impl fmt::Debug for EnvRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnvRef({}:{})", self.id.index, self.id.generation)
    }
}
