//! The local environment: a stack of scoped frames.
//!
//! Frames are pushed by `let` bindings, `case` branches, and method calls
//! (formals). Lookup searches innermost-outward; the attribute slots of the
//! current `self` are the evaluator's fallback, not part of this stack.
//! Each method call gets a fresh environment, so caller frames are never
//! visible to the callee.

use std::rc::Rc;

use ahash::AHashMap;

use crate::value::Value;

#[derive(Debug, Default)]
pub(crate) struct LocalEnv {
    frames: Vec<AHashMap<Rc<str>, Value>>,
}

impl LocalEnv {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_frame(frame: AHashMap<Rc<str>, Value>) -> Self {
        Self { frames: vec![frame] }
    }

    /// Pushes a one-binding frame, as `let` and `case` do.
    pub(crate) fn push_binding(&mut self, name: Rc<str>, value: Value) {
        let mut frame = AHashMap::new();
        frame.insert(name, value);
        self.frames.push(frame);
    }

    pub(crate) fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name)).cloned()
    }

    /// Writes the innermost binding of `name`; false when no frame binds it.
    pub(crate) fn assign(&mut self, name: &str, value: Value) -> bool {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        false
    }
}
