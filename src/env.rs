// ABOUTME: Frame-arena environment for lexical scoping and closures

use crate::value::Value;
use std::collections::HashMap;

/// Handle into the frame arena. Never invalidated: frames are appended only,
/// never evicted, so a `FrameId` captured by a closure stays valid for the
/// life of the `Environment`.
pub type FrameId = usize;

#[derive(Debug)]
struct Frame {
    bindings: HashMap<String, Value>,
    parent: Option<FrameId>,
}

/// The evaluator's variable store: one global scope plus an arena of call
/// frames addressed by integer id. A function's captured "defining scope" is
/// just a `FrameId`, so closures need no `Rc<RefCell<_>>` parent-chain and no
/// frame ever needs to be freed early.
#[derive(Debug, Default)]
pub struct Environment {
    global: HashMap<String, Value>,
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            global: HashMap::new(),
            frames: Vec::new(),
        }
    }

    /// Allocates a fresh frame with the given parent and returns its id.
    pub fn push_frame(&mut self, parent: Option<FrameId>) -> FrameId {
        self.frames.push(Frame {
            bindings: HashMap::new(),
            parent,
        });
        self.frames.len() - 1
    }

    /// Looks up `name` starting at `frame` (or the global scope if `None`),
    /// walking parent pointers, falling through to global at the end of the
    /// chain.
    pub fn get(&self, frame: Option<FrameId>, name: &str) -> Option<Value> {
        let mut current = frame;
        while let Some(id) = current {
            let f = &self.frames[id];
            if let Some(v) = f.bindings.get(name) {
                return Some(v.clone());
            }
            current = f.parent;
        }
        self.global.get(name).cloned()
    }

    /// Binds `name` in the current frame, or in the global scope if there is
    /// no current frame.
    pub fn define(&mut self, frame: Option<FrameId>, name: String, value: Value) {
        match frame {
            Some(id) => {
                self.frames[id].bindings.insert(name, value);
            }
            None => {
                self.global.insert(name, value);
            }
        }
    }

    /// Mutates an existing binding found by walking from `frame`, or the
    /// global scope; if not found anywhere, defines it in the current scope
    /// (Tiny assignment always succeeds, per spec: there is no "undeclared
    /// variable" write error).
    pub fn assign(&mut self, frame: Option<FrameId>, name: &str, value: Value) {
        let mut current = frame;
        while let Some(id) = current {
            if self.frames[id].bindings.contains_key(name) {
                self.frames[id].bindings.insert(name.to_string(), value);
                return;
            }
            current = self.frames[id].parent;
        }
        if self.global.contains_key(name) {
            self.global.insert(name.to_string(), value);
            return;
        }
        self.define(frame, name.to_string(), value);
    }

    pub fn global_get(&self, name: &str) -> Option<&Value> {
        self.global.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get_global() {
        let mut env = Environment::new();
        env.define(None, "x".to_string(), Value::Int(42));
        assert!(matches!(env.get(None, "x"), Some(Value::Int(42))));
    }

    #[test]
    fn undefined_symbol_is_none() {
        let env = Environment::new();
        assert!(env.get(None, "undefined").is_none());
    }

    #[test]
    fn child_frame_shadows_parent() {
        let mut env = Environment::new();
        env.define(None, "x".to_string(), Value::Int(42));
        let frame = env.push_frame(None);
        env.define(Some(frame), "x".to_string(), Value::Int(100));
        assert!(matches!(env.get(Some(frame), "x"), Some(Value::Int(100))));
    }

    #[test]
    fn child_frame_falls_through_to_global() {
        let mut env = Environment::new();
        env.define(None, "x".to_string(), Value::Int(42));
        let frame = env.push_frame(None);
        assert!(matches!(env.get(Some(frame), "x"), Some(Value::Int(42))));
    }

    #[test]
    fn multi_level_frame_chain() {
        let mut env = Environment::new();
        env.define(None, "a".to_string(), Value::Int(1));
        let parent = env.push_frame(None);
        env.define(Some(parent), "b".to_string(), Value::Int(2));
        let child = env.push_frame(Some(parent));
        env.define(Some(child), "c".to_string(), Value::Int(3));

        assert!(matches!(env.get(Some(child), "a"), Some(Value::Int(1))));
        assert!(matches!(env.get(Some(child), "b"), Some(Value::Int(2))));
        assert!(matches!(env.get(Some(child), "c"), Some(Value::Int(3))));
    }

    #[test]
    fn frame_ids_remain_valid_after_more_frames_are_pushed() {
        let mut env = Environment::new();
        let first = env.push_frame(None);
        env.define(Some(first), "x".to_string(), Value::Int(1));
        let _second = env.push_frame(None);
        let _third = env.push_frame(Some(first));
        assert!(matches!(env.get(Some(first), "x"), Some(Value::Int(1))));
    }
}
