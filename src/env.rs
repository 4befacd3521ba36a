//! The lexical environment chain.
//!
//! An environment is a chain of frames, each mapping symbol text to values
//! and holding a link to a parent frame. Frames live in their own
//! index-keyed arena (mirroring [`crate::value::Arena`]) so that a
//! [`EnvRef`] is a small `Copy` handle rather than an `Rc<RefCell<_>>` —
//! lambdas capture a frame by handle, and later `define`s into that same
//! frame are visible to the lambda's body without any interior-mutability
//! ceremony at the call site.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::value::{SymbolId, ValueRef};

/// A handle to an environment frame owned by an [`Envs`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvRef(u32);

struct Frame {
    bindings: HashMap<SymbolId, Option<ValueRef>>,
    parent: Option<EnvRef>,
}

/// The arena of environment frames for one interpreter.
pub struct Envs {
    frames: Vec<Frame>,
}

impl Envs {
    pub fn new() -> Envs {
        Envs { frames: Vec::new() }
    }

    /// Creates the root frame (no parent). Call once per interpreter.
    pub fn root(&mut self) -> EnvRef {
        self.push_frame(None)
    }

    /// Creates a new frame whose parent is `parent`.
    pub fn child_of(&mut self, parent: EnvRef) -> EnvRef {
        self.push_frame(Some(parent))
    }

    fn push_frame(&mut self, parent: Option<EnvRef>) -> EnvRef {
        let id = self.frames.len() as u32;
        self.frames.push(Frame {
            bindings: HashMap::new(),
            parent,
        });
        EnvRef(id)
    }

    /// Walks frames root-ward; the first frame binding `name` wins.
    ///
    /// Returns `None` if `name` is unbound anywhere in the chain. The outer
    /// `Option` is presence; the inner `Option<ValueRef>` is the bound value
    /// itself, which may be the empty list.
    pub fn lookup(&self, env: EnvRef, name: SymbolId) -> Option<Option<ValueRef>> {
        let mut current = Some(env);
        while let Some(id) = current {
            let frame = &self.frames[id.0 as usize];
            if let Some(&value) = frame.bindings.get(&name) {
                return Some(value);
            }
            current = frame.parent;
        }
        None
    }

    pub fn lookup_or_err(&self, env: EnvRef, name: SymbolId, text: &str) -> Result<Option<ValueRef>> {
        self.lookup(env, name)
            .ok_or_else(|| Error::name(format!("unbound symbol: {text}")))
    }

    /// Writes into `env`'s own frame, shadowing any outer binding.
    pub fn define(&mut self, env: EnvRef, name: SymbolId, value: Option<ValueRef>) {
        self.frames[env.0 as usize].bindings.insert(name, value);
    }

    /// Updates the nearest frame (starting at `env`) that already binds
    /// `name`. Fails if no frame in the chain does.
    pub fn assign(
        &mut self,
        env: EnvRef,
        name: SymbolId,
        value: Option<ValueRef>,
        text: &str,
    ) -> Result<()> {
        let mut current = Some(env);
        while let Some(id) = current {
            let frame = &mut self.frames[id.0 as usize];
            if frame.bindings.contains_key(&name) {
                frame.bindings.insert(name, value);
                return Ok(());
            }
            current = frame.parent;
        }
        Err(Error::name(format!("unbound symbol: {text}")))
    }
}

impl Default for Envs {
    fn default() -> Envs {
        Envs::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::{Arena, Value};

    #[test]
    fn shadowing_and_upward_lookup() {
        let mut arena = Arena::new();
        let mut envs = Envs::new();
        let root = envs.root();
        let child = envs.child_of(root);

        let x = arena.intern("x");
        let one = arena.alloc(Value::Number(1));
        let two = arena.alloc(Value::Number(2));

        envs.define(root, x, Some(one));
        assert_eq!(envs.lookup(child, x), Some(Some(one)));

        envs.define(child, x, Some(two));
        assert_eq!(envs.lookup(child, x), Some(Some(two)));
        assert_eq!(envs.lookup(root, x), Some(Some(one)));
    }

    #[test]
    fn assign_updates_defining_frame_not_shadow() {
        let mut arena = Arena::new();
        let mut envs = Envs::new();
        let root = envs.root();
        let child = envs.child_of(root);

        let x = arena.intern("x");
        let one = arena.alloc(Value::Number(1));
        let three = arena.alloc(Value::Number(3));

        envs.define(root, x, Some(one));
        envs.assign(child, x, Some(three), "x").unwrap();
        assert_eq!(envs.lookup(root, x), Some(Some(three)));
        assert_eq!(envs.lookup(child, x), Some(Some(three)));
    }

    #[test]
    fn assign_unbound_fails() {
        let mut arena = Arena::new();
        let mut envs = Envs::new();
        let root = envs.root();
        let y = arena.intern("y");
        let one = arena.alloc(Value::Number(1));
        assert!(envs.assign(root, y, Some(one), "y").is_err());
    }

    #[test]
    fn binding_the_empty_list_is_distinct_from_unbound() {
        let mut arena = Arena::new();
        let mut envs = Envs::new();
        let root = envs.root();
        let x = arena.intern("x");
        let y = arena.intern("y");

        envs.define(root, x, None);
        assert_eq!(envs.lookup(root, x), Some(None));
        assert_eq!(envs.lookup(root, y), None);
    }
}
