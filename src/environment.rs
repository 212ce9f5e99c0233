//! Chained scope frames.
//!
//! Frames are shared (`Rc<RefCell<_>>`): a block being executed and every
//! closure created inside it hold the same frame, so a write through one is
//! seen by all of them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::value::Value;

/// Shared handle to a frame.
pub type EnvRef<'a> = Rc<RefCell<Environment<'a>>>;

/// Why a lookup or assignment failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// No frame on the searched path binds the name.
    Undefined,

    /// Bound by `var x;` but never assigned.
    Uninitialized,
}

pub struct Environment<'a> {
    /// `None` marks a declared but uninitialized binding.
    values: HashMap<&'a str, Option<Value<'a>>>,
    enclosing: Option<EnvRef<'a>>,
}

impl<'a> Environment<'a> {
    /// A root frame (the globals).
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef<'a>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap in a fresh shared handle.
    pub fn into_ref(self) -> EnvRef<'a> {
        Rc::new(RefCell::new(self))
    }

    /// Child frame of `parent`, already wrapped.
    pub fn child_of(parent: &EnvRef<'a>) -> EnvRef<'a> {
        Environment::with_enclosing(Rc::clone(parent)).into_ref()
    }

    pub fn enclosing(&self) -> Option<EnvRef<'a>> {
        self.enclosing.clone()
    }

    /// Bind `name` to `value`, replacing any earlier binding in this frame.
    pub fn define(&mut self, name: &'a str, value: Value<'a>) {
        self.values.insert(name, Some(value));
    }

    /// Bind `name` without a value.
    pub fn declare(&mut self, name: &'a str) {
        self.values.insert(name, None);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Look `name` up in this frame only.
    pub fn get(&self, name: &str) -> Result<Value<'a>, Lookup> {
        match self.values.get(name) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(Lookup::Uninitialized),
            None => Err(Lookup::Undefined),
        }
    }

    /// Overwrite an existing binding in this frame only.
    pub fn assign(&mut self, name: &str, value: Value<'a>) -> Result<(), Lookup> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(Lookup::Undefined),
        }
    }

    /// Names bound in this frame, sorted.
    pub fn names(&self) -> Vec<&'a str> {
        let mut names: Vec<&'a str> = self.values.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl<'a> Default for Environment<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk `distance` parent links from `env`.  `None` if the chain is shorter.
pub fn ancestor<'a>(env: &EnvRef<'a>, distance: usize) -> Option<EnvRef<'a>> {
    let mut current: EnvRef<'a> = Rc::clone(env);

    for _ in 0..distance {
        let parent = current.borrow().enclosing()?;
        current = parent;
    }

    Some(current)
}

/// Read `name` from the frame exactly `distance` links above `env`.
pub fn get_at<'a>(env: &EnvRef<'a>, distance: usize, name: &str) -> Result<Value<'a>, Lookup> {
    debug!("Reading '{}' at distance {}", name, distance);

    match ancestor(env, distance) {
        Some(frame) => frame.borrow().get(name),
        None => Err(Lookup::Undefined),
    }
}

/// Write `name` in the frame exactly `distance` links above `env`.
pub fn assign_at<'a>(
    env: &EnvRef<'a>,
    distance: usize,
    name: &str,
    value: Value<'a>,
) -> Result<(), Lookup> {
    debug!("Writing '{}' at distance {}", name, distance);

    match ancestor(env, distance) {
        Some(frame) => frame.borrow_mut().assign(name, value),
        None => Err(Lookup::Undefined),
    }
}

// Bindings may hold closures that capture this very frame, so only the
// names are printed.
impl<'a> fmt::Debug for Environment<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("names", &self.names())
            .field("has_enclosing", &self.enclosing.is_some())
            .finish()
    }
}
