//! Built-in function registry.
//!
//! Two categories, one submodule each: [`core`] (`print`, `println`, `scan`,
//! `int`, `len`) and [`math`] (`sin`, `cos`, `sqrt`, `floor`, `random`).
//! Each submodule exposes a `register` function that inserts its bindings
//! into a [`BuiltinRegistry`]; `BuiltinRegistry::new` wires them all up.
//! Built-in names are consulted before user-defined functions at every call
//! site, per the reservation invariant in the data model.

use std::collections::HashMap;

use crate::error::TinyError;
use crate::value::Value;

pub mod core;
pub mod math;

pub type BuiltinFn = fn(&[Value]) -> Result<Value, TinyError>;

pub struct BuiltinRegistry {
    functions: HashMap<&'static str, BuiltinFn>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let mut registry = BuiltinRegistry {
            functions: HashMap::new(),
        };
        core::register(&mut registry);
        math::register(&mut registry);
        registry
    }

    pub fn insert(&mut self, name: &'static str, f: BuiltinFn) {
        self.functions.insert(name, f);
    }

    pub fn get(&self, name: &str) -> Option<&BuiltinFn> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}
