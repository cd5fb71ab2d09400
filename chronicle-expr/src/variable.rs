//! Variable references: the resolved form of a bare identifier after
//! binding.
//!
//! Per the documented design constraint, a builtin variable is never
//! compared by pointer identity — it is an index into an arena
//! ([`BuiltinRegistry`]), and identity is index equality (`Copy`,
//! `PartialEq`), the same shape as a `facet-solver` `ResolutionHandle`.

use alloc::string::String;
use alloc::vec::Vec;

use chronicle_value::ValueType;

/// An index into a [`BuiltinRegistry`]. `Copy` + `PartialEq` by index, not
/// by any kind of pointer identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinHandle(pub(crate) usize);

/// A resolved reference to a variable: either a user object (identified by
/// its raw id) or a builtin (identified by an arena handle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableReference {
    /// An object's own id, interpreted by the binding caller (typically the
    /// object memory).
    Object(u64),
    /// A builtin variable, looked up in the [`BuiltinRegistry`] that was
    /// active at bind time.
    Builtin(BuiltinHandle),
}

/// One entry in a [`BuiltinRegistry`]: a builtin variable's name and type.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinVariableDef {
    /// The name bound expressions refer to it by.
    pub name: String,
    /// Its value type.
    pub value_type: ValueType,
}

/// An arena of builtin variables (e.g. `time`, `dt` in a simulation
/// context), handed out as stable [`BuiltinHandle`]s.
#[derive(Debug, Clone, Default)]
pub struct BuiltinRegistry {
    defs: Vec<BuiltinVariableDef>,
}

impl BuiltinRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        BuiltinRegistry { defs: Vec::new() }
    }

    /// Registers a builtin variable, returning its handle.
    pub fn register(&mut self, name: impl Into<String>, value_type: ValueType) -> BuiltinHandle {
        let handle = BuiltinHandle(self.defs.len());
        self.defs.push(BuiltinVariableDef {
            name: name.into(),
            value_type,
        });
        handle
    }

    /// Looks up a builtin by name, returning its handle and type.
    pub fn find(&self, name: &str) -> Option<(BuiltinHandle, ValueType)> {
        self.defs
            .iter()
            .position(|d| d.name == name)
            .map(|i| (BuiltinHandle(i), self.defs[i].value_type))
    }

    /// The definition behind a handle.
    pub fn get(&self, handle: BuiltinHandle) -> &BuiltinVariableDef {
        &self.defs[handle.0]
    }

    /// All registered names, for "did you mean" suggestions.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(|d| d.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_value::AtomType;

    #[test]
    fn handles_are_index_equality_not_pointer_equality() {
        let mut reg = BuiltinRegistry::new();
        let h1 = reg.register("time", ValueType::Atom(AtomType::Double));
        let (h2, ty) = reg.find("time").unwrap();
        assert_eq!(h1, h2);
        assert_eq!(ty, ValueType::Atom(AtomType::Double));
    }
}
