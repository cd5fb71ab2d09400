//! An object's graph role (§3.3 `structure`, §4.4 graph view, §4.5
//! `StructuralKind` predicate).

use crate::id::ObjectId;

/// The shape-only counterpart of [`Structure`], used where only the kind
/// (not the edge endpoints) matters — type schema checks, the
/// `StructuralKind` predicate, and matching a snapshot's structure
/// against its type's declared role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralKind {
    /// No graph role.
    Unstructured,
    /// A node in the graph view.
    Node,
    /// An edge in the graph view.
    Edge,
}

/// An object's graph role and, for edges, its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    /// No graph role.
    Unstructured,
    /// A node in the graph view.
    Node,
    /// An edge in the graph view, `origin -> target`.
    Edge {
        /// The edge's origin endpoint.
        origin: ObjectId,
        /// The edge's target endpoint.
        target: ObjectId,
    },
}

impl Structure {
    /// This structure's [`StructuralKind`].
    pub const fn kind(&self) -> StructuralKind {
        match self {
            Structure::Unstructured => StructuralKind::Unstructured,
            Structure::Node => StructuralKind::Node,
            Structure::Edge { .. } => StructuralKind::Edge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_kind_ignores_endpoints() {
        let s = Structure::Edge {
            origin: ObjectId::from_raw(1),
            target: ObjectId::from_raw(2),
        };
        assert_eq!(s.kind(), StructuralKind::Edge);
    }
}
