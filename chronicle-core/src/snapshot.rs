//! A snapshot: one version of one object (§3.3).

use alloc::string::String;
use alloc::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use chronicle_value::Variant;

use crate::id::{ObjectId, SnapshotId};
use crate::metamodel::ObjectType;
use crate::structure::Structure;

/// Where a snapshot sits in its lifecycle (§3.6). `Stable` is part of the
/// documented state set but is not reached by any transition this crate
/// performs — frames move snapshots straight from `Validated` to `Frozen`
/// during acceptance, and frozen snapshots are what a `StableFrame`
/// holds. The variant is kept because spec.md names it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    /// Allocated but not yet given a structure (never observable outside
    /// `TransientFrame::create`, which initializes a structure before
    /// returning).
    Uninitialized,
    /// Mutable, owned by an open transient frame.
    Transient,
    /// Reserved for parity with spec.md's documented state set; see the
    /// type-level doc comment.
    Stable,
    /// Checked against its type/constraints during acceptance, not yet
    /// frozen.
    Validated,
    /// Immutable; may be shared by any number of stable frames.
    Frozen,
}

/// One version of one object (§3.3). The object type is reference-counted
/// so cloning a snapshot (`TransientFrame::mutate`'s clone-on-write step)
/// never deep-copies the metamodel.
#[derive(Clone)]
pub struct Snapshot {
    snapshot_id: SnapshotId,
    object_id: ObjectId,
    object_type: Arc<dyn ObjectType + Send + Sync>,
    structure: Structure,
    attributes: IndexMap<String, Variant>,
    parent: Option<ObjectId>,
    children: IndexSet<ObjectId>,
    state: SnapshotState,
}

impl core::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Snapshot")
            .field("snapshot_id", &self.snapshot_id)
            .field("object_id", &self.object_id)
            .field("object_type", &self.object_type.name())
            .field("structure", &self.structure)
            .field("attributes", &self.attributes)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("state", &self.state)
            .finish()
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot_id == other.snapshot_id
            && self.object_id == other.object_id
            && Arc::ptr_eq(&self.object_type, &other.object_type)
            && self.structure == other.structure
            && self.attributes == other.attributes
            && self.parent == other.parent
            && self.children == other.children
            && self.state == other.state
    }
}

impl Snapshot {
    /// Builds a new, transient snapshot. Structure must already match
    /// `object_type.structural_role()` — `TransientFrame::create` is
    /// responsible for that check; this constructor trusts its caller.
    pub fn new(
        snapshot_id: SnapshotId,
        object_id: ObjectId,
        object_type: Arc<dyn ObjectType + Send + Sync>,
        structure: Structure,
        attributes: IndexMap<String, Variant>,
    ) -> Self {
        Snapshot {
            snapshot_id,
            object_id,
            object_type,
            structure,
            attributes,
            parent: None,
            children: IndexSet::new(),
            state: SnapshotState::Transient,
        }
    }

    /// This version's unique ID.
    pub fn snapshot_id(&self) -> SnapshotId {
        self.snapshot_id
    }

    /// The stable identity shared by every version of this object.
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// This object's type.
    pub fn object_type(&self) -> &Arc<dyn ObjectType + Send + Sync> {
        &self.object_type
    }

    /// This object's graph role.
    pub fn structure(&self) -> Structure {
        self.structure
    }

    /// All attributes.
    pub fn attributes(&self) -> &IndexMap<String, Variant> {
        &self.attributes
    }

    /// A single attribute's value, if set.
    pub fn attribute(&self, name: &str) -> Option<&Variant> {
        self.attributes.get(name)
    }

    /// Sets (or replaces) an attribute. Callers must hold an owned
    /// snapshot — see `TransientFrame::set_attribute`.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Variant) {
        self.attributes.insert(name.into(), value);
    }

    /// This object's parent, if any.
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Sets the parent pointer directly. Frame hierarchy helpers keep
    /// both sides of the parent/child relation synchronized; this is the
    /// low-level half they call.
    pub fn set_parent(&mut self, parent: Option<ObjectId>) {
        self.parent = parent;
    }

    /// This object's children, in insertion order.
    pub fn children(&self) -> &IndexSet<ObjectId> {
        &self.children
    }

    /// Adds a child, if not already present.
    pub fn add_child(&mut self, child: ObjectId) {
        self.children.insert(child);
    }

    /// Removes a child.
    pub fn remove_child(&mut self, child: ObjectId) {
        self.children.shift_remove(&child);
    }

    /// This snapshot's lifecycle state.
    pub fn state(&self) -> SnapshotState {
        self.state
    }

    /// Replaces this snapshot's ID and marks it as a freshly-owned copy
    /// (`TransientFrame::mutate`'s clone-on-write step).
    pub fn reassign_for_mutation(&mut self, new_snapshot_id: SnapshotId) {
        self.snapshot_id = new_snapshot_id;
        self.state = SnapshotState::Transient;
    }

    /// Advances this snapshot to `Validated`. Called by `Memory::accept`
    /// after constraint/type checks pass.
    pub fn mark_validated(&mut self) {
        self.state = SnapshotState::Validated;
    }

    /// Advances this snapshot to `Frozen`, the terminal, immutable state.
    pub fn freeze(&mut self) {
        self.state = SnapshotState::Frozen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::SimpleObjectType;
    use crate::structure::StructuralKind;

    fn node_type() -> Arc<dyn ObjectType + Send + Sync> {
        Arc::new(SimpleObjectType::new("Node", StructuralKind::Node, alloc::vec::Vec::new()))
    }

    #[test]
    fn child_removal_preserves_order_of_remaining() {
        let mut s = Snapshot::new(
            SnapshotId::from_raw(1),
            ObjectId::from_raw(1),
            node_type(),
            Structure::Node,
            IndexMap::new(),
        );
        s.add_child(ObjectId::from_raw(2));
        s.add_child(ObjectId::from_raw(3));
        s.add_child(ObjectId::from_raw(4));
        s.remove_child(ObjectId::from_raw(3));
        let remaining: alloc::vec::Vec<_> = s.children().iter().copied().collect();
        assert_eq!(remaining, [ObjectId::from_raw(2), ObjectId::from_raw(4)]);
    }

    #[test]
    fn mutate_reassignment_resets_to_transient() {
        let mut s = Snapshot::new(
            SnapshotId::from_raw(1),
            ObjectId::from_raw(1),
            node_type(),
            Structure::Node,
            IndexMap::new(),
        );
        s.mark_validated();
        s.freeze();
        s.reassign_for_mutation(SnapshotId::from_raw(99));
        assert_eq!(s.snapshot_id(), SnapshotId::from_raw(99));
        assert_eq!(s.state(), SnapshotState::Transient);
    }
}
