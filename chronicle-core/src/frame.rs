//! Frames: a coherent set of snapshots representing a design at a point
//! in time (§3.4), and the mutation API a [`TransientFrame`] exposes
//! while it is being built up (§4.2, §4.3).

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::sync::Arc;
use core::cell::RefCell;

use indexmap::IndexMap;

use chronicle_value::Variant;

use crate::graph::FrameView;
use crate::id::{FrameId, IdAllocator, ObjectId, SnapshotId};
use crate::metamodel::ObjectType;
use crate::snapshot::Snapshot;
use crate::structure::{Structure, StructuralKind};

/// Whether a [`TransientFrame`]'s copy of a snapshot may be mutated in
/// place, or is a shared, frozen snapshot inherited from a parent frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ownership {
    Owned,
    Shared,
}

struct Entry {
    snapshot: Snapshot,
    ownership: Ownership,
}

/// A transient frame's lifecycle (§3.4): `open` until the memory accepts
/// or discards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Mutable, not yet submitted.
    Open,
    /// Accepted into history; the [`TransientFrame`] value itself is
    /// consumed by `Memory::accept`, which produces a [`StableFrame`] —
    /// this variant exists so a stale reference can observe the
    /// transition happened.
    Accepted,
    /// Discarded; the frame's owned-only snapshot IDs are released.
    Discarded,
}

/// A mutable, under-construction frame (§3.4, §4.2).
pub struct TransientFrame {
    id: FrameId,
    allocator: Rc<RefCell<IdAllocator>>,
    snapshots: IndexMap<ObjectId, Entry>,
    removed_objects: BTreeSet<ObjectId>,
    state: FrameState,
}

impl TransientFrame {
    pub(crate) fn new(id: FrameId, allocator: Rc<RefCell<IdAllocator>>) -> Self {
        TransientFrame {
            id,
            allocator,
            snapshots: IndexMap::new(),
            removed_objects: BTreeSet::new(),
            state: FrameState::Open,
        }
    }

    pub(crate) fn derive(
        id: FrameId,
        allocator: Rc<RefCell<IdAllocator>>,
        parent: &StableFrame,
    ) -> Self {
        let snapshots = parent
            .snapshots
            .iter()
            .map(|(id, snapshot)| {
                (
                    *id,
                    Entry {
                        snapshot: snapshot.clone(),
                        ownership: Ownership::Shared,
                    },
                )
            })
            .collect();
        TransientFrame {
            id,
            allocator,
            snapshots,
            removed_objects: BTreeSet::new(),
            state: FrameState::Open,
        }
    }

    /// This frame's ID.
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Whether this frame is still open for mutation.
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Objects that existed in the frame this was derived from but were
    /// removed here.
    pub fn removed_objects(&self) -> &BTreeSet<ObjectId> {
        &self.removed_objects
    }

    pub(crate) fn mark_state(&mut self, state: FrameState) {
        self.state = state;
    }

    /// Every owned snapshot (newly created or cloned-for-mutation in this
    /// frame) — the set `Memory::accept` validates and freezes.
    pub(crate) fn owned_snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots
            .values()
            .filter(|e| e.ownership == Ownership::Owned)
            .map(|e| &e.snapshot)
    }

    pub(crate) fn owned_snapshots_mut(&mut self) -> impl Iterator<Item = &mut Snapshot> {
        self.snapshots
            .values_mut()
            .filter(|e| e.ownership == Ownership::Owned)
            .map(|e| &mut e.snapshot)
    }

    /// Creates a new object, allocating its IDs unless specific ones are
    /// proposed. The structure must match `object_type`'s declared role
    /// (a mismatch is a programming error — the caller is responsible
    /// for constructing a matching `Structure`).
    pub fn create(
        &mut self,
        object_type: Arc<dyn ObjectType + Send + Sync>,
        structure: Structure,
        attributes: IndexMap<String, Variant>,
        object_id: Option<ObjectId>,
        snapshot_id: Option<SnapshotId>,
    ) -> ObjectId {
        assert!(
            structure.kind() == object_type.structural_role(),
            "structure {:?} does not match type {}'s structural role {:?}",
            structure.kind(),
            object_type.name(),
            object_type.structural_role()
        );
        if let Structure::Edge { origin, target } = structure {
            assert!(self.contains(origin), "edge origin {origin} does not exist in frame");
            assert!(self.contains(target), "edge target {target} does not exist in frame");
        }
        let object_id = object_id.unwrap_or_else(|| self.allocator.borrow_mut().allocate_object());
        let snapshot_id = snapshot_id.unwrap_or_else(|| self.allocator.borrow_mut().allocate_snapshot());
        let snapshot = Snapshot::new(snapshot_id, object_id, object_type, structure, attributes);
        self.snapshots.insert(
            object_id,
            Entry {
                snapshot,
                ownership: Ownership::Owned,
            },
        );
        object_id
    }

    /// Inserts a pre-built snapshot. A shared (`owned = false`) snapshot
    /// must already be frozen; an owned one must not be (both are
    /// programming errors otherwise, per §4.2).
    pub fn insert(&mut self, snapshot: Snapshot, owned: bool) {
        self.check_insert_state(&snapshot, owned);
        self.insert_unsafe(snapshot, owned);
    }

    /// Like [`TransientFrame::insert`], but skips the referential
    /// integrity implied by a normal `create`/`mutate` call — for bulk
    /// loading, where the caller (a design loader) is responsible for
    /// restoring full integrity before calling `Memory::accept` (§4.2
    /// "ordering-independence").
    pub fn insert_unsafe(&mut self, snapshot: Snapshot, owned: bool) {
        let ownership = if owned { Ownership::Owned } else { Ownership::Shared };
        self.snapshots.insert(
            snapshot.object_id(),
            Entry { snapshot, ownership },
        );
    }

    fn check_insert_state(&self, snapshot: &Snapshot, owned: bool) {
        use crate::snapshot::SnapshotState;
        if owned {
            assert!(
                snapshot.state() != SnapshotState::Frozen,
                "cannot insert a frozen snapshot as owned"
            );
        } else {
            assert!(
                snapshot.state() == SnapshotState::Frozen,
                "a shared snapshot must already be frozen"
            );
        }
    }

    /// Returns a mutable owned snapshot for `object_id`: if it is already
    /// owned, returns it directly; otherwise clones the shared snapshot
    /// with a fresh snapshot ID and marks it owned. Idempotent within a
    /// frame (§4.2, §8 round-trip law).
    pub fn mutate(&mut self, object_id: ObjectId) -> &mut Snapshot {
        let entry = self
            .snapshots
            .get_mut(&object_id)
            .unwrap_or_else(|| panic!("unknown object {object_id} in frame"));
        if entry.ownership == Ownership::Shared {
            let new_id = self.allocator.borrow_mut().allocate_snapshot();
            entry.snapshot.reassign_for_mutation(new_id);
            entry.ownership = Ownership::Owned;
        }
        &mut self.snapshots.get_mut(&object_id).unwrap().snapshot
    }

    /// Sets an attribute on `object_id`, making it mutable first if
    /// necessary.
    pub fn set_attribute(&mut self, object_id: ObjectId, name: impl Into<String>, value: Variant) {
        self.mutate(object_id).set_attribute(name, value);
    }

    /// Attaches `child` to `parent`, synchronizing both sides, creating
    /// mutable versions of each as needed.
    ///
    /// Rejects a cycle (`parent` already a descendant of `child`, or
    /// `parent == child`) by walking the ancestor chain before mutating
    /// anything — the hierarchy cycle check §9 leaves as an open
    /// implementation choice; this crate enforces it rather than ship a
    /// known footgun in its own helpers.
    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) {
        if let Some(parent) = parent {
            assert!(child != parent, "an object cannot be its own parent");
            assert!(
                !self.is_ancestor(child, parent),
                "setting parent {parent} of {child} would introduce a cycle"
            );
        }
        self.remove_from_parent(child);
        if let Some(parent) = parent {
            self.mutate(child).set_parent(Some(parent));
            self.mutate(parent).add_child(child);
        }
    }

    /// Whether `candidate` is an ancestor of `start` (walking
    /// `start.parent`, `start.parent.parent`, ...).
    fn is_ancestor(&self, start: ObjectId, candidate: ObjectId) -> bool {
        let mut current = self.get(start).and_then(Snapshot::parent);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.get(id).and_then(Snapshot::parent);
        }
        false
    }

    /// Adds `child` to `parent`'s children, without touching any existing
    /// parent pointer on `child` (for building multi-parent staging data
    /// before `set_parent` settles the canonical link — most callers want
    /// [`TransientFrame::set_parent`] instead).
    pub fn add_child(&mut self, child: ObjectId, to: ObjectId) {
        self.mutate(to).add_child(child);
    }

    /// Removes `child` from `parent`'s children without touching
    /// `child`'s own parent pointer (see
    /// [`TransientFrame::add_child`]).
    pub fn remove_child(&mut self, child: ObjectId, from: ObjectId) {
        self.mutate(from).remove_child(child);
    }

    /// Detaches `child` from its current parent, if any, synchronizing
    /// both sides.
    pub fn remove_from_parent(&mut self, child: ObjectId) {
        let Some(parent) = self.get(child).and_then(Snapshot::parent) else {
            return;
        };
        self.mutate(child).set_parent(None);
        self.mutate(parent).remove_child(child);
    }

    /// Removes `object_id` and everything that structurally depends on
    /// it: incident edges, children (recursively), and membership in any
    /// parent's children or `ordered_set` owner's items (§4.3).
    pub fn remove_cascading(&mut self, object_id: ObjectId) -> BTreeSet<ObjectId> {
        let mut to_remove = alloc::vec![object_id];
        let mut removed = BTreeSet::new();
        while let Some(y) = to_remove.pop() {
            if removed.contains(&y) {
                continue;
            }
            for id in self.object_ids_snapshot() {
                if removed.contains(&id) || to_remove.contains(&id) {
                    continue;
                }
                if let Structure::Edge { origin, target } = self.get(id).unwrap().structure() {
                    if origin == y || target == y {
                        to_remove.push(id);
                    }
                }
            }
            let children: alloc::vec::Vec<ObjectId> =
                self.get(y).map(|s| s.children().iter().copied().collect()).unwrap_or_default();
            for c in children {
                if !removed.contains(&c) {
                    to_remove.push(c);
                }
            }
            if let Some(p) = self.get(y).and_then(Snapshot::parent) {
                if !removed.contains(&p) {
                    self.mutate(p).remove_child(y);
                }
            }
            self.snapshots.shift_remove(&y);
            self.removed_objects.insert(y);
            removed.insert(y);
        }
        removed
    }

    fn object_ids_snapshot(&self) -> alloc::vec::Vec<ObjectId> {
        self.snapshots.keys().copied().collect()
    }
}

impl FrameView for TransientFrame {
    fn get(&self, id: ObjectId) -> Option<&Snapshot> {
        self.snapshots.get(&id).map(|e| &e.snapshot)
    }

    fn object_ids(&self) -> Box<dyn Iterator<Item = ObjectId> + '_> {
        Box::new(self.snapshots.keys().copied())
    }
}

/// An immutable, accepted frame (§3.4). Obtained only through
/// [`crate::memory::Memory::accept`].
#[derive(Clone)]
pub struct StableFrame {
    id: FrameId,
    snapshots: IndexMap<ObjectId, Snapshot>,
}

impl StableFrame {
    pub(crate) fn new(id: FrameId, snapshots: IndexMap<ObjectId, Snapshot>) -> Self {
        StableFrame { id, snapshots }
    }

    /// This frame's ID.
    pub fn id(&self) -> FrameId {
        self.id
    }

}

impl FrameView for StableFrame {
    fn get(&self, id: ObjectId) -> Option<&Snapshot> {
        self.snapshots.get(&id)
    }

    fn object_ids(&self) -> Box<dyn Iterator<Item = ObjectId> + '_> {
        Box::new(self.snapshots.keys().copied())
    }
}
