//! Memory: the single owner of IDs, frames, and history (§4.1).

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use indexmap::IndexMap;

use chronicle_value::ValueType;

use crate::constraint::Constraint;
use crate::error::{ConstraintViolation, FrameValidationError, HistoryError, TypeError};
use crate::frame::{FrameState, StableFrame, TransientFrame};
use crate::graph::FrameView;
use crate::id::{FrameId, IdAllocator, SnapshotId};

/// A `FrameId`-keyed wrapper making a frozen [`StableFrame`] usable as an
/// [`iddqd::IdOrdItem`], so `Memory`'s stable frame table is the
/// ID-native ordered map this data genuinely is (one entry per frame,
/// looked up and iterated by ID) rather than a general-purpose map reused
/// out of habit.
#[cfg(feature = "std")]
struct StableFrameEntry(StableFrame);

#[cfg(feature = "std")]
impl iddqd::IdOrdItem for StableFrameEntry {
    type Key<'a> = FrameId;

    fn key(&self) -> Self::Key<'_> {
        self.0.id()
    }

    iddqd::id_upcast!();
}

/// The stable frame table. `iddqd::IdOrdMap` needs its host crate's
/// `std` feature (it keeps a thread-local scratch buffer), so a `no_std`
/// build falls back to a plain `BTreeMap` keyed the same way — same
/// lookup-by-ID shape, without the thread-local dependency.
#[cfg(feature = "std")]
struct StableFrameTable(iddqd::IdOrdMap<StableFrameEntry>);

#[cfg(not(feature = "std"))]
struct StableFrameTable(alloc::collections::BTreeMap<FrameId, StableFrame>);

impl StableFrameTable {
    fn new() -> Self {
        #[cfg(feature = "std")]
        {
            StableFrameTable(iddqd::IdOrdMap::new())
        }
        #[cfg(not(feature = "std"))]
        {
            StableFrameTable(alloc::collections::BTreeMap::new())
        }
    }

    fn get(&self, id: &FrameId) -> Option<&StableFrame> {
        #[cfg(feature = "std")]
        {
            self.0.get(id).map(|e| &e.0)
        }
        #[cfg(not(feature = "std"))]
        {
            self.0.get(id)
        }
    }

    fn insert(&mut self, frame: StableFrame) {
        #[cfg(feature = "std")]
        {
            self.0.insert_overwrite(StableFrameEntry(frame));
        }
        #[cfg(not(feature = "std"))]
        {
            self.0.insert(frame.id(), frame);
        }
    }

    fn remove(&mut self, id: &FrameId) -> Option<StableFrame> {
        #[cfg(feature = "std")]
        {
            self.0.remove(id).map(|e| e.0)
        }
        #[cfg(not(feature = "std"))]
        {
            self.0.remove(id)
        }
    }

    fn ids(&self) -> Vec<FrameId> {
        #[cfg(feature = "std")]
        {
            self.0.iter().map(|e| e.0.id()).collect()
        }
        #[cfg(not(feature = "std"))]
        {
            self.0.keys().copied().collect()
        }
    }
}

fn value_type_convertible(from: ValueType, to: ValueType) -> bool {
    match (from, to) {
        (ValueType::Atom(from), ValueType::Atom(to)) => chronicle_value::is_convertible(from, to),
        (ValueType::Array(from), ValueType::Array(to)) => chronicle_value::is_convertible(from, to),
        _ => false,
    }
}

/// The versioned, transactional store of an entire design (§3, §4.1).
///
/// Owns every frame ever accepted (until garbage collected) plus the
/// single `current_frame`/undo/redo history. Frames derive from the
/// current frame by default; `Memory` does not otherwise enforce a
/// particular editing workflow.
pub struct Memory {
    allocator: Rc<RefCell<IdAllocator>>,
    stable_frames: StableFrameTable,
    open_frames: IndexMap<FrameId, TransientFrame>,
    undo_list: Vec<FrameId>,
    current_frame: Option<FrameId>,
    redo_list: Vec<FrameId>,
    constraints: Vec<Constraint>,
    /// How many stable frames currently hold each snapshot version (§4.1
    /// garbage collection). Incremented when a frame freezing that
    /// version is accepted, decremented when such a frame is removed;
    /// a snapshot whose count reaches zero releases its snapshot ID
    /// reservation back to the allocator.
    snapshot_refs: BTreeMap<SnapshotId, usize>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    /// An empty memory: no frames, no history.
    pub fn new() -> Self {
        Memory {
            allocator: Rc::new(RefCell::new(IdAllocator::new())),
            stable_frames: StableFrameTable::new(),
            open_frames: IndexMap::new(),
            undo_list: Vec::new(),
            current_frame: None,
            redo_list: Vec::new(),
            constraints: Vec::new(),
            snapshot_refs: BTreeMap::new(),
        }
    }

    /// Registers a constraint, checked on every future `accept` call.
    /// Constraints already satisfied by stable history are not
    /// retroactively re-checked.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Starts a new, empty transient frame with no parent.
    pub fn create_frame(&mut self) -> FrameId {
        let id = self.allocator.borrow_mut().allocate_frame();
        let frame = TransientFrame::new(id, Rc::clone(&self.allocator));
        self.open_frames.insert(id, frame);
        log::debug!("created empty frame {id}");
        id
    }

    /// Starts a new transient frame whose initial snapshots are shared
    /// with `parent` (or empty, if `None`). `None` means "derive from the
    /// current frame" only when the caller passes
    /// `self.current_frame()`; passing `None` directly starts a frame
    /// with no snapshots at all, matching [`Memory::create_frame`].
    pub fn derive_frame(&mut self, parent: Option<FrameId>) -> FrameId {
        let id = self.allocator.borrow_mut().allocate_frame();
        let frame = match parent {
            Some(parent_id) => {
                let parent = self
                    .stable_frames
                    .get(&parent_id)
                    .unwrap_or_else(|| panic!("unknown frame {parent_id}"));
                TransientFrame::derive(id, Rc::clone(&self.allocator), parent)
            }
            None => TransientFrame::new(id, Rc::clone(&self.allocator)),
        };
        self.open_frames.insert(id, frame);
        log::debug!("derived frame {id} from {parent:?}");
        id
    }

    /// The currently open transient frames (by ID).
    pub fn open_frame_ids(&self) -> impl Iterator<Item = FrameId> + '_ {
        self.open_frames.keys().copied()
    }

    /// A transient frame by ID, if still open.
    pub fn transient_frame(&self, id: FrameId) -> Option<&TransientFrame> {
        self.open_frames.get(&id)
    }

    /// Mutable access to a still-open transient frame.
    pub fn transient_frame_mut(&mut self, id: FrameId) -> Option<&mut TransientFrame> {
        self.open_frames.get_mut(&id)
    }

    /// A stable (accepted) frame by ID.
    pub fn stable_frame(&self, id: FrameId) -> Option<&StableFrame> {
        self.stable_frames.get(&id)
    }

    /// The frame at the head of history, if any frame has ever been
    /// accepted.
    pub fn current_frame(&self) -> Option<&StableFrame> {
        self.current_frame.and_then(|id| self.stable_frame(id))
    }

    /// The ID of the frame at the head of history.
    pub fn current_frame_id(&self) -> Option<FrameId> {
        self.current_frame
    }

    /// Validates and, if valid, freezes a transient frame into a stable
    /// one (§4.1 step 3, the 5-step acceptance algorithm):
    ///
    /// 1. referential integrity over every snapshot's structural and
    ///    hierarchy references — a frame with a dangling reference is not
    ///    a data-validity question but a broken invariant (the mutation
    ///    API never produces one; only misuse of `insert_unsafe` without
    ///    repairing references before `accept` can), so this step panics
    ///    rather than contributing to the returned error;
    /// 2. per-object schema check against its type's traits;
    /// 3. every registered constraint;
    /// 4. if either of the latter two checks failed, the frame is handed
    ///    back open, unchanged, with the accumulated
    ///    [`FrameValidationError`];
    /// 5. otherwise every owned snapshot is validated then frozen, the
    ///    frame is promoted to stable, and it becomes the new current
    ///    frame — with the previous current frame pushed onto the undo
    ///    list and the redo list cleared.
    pub fn accept(&mut self, frame_id: FrameId) -> Result<FrameId, FrameValidationError> {
        let mut frame = self
            .open_frames
            .swap_remove(&frame_id)
            .unwrap_or_else(|| panic!("unknown or already-resolved frame {frame_id}"));

        self.check_referential_integrity(&frame);

        let mut error = FrameValidationError::default();
        self.check_schemas(&frame, &mut error);
        self.check_constraints(&frame, &mut error);

        if !error.is_empty() {
            log::warn!(
                "frame {frame_id} failed acceptance: {} violation(s), {} object(s) with type errors",
                error.violations.len(),
                error.type_errors.len()
            );
            frame.mark_state(FrameState::Open);
            self.open_frames.insert(frame_id, frame);
            return Err(error);
        }

        for snapshot in frame.owned_snapshots_mut() {
            snapshot.mark_validated();
            snapshot.freeze();
        }
        frame.mark_state(FrameState::Accepted);

        let snapshots: IndexMap<_, _> = frame
            .object_ids()
            .map(|id| (id, frame.get(id).expect("object_ids yields present ids").clone()))
            .collect();
        for snapshot in snapshots.values() {
            *self.snapshot_refs.entry(snapshot.snapshot_id()).or_insert(0) += 1;
        }
        let stable = StableFrame::new(frame_id, snapshots);
        self.stable_frames.insert(stable);

        if let Some(previous) = self.current_frame.replace(frame_id) {
            self.undo_list.push(previous);
        }
        self.redo_list.clear();
        log::debug!("accepted frame {frame_id} as the current frame");
        Ok(frame_id)
    }

    fn check_referential_integrity(&self, frame: &TransientFrame) {
        use crate::structure::Structure;
        for id in frame.object_ids() {
            let snapshot = frame.get(id).expect("object_ids yields present ids");
            if let Structure::Edge { origin, target } = snapshot.structure() {
                assert!(
                    frame.contains(origin),
                    "edge {id} origin {origin} missing from its own frame"
                );
                assert!(
                    frame.contains(target),
                    "edge {id} target {target} missing from its own frame"
                );
            }
            if let Some(parent) = snapshot.parent() {
                assert!(
                    frame.contains(parent),
                    "object {id} parent {parent} missing from its own frame"
                );
            }
            for child in snapshot.children() {
                assert!(
                    frame.contains(*child),
                    "object {id} child {child} missing from its own frame"
                );
            }
        }
    }

    fn check_schemas(&self, frame: &TransientFrame, error: &mut FrameValidationError) {
        for id in frame.object_ids() {
            let snapshot = frame.get(id).expect("object_ids yields present ids");
            let mut errors = Vec::new();
            for object_trait in snapshot.object_type().traits() {
                for schema in object_trait.attributes() {
                    match snapshot.attribute(&schema.name) {
                        None => {
                            if schema.required {
                                errors.push(TypeError::MissingTraitAttribute {
                                    attribute: schema.name.clone(),
                                    trait_name: object_trait.name().into(),
                                });
                            }
                        }
                        Some(value) => {
                            if !value_type_convertible(value.value_type(), schema.value_type) {
                                errors.push(TypeError::TypeMismatch {
                                    attribute: schema.name.clone(),
                                    expected: schema.value_type,
                                });
                            }
                        }
                    }
                }
            }
            if !errors.is_empty() {
                error.type_errors.insert(id, errors);
            }
        }
    }

    fn check_constraints(&self, frame: &TransientFrame, error: &mut FrameValidationError) {
        for constraint in &self.constraints {
            let offenders = constraint.check(frame);
            if !offenders.is_empty() {
                error.violations.push(ConstraintViolation {
                    constraint: constraint.name.clone(),
                    objects: offenders,
                });
            }
        }
    }

    /// Discards a transient frame without validating it. Its owned
    /// (never-accepted) snapshots hold IDs that were never promoted into
    /// any stable frame's reference count, so they are released back to
    /// the allocator's reservation set directly (§4.1, §5 resource
    /// discipline) rather than through the refcount path `remove_frame`
    /// uses. The raw counter itself never rewinds (§4.1's IDs are never
    /// recycled), but a loader-reserved ID for a discarded record becomes
    /// available for a future reservation again.
    pub fn discard(&mut self, frame_id: FrameId) {
        let mut frame = self
            .open_frames
            .swap_remove(&frame_id)
            .unwrap_or_else(|| panic!("unknown or already-resolved frame {frame_id}"));
        {
            let mut allocator = self.allocator.borrow_mut();
            for snapshot in frame.owned_snapshots() {
                allocator.release_reservation(snapshot.object_id().raw());
                allocator.release_reservation(snapshot.snapshot_id().raw());
            }
        }
        frame.mark_state(FrameState::Discarded);
        log::debug!("discarded frame {frame_id}");
    }

    /// Moves the current frame back one step in history.
    pub fn undo(&mut self) -> Result<(), HistoryError> {
        let previous = self.undo_list.pop().ok_or(HistoryError::NothingToUndo)?;
        if let Some(current) = self.current_frame.replace(previous) {
            self.redo_list.push(current);
        }
        log::debug!("undo: current frame is now {previous}");
        Ok(())
    }

    /// Moves the current frame forward one step in history.
    pub fn redo(&mut self) -> Result<(), HistoryError> {
        let next = self.redo_list.pop().ok_or(HistoryError::NothingToRedo)?;
        if let Some(current) = self.current_frame.replace(next) {
            self.undo_list.push(current);
        }
        log::debug!("redo: current frame is now {next}");
        Ok(())
    }

    /// Moves directly to `target`, walking the undo or redo list as far
    /// as needed. `target` must already be in the undo list, the redo
    /// list, or be the current frame.
    pub fn undo_redo_to(&mut self, target: FrameId) -> Result<(), HistoryError> {
        if self.current_frame == Some(target) {
            return Ok(());
        }
        if self.undo_list.contains(&target) {
            while self.current_frame != Some(target) {
                self.undo()?;
            }
            return Ok(());
        }
        if self.redo_list.contains(&target) {
            while self.current_frame != Some(target) {
                self.redo()?;
            }
            return Ok(());
        }
        Err(HistoryError::UnknownFrameId(target))
    }

    /// Removes a stable frame no longer reachable from history, freeing
    /// its table entry. Refuses to remove the current frame or any frame
    /// still present in the undo/redo lists.
    ///
    /// Decrements the reference count of every snapshot the frame held; a
    /// snapshot no other stable frame references is released from the
    /// allocator's used set (§8 invariant 7, §4.1 garbage collection).
    pub fn remove_frame(&mut self, frame_id: FrameId) -> Result<(), HistoryError> {
        if self.current_frame == Some(frame_id)
            || self.undo_list.contains(&frame_id)
            || self.redo_list.contains(&frame_id)
        {
            return Err(HistoryError::UnknownFrameId(frame_id));
        }
        let Some(removed) = self.stable_frames.remove(&frame_id) else {
            return Err(HistoryError::UnknownFrameId(frame_id));
        };
        let mut allocator = self.allocator.borrow_mut();
        for id in removed.object_ids() {
            let snapshot_id = removed.get(id).expect("object_ids yields present ids").snapshot_id();
            let count = self.snapshot_refs.entry(snapshot_id).or_insert(0);
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.snapshot_refs.remove(&snapshot_id);
                allocator.release_reservation(snapshot_id.raw());
            }
        }
        log::debug!("removed frame {frame_id} from memory");
        Ok(())
    }

    /// Every stable frame ID currently held, in ID order.
    pub fn stable_frame_ids(&self) -> Vec<FrameId> {
        self.stable_frames.ids()
    }

    /// Reserves a specific raw object ID with the shared allocator (§4.1,
    /// §6.3 loader contract step (a)).
    pub fn reserve_object_id(&mut self, id: crate::id::ObjectId) {
        self.allocator.borrow_mut().reserve_raw(id.raw());
    }

    /// See [`Memory::reserve_object_id`].
    pub fn reserve_snapshot_id(&mut self, id: crate::id::SnapshotId) {
        self.allocator.borrow_mut().reserve_raw(id.raw());
    }

    /// See [`Memory::reserve_object_id`].
    pub fn reserve_frame_id(&mut self, id: FrameId) {
        self.allocator.borrow_mut().reserve_raw(id.raw());
    }

    /// Starts a transient frame under a specific, already-reserved frame
    /// ID (a loader building frames with IDs taken from a raw design,
    /// rather than freshly allocating them).
    pub fn create_frame_with_id(&mut self, frame_id: FrameId, parent: Option<FrameId>) -> FrameId {
        let frame = match parent {
            Some(parent_id) => {
                let parent = self
                    .stable_frames
                    .get(&parent_id)
                    .unwrap_or_else(|| panic!("unknown frame {parent_id}"));
                TransientFrame::derive(frame_id, Rc::clone(&self.allocator), parent)
            }
            None => TransientFrame::new(frame_id, Rc::clone(&self.allocator)),
        };
        self.open_frames.insert(frame_id, frame);
        frame_id
    }

    /// Sets the history lists directly, for a loader restoring a raw
    /// design's named system references (§6.3 step (d)). Every ID named
    /// must already be a known stable frame; returns the first one that
    /// is not.
    pub fn restore_history(
        &mut self,
        current: FrameId,
        undo: &[FrameId],
        redo: &[FrameId],
    ) -> Result<(), FrameId> {
        for id in core::iter::once(current).chain(undo.iter().copied()).chain(redo.iter().copied()) {
            if self.stable_frames.get(&id).is_none() {
                return Err(id);
            }
        }
        self.current_frame = Some(current);
        self.undo_list = undo.to_vec();
        self.redo_list = redo.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::SimpleObjectType;
    use crate::structure::{Structure, StructuralKind};
    use alloc::sync::Arc;
    use indexmap::IndexMap as Map;

    fn node_type() -> Arc<dyn crate::metamodel::ObjectType + Send + Sync> {
        Arc::new(SimpleObjectType::new("Node", StructuralKind::Node, Vec::new()))
    }

    #[test]
    fn accept_then_undo_then_redo_round_trips_current_frame() {
        let mut memory = Memory::new();

        let f1 = memory.create_frame();
        let a = memory
            .transient_frame_mut(f1)
            .unwrap()
            .create(node_type(), Structure::Node, Map::new(), None, None);
        memory.accept(f1).unwrap();
        assert!(memory.current_frame().unwrap().contains(a));

        let f2 = memory.derive_frame(Some(f1));
        let b = memory
            .transient_frame_mut(f2)
            .unwrap()
            .create(node_type(), Structure::Node, Map::new(), None, None);
        memory.accept(f2).unwrap();
        assert!(memory.current_frame().unwrap().contains(a));
        assert!(memory.current_frame().unwrap().contains(b));

        memory.undo().unwrap();
        assert_eq!(memory.current_frame_id(), Some(f1));
        assert!(memory.current_frame().unwrap().contains(a));
        assert!(!memory.current_frame().unwrap().contains(b));

        memory.redo().unwrap();
        assert_eq!(memory.current_frame_id(), Some(f2));
        assert!(memory.current_frame().unwrap().contains(b));
    }

    #[test]
    fn reject_all_constraint_blocks_acceptance_and_leaves_frame_open() {
        use crate::constraint::{Constraint, Predicate, Requirement};

        let mut memory = Memory::new();
        memory.add_constraint(Constraint {
            name: "no nodes allowed".into(),
            description: None,
            match_predicate: Predicate::Any,
            requirement: Requirement::RejectAll,
        });

        let f1 = memory.create_frame();
        let frame = memory.transient_frame_mut(f1).unwrap();
        let a = frame.create(node_type(), Structure::Node, Map::new(), None, None);
        let b = frame.create(node_type(), Structure::Node, Map::new(), None, None);

        let error = memory.accept(f1).unwrap_err();
        assert_eq!(error.violations.len(), 1);
        let mut objects = error.violations[0].objects.clone();
        objects.sort();
        let mut expected = [a, b];
        expected.sort();
        assert_eq!(objects, expected);
        assert!(memory.transient_frame(f1).is_some());
        assert!(memory.current_frame().is_none());
    }

    #[test]
    fn undo_with_empty_history_is_an_error() {
        let mut memory = Memory::new();
        assert_eq!(memory.undo(), Err(HistoryError::NothingToUndo));
    }

    #[test]
    fn discarding_a_frame_releases_its_reserved_owned_ids() {
        let object_id = crate::id::ObjectId::from_raw(200);
        let snapshot_id = SnapshotId::from_raw(201);

        let mut memory = Memory::new();
        memory.reserve_object_id(object_id);
        memory.reserve_snapshot_id(snapshot_id);

        let f1 = memory.create_frame();
        memory.transient_frame_mut(f1).unwrap().create(
            node_type(),
            Structure::Node,
            Map::new(),
            Some(object_id),
            Some(snapshot_id),
        );
        memory.discard(f1);

        // Released reservations can be taken up again without panicking.
        memory.reserve_object_id(object_id);
        memory.reserve_snapshot_id(snapshot_id);
    }

    #[test]
    fn remove_frame_releases_a_snapshot_reservation_once_unreferenced() {
        let object_id = crate::id::ObjectId::from_raw(200);
        let snapshot_id = SnapshotId::from_raw(201);

        let mut memory = Memory::new();
        memory.reserve_object_id(object_id);
        memory.reserve_snapshot_id(snapshot_id);

        let f0 = memory.create_frame();
        memory.accept(f0).unwrap();

        let f1 = memory.derive_frame(Some(f0));
        memory.transient_frame_mut(f1).unwrap().create(
            node_type(),
            Structure::Node,
            Map::new(),
            Some(object_id),
            Some(snapshot_id),
        );
        memory.accept(f1).unwrap();

        let f2 = memory.create_frame();
        memory.accept(f2).unwrap();

        memory.undo().unwrap(); // current = f1, redo = [f2]
        memory.undo().unwrap(); // current = f0, redo = [f2, f1]

        let f3 = memory.create_frame();
        memory.accept(f3).unwrap(); // clears redo, orphaning f1

        memory.remove_frame(f1).unwrap();

        // f1 was the only frame ever holding this snapshot version, so
        // removing it dropped the refcount to zero and released the
        // snapshot reservation: taking it up again must not panic. The
        // object ID's own reservation is untouched by frame removal (an
        // object ID stays reserved for as long as any version of it was
        // ever accepted, not just its most recent one).
        memory.reserve_snapshot_id(snapshot_id);
    }
}
