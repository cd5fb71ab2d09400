//! Design loader contract (§6.3): a thin, generic orchestration layer
//! over [`crate::memory::Memory`] and [`crate::foreign::ForeignRecord`].
//! No concrete file-format reader lives here — that is explicitly out of
//! scope (persistence formats, per §1).

use alloc::string::String;
use alloc::vec::Vec;

use crate::foreign::{ForeignRecord, ForeignRecordError};
use crate::frame::TransientFrame;
use crate::id::{FrameId, ObjectId};
use crate::memory::Memory;
use crate::metamodel::Metamodel;

/// Why loading a raw design failed.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderError {
    /// A record carried no `type` key at all (distinct from a `type` key
    /// whose value did not resolve — see
    /// [`LoaderError::UnknownObjectType`]).
    MissingObjectType,
    /// A record's `type` did not resolve through the metamodel.
    UnknownObjectType(String),
    /// A record's `structure` key was not a recognized structural kind.
    InvalidStructuralType,
    /// A frame referenced an object ID no record in the design declared.
    UnknownObjectID(ObjectId),
    /// The raw design named no `current_frame`.
    MissingCurrentFrame,
    /// A named frame reference (`current_frame`, an `undo`/`redo` list
    /// entry) did not match any frame built from the design.
    UnknownFrameID(FrameId),
    /// A record could not be decoded at all.
    Record(ForeignRecordError),
    /// A frame built from the design failed acceptance — the design was
    /// not actually produced by a valid memory, or was hand-edited into
    /// an inconsistent state.
    InvalidFrame(FrameId),
}

impl core::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LoaderError::MissingObjectType => f.write_str("record has no type key"),
            LoaderError::UnknownObjectType(name) => write!(f, "unknown object type {name:?}"),
            LoaderError::InvalidStructuralType => f.write_str("invalid structural type"),
            LoaderError::UnknownObjectID(id) => write!(f, "unknown object id {id}"),
            LoaderError::MissingCurrentFrame => f.write_str("raw design names no current frame"),
            LoaderError::UnknownFrameID(id) => write!(f, "unknown frame id {id}"),
            LoaderError::Record(e) => write!(f, "{e}"),
            LoaderError::InvalidFrame(id) => write!(f, "frame {id} failed acceptance"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LoaderError {}

impl From<ForeignRecordError> for LoaderError {
    fn from(e: ForeignRecordError) -> Self {
        match e {
            ForeignRecordError::MissingKey("type") => LoaderError::MissingObjectType,
            ForeignRecordError::UnknownObjectType(name) => LoaderError::UnknownObjectType(name),
            ForeignRecordError::UnknownStructure(_) => LoaderError::InvalidStructuralType,
            other => LoaderError::Record(other),
        }
    }
}

/// One frame's worth of raw records plus the object IDs it should end up
/// containing, as a loader's source format would present it before any
/// IDs have been reserved or any snapshot built.
pub struct RawFrame {
    /// This frame's proposed ID (reserved before any snapshot is built).
    pub frame_id: FrameId,
    /// The frame this one derives from, if any.
    pub parent: Option<FrameId>,
    /// Every record present in this frame.
    pub records: Vec<ForeignRecord>,
}

/// A raw design: every frame plus the named system references §6.3
/// requires (`current_frame`, `undo`, `redo`).
pub struct RawDesign {
    /// Every frame in the design, in no particular order — `parent`
    /// links determine derivation, not list position.
    pub frames: Vec<RawFrame>,
    /// The frame that should become current once loading finishes.
    pub current_frame: Option<FrameId>,
    /// Frame IDs that should populate the undo list, oldest first.
    pub undo: Vec<FrameId>,
    /// Frame IDs that should populate the redo list, nearest first.
    pub redo: Vec<FrameId>,
}

/// Loads a [`RawDesign`] into a [`Memory`], following the order §6.3
/// mandates: reserve every ID first, then build snapshots, then build
/// frames, then accept them (restoring stable history), then set the
/// named system references. Each frame is accepted in isolation — a
/// design produced by a working memory is assumed to already satisfy
/// every constraint, so no constraint re-checking surprises the loader.
pub trait DesignLoader {
    /// Loads `design` into `memory`, returning the frame IDs that ended
    /// up accepted, in the same order as `design.frames`.
    fn load(
        &self,
        design: &RawDesign,
        memory: &mut Memory,
        metamodel: &dyn Metamodel,
    ) -> Result<Vec<FrameId>, LoaderError>;
}

/// The reference [`DesignLoader`]: reserves every declared ID up front,
/// then builds and accepts frames in the order given (callers are
/// responsible for listing a frame after its parent).
pub struct SequentialLoader;

impl DesignLoader for SequentialLoader {
    fn load(
        &self,
        design: &RawDesign,
        memory: &mut Memory,
        metamodel: &dyn Metamodel,
    ) -> Result<Vec<FrameId>, LoaderError> {
        for raw in &design.frames {
            memory.reserve_frame_id(raw.frame_id);
            for record in &raw.records {
                reserve_record_ids(memory, record)?;
            }
        }

        let mut accepted = Vec::with_capacity(design.frames.len());
        for raw in &design.frames {
            let frame_id = memory.create_frame_with_id(raw.frame_id, raw.parent);
            {
                let frame = memory
                    .transient_frame_mut(frame_id)
                    .expect("just created this frame");
                for record in &raw.records {
                    insert_record(frame, record, metamodel)?;
                }
            }
            memory
                .accept(frame_id)
                .map_err(|_| LoaderError::InvalidFrame(frame_id))?;
            accepted.push(frame_id);
        }

        let current = design.current_frame.ok_or(LoaderError::MissingCurrentFrame)?;
        memory
            .restore_history(current, &design.undo, &design.redo)
            .map_err(|id| LoaderError::UnknownFrameID(id))?;

        Ok(accepted)
    }
}

fn reserve_record_ids(memory: &mut Memory, record: &ForeignRecord) -> Result<(), LoaderError> {
    let object_id = record
        .get("object_id")
        .and_then(|v| v.int_value().ok())
        .ok_or(LoaderError::Record(ForeignRecordError::MissingKey("object_id")))?;
    let snapshot_id = record
        .get("snapshot_id")
        .and_then(|v| v.int_value().ok())
        .ok_or(LoaderError::Record(ForeignRecordError::MissingKey("snapshot_id")))?;
    memory.reserve_object_id(ObjectId::from_raw(object_id as u64));
    memory.reserve_snapshot_id(crate::id::SnapshotId::from_raw(snapshot_id as u64));
    Ok(())
}

fn insert_record(
    frame: &mut TransientFrame,
    record: &ForeignRecord,
    metamodel: &dyn Metamodel,
) -> Result<(), LoaderError> {
    let snapshot = crate::foreign::from_record(record, metamodel)?;
    frame.insert_unsafe(snapshot, true);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FrameView;
    use crate::metamodel::SimpleObjectType;
    use crate::structure::StructuralKind;
    use alloc::sync::Arc;
    use alloc::vec;

    struct OneType(Arc<dyn crate::metamodel::ObjectType + Send + Sync>);

    impl Metamodel for OneType {
        fn object_type(&self, name: &str) -> Option<Arc<dyn crate::metamodel::ObjectType + Send + Sync>> {
            if name == self.0.name() {
                Some(Arc::clone(&self.0))
            } else {
                None
            }
        }
    }

    fn node_type() -> Arc<dyn crate::metamodel::ObjectType + Send + Sync> {
        Arc::new(SimpleObjectType::new("Node", StructuralKind::Node, Vec::new()))
    }

    #[test]
    fn loads_a_single_frame_and_sets_current() {
        let mut record = ForeignRecord::new();
        record.insert("object_id", chronicle_value::Variant::int(1));
        record.insert("snapshot_id", chronicle_value::Variant::int(1));
        record.insert("type", chronicle_value::Variant::string("Node"));
        record.insert("structure", chronicle_value::Variant::string("node"));

        let design = RawDesign {
            frames: vec![RawFrame {
                frame_id: FrameId::from_raw(0),
                parent: None,
                records: vec![record],
            }],
            current_frame: Some(FrameId::from_raw(0)),
            undo: Vec::new(),
            redo: Vec::new(),
        };

        let mut memory = Memory::new();
        let metamodel = OneType(node_type());
        let loader = SequentialLoader;
        let accepted = loader.load(&design, &mut memory, &metamodel).unwrap();

        assert_eq!(accepted, vec![FrameId::from_raw(0)]);
        assert_eq!(memory.current_frame_id(), Some(FrameId::from_raw(0)));
        assert!(memory.current_frame().unwrap().contains(ObjectId::from_raw(1)));
    }
}
