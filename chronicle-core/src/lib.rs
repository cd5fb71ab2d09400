#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

//! Versioned, transactional object memory for a graph-structured design
//! model.
//!
//! A [`memory::Memory`] holds a history of [`frame::StableFrame`]s, each a
//! coherent snapshot of every object in the design at one point in time.
//! Changes happen inside a [`frame::TransientFrame`], which `Memory`
//! validates (referential integrity, per-type schema, registered
//! [`constraint::Constraint`]s) and either freezes into a new stable frame
//! or hands back open for repair. A [`graph::GraphView`] projects any
//! frame as nodes and edges; [`foreign::ForeignRecord`] and
//! [`loader::DesignLoader`] describe (without implementing) how a design
//! crosses the persistence boundary.

extern crate alloc;

pub mod constraint;
pub mod error;
pub mod foreign;
pub mod frame;
pub mod graph;
pub mod id;
pub mod loader;
pub mod memory;
pub mod metamodel;
pub mod snapshot;
pub mod structure;

pub use constraint::{Constraint, Endpoint, Predicate, Requirement};
pub use error::{ConstraintViolation, FrameValidationError, HistoryError, TypeError};
pub use foreign::{from_record, to_record, ForeignRecord, ForeignRecordError};
pub use frame::{FrameState, StableFrame, TransientFrame};
pub use graph::{Direction, FrameView, GraphView};
pub use id::{FrameId, IdAllocator, ObjectId, SnapshotId};
pub use loader::{DesignLoader, LoaderError, RawDesign, RawFrame, SequentialLoader};
pub use memory::Memory;
pub use metamodel::{AttributeSchema, Metamodel, ObjectType, SimpleObjectType, SimpleTrait, Trait};
pub use snapshot::{Snapshot, SnapshotState};
pub use structure::{Structure, StructuralKind};

#[cfg(feature = "serde")]
pub use foreign::{from_json, to_json};
