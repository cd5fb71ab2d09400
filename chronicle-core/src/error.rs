//! User/data and validation errors (§7 families 2 and 3). Programming
//! errors (§7 family 1 — unknown ID where one is required, double-accept,
//! etc.) are not modeled as a type; they panic, as the spec directs.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use chronicle_value::ValueType;

use crate::id::{FrameId, ObjectId};

/// Why a single attribute failed its type's schema (§3.3 invariant 4).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeError {
    /// A trait-required attribute is absent.
    MissingTraitAttribute {
        /// The missing attribute's name.
        attribute: String,
        /// The trait that requires it.
        trait_name: String,
    },
    /// An attribute is present but not convertible to its schema's type.
    TypeMismatch {
        /// The offending attribute's name.
        attribute: String,
        /// The type the schema requires.
        expected: ValueType,
    },
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::MissingTraitAttribute { attribute, trait_name } => {
                write!(f, "missing attribute {attribute:?} required by trait {trait_name:?}")
            }
            TypeError::TypeMismatch { attribute, expected } => {
                write!(f, "attribute {attribute:?} is not convertible to {expected}")
            }
        }
    }
}

/// A constraint whose `requirement` flagged one or more matched objects.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    /// The violated constraint's name.
    pub constraint: String,
    /// The objects the constraint's requirement rejected.
    pub objects: Vec<ObjectId>,
}

/// Why `Memory::accept` refused a frame (§7 family 3). The frame is
/// returned to the caller alongside this error, still open, for repair
/// and retry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameValidationError {
    /// Constraints whose requirement rejected at least one object.
    pub violations: Vec<ConstraintViolation>,
    /// Per-object schema failures.
    pub type_errors: BTreeMap<ObjectId, Vec<TypeError>>,
}

impl FrameValidationError {
    /// Whether this error carries any actual failure (an empty one is
    /// never constructed by `accept`, but callers assembling one
    /// incrementally can check).
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty() && self.type_errors.is_empty()
    }
}

impl fmt::Display for FrameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame validation failed: {} constraint violation(s), {} object(s) with type errors",
            self.violations.len(),
            self.type_errors.len()
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameValidationError {}

/// Why a history navigation operation (`undo`/`redo`/`remove_frame`)
/// could not complete. Modeled as a recoverable `Result` rather than a
/// panic even though a caller passing an unknown ID is, strictly, a
/// programming error — navigation is commonly driven by user-facing undo
/// buttons where a clean error beats a process abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    /// No frame by this ID is known to the memory's history.
    UnknownFrameId(FrameId),
    /// The requested target is not reachable by a single undo/redo step
    /// (e.g. `undo()` with nothing in the undo list).
    NothingToUndo,
    /// See [`HistoryError::NothingToUndo`], mirrored for redo.
    NothingToRedo,
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::UnknownFrameId(id) => write!(f, "unknown frame id {id}"),
            HistoryError::NothingToUndo => f.write_str("nothing to undo"),
            HistoryError::NothingToRedo => f.write_str("nothing to redo"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HistoryError {}
