#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

//! Tagged atomic/array value type shared by every object attribute in a
//! chronicle design.
//!
//! A [`Variant`] is either a single [`Atom`] or a homogeneous [`Array`] of
//! atoms of one [`AtomType`]. [`ValueType`] is the shape-only counterpart
//! (no payload) used for type checking and function signatures.

extern crate alloc;

mod atom;
mod convert;
mod point;
mod variant;

#[cfg(feature = "serde")]
pub mod json;

pub use atom::{Atom, AtomType};
pub use convert::{is_convertible, ValueError};
pub use point::Point;
pub use variant::{Array, Variant, ValueType};
