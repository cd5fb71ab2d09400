use alloc::string::String;
use core::fmt;

use crate::atom::AtomType;

/// Whether a value of atom type `from` can be converted to atom type `to`,
/// per the conversion matrix in the type system's data model.
///
/// This is the matrix consulted by signature type-checking and by
/// attribute setters; it is not the same question as "will this particular
/// value coerce at runtime" — [`Atom`](crate::Atom)'s coercion methods
/// (`int_value`, `double_value`, ...) can still fail on a convertible pair
/// (e.g. `string -> int` fails for a non-numeric string) even though
/// `is_convertible` says the pair is allowed.
pub const fn is_convertible(from: AtomType, to: AtomType) -> bool {
    use AtomType::*;
    match (from, to) {
        (Bool, Bool) | (Bool, String) => true,
        (Int, Int) | (Int, Double) | (Int, String) => true,
        (Double, Int) | (Double, Double) | (Double, String) => true,
        (String, Bool) | (String, Int) | (String, Double) | (String, String) => true,
        (Point, Point) => true,
        _ => false,
    }
}

/// Errors raised by [`crate::Variant`]'s runtime coercion methods.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueError {
    /// `from` and `to` are not related by the conversion matrix at all.
    NotConvertible {
        /// Source atom type.
        from: AtomType,
        /// Requested atom type.
        to: AtomType,
    },
    /// `from` and `to` are convertible in principle, but this particular
    /// value failed to convert (e.g. a non-numeric string to `int`).
    ConversionFailed {
        /// Source atom type.
        from: AtomType,
        /// Requested atom type.
        to: AtomType,
    },
    /// A string other than `"true"`/`"false"` was coerced to `bool`.
    InvalidBooleanValue(String),
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::NotConvertible { from, to } => {
                write!(f, "cannot convert {from} to {to}")
            }
            ValueError::ConversionFailed { from, to } => {
                write!(f, "failed to convert {from} value to {to}")
            }
            ValueError::InvalidBooleanValue(s) => {
                write!(f, "{s:?} is not a valid boolean (expected \"true\" or \"false\")")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ValueError {}

#[cfg(test)]
mod tests {
    use super::*;
    use AtomType::*;

    #[test]
    fn matrix_matches_spec_table() {
        assert!(is_convertible(Bool, Bool));
        assert!(is_convertible(Bool, String));
        assert!(!is_convertible(Bool, Int));
        assert!(!is_convertible(Bool, Double));
        assert!(!is_convertible(Bool, Point));

        assert!(is_convertible(Int, Int));
        assert!(is_convertible(Int, Double));
        assert!(is_convertible(Int, String));
        assert!(!is_convertible(Int, Bool));
        assert!(!is_convertible(Int, Point));

        assert!(is_convertible(String, Bool));
        assert!(is_convertible(String, Int));
        assert!(is_convertible(String, Double));
        assert!(is_convertible(String, String));
        assert!(!is_convertible(String, Point));

        assert!(is_convertible(Point, Point));
        assert!(!is_convertible(Point, Int));
        assert!(!is_convertible(Point, String));
    }
}
