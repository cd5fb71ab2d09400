use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::atom::{Atom, AtomType};
use crate::convert::ValueError;
use crate::point::Point;

/// The shape of a [`Variant`] without its payload: either a single atom of
/// a given [`AtomType`], or a homogeneous array of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// A single atom.
    Atom(AtomType),
    /// A homogeneous array of atoms.
    Array(AtomType),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Atom(t) => write!(f, "{t}"),
            ValueType::Array(t) => write!(f, "{t}[]"),
        }
    }
}

/// A homogeneous ordered sequence of atoms of a single [`AtomType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    /// `int[]`
    Int(Vec<i64>),
    /// `double[]`
    Double(Vec<f64>),
    /// `bool[]`
    Bool(Vec<bool>),
    /// `string[]`
    String(Vec<String>),
    /// `point[]`
    Point(Vec<Point>),
}

impl Array {
    /// The element type of this array.
    pub const fn element_type(&self) -> AtomType {
        match self {
            Array::Int(_) => AtomType::Int,
            Array::Double(_) => AtomType::Double,
            Array::Bool(_) => AtomType::Bool,
            Array::String(_) => AtomType::String,
            Array::Point(_) => AtomType::Point,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Array::Int(v) => v.len(),
            Array::Double(v) => v.len(),
            Array::Bool(v) => v.len(),
            Array::String(v) => v.len(),
            Array::Point(v) => v.len(),
        }
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A value carried by an object attribute: either a single [`Atom`] or a
/// homogeneous [`Array`] of atoms.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    /// A single atomic value.
    Atom(Atom),
    /// A homogeneous array of atoms.
    Array(Array),
}

impl Variant {
    /// Builds an integer atom.
    pub const fn int(v: i64) -> Self {
        Variant::Atom(Atom::Int(v))
    }

    /// Builds a double atom.
    pub const fn double(v: f64) -> Self {
        Variant::Atom(Atom::Double(v))
    }

    /// Builds a boolean atom.
    pub const fn bool(v: bool) -> Self {
        Variant::Atom(Atom::Bool(v))
    }

    /// Builds a string atom.
    pub fn string(v: impl Into<String>) -> Self {
        Variant::Atom(Atom::String(v.into()))
    }

    /// Builds a point atom.
    pub const fn point(x: f64, y: f64) -> Self {
        Variant::Atom(Atom::Point(Point::new(x, y)))
    }

    /// This value's [`ValueType`].
    pub fn value_type(&self) -> ValueType {
        match self {
            Variant::Atom(a) => ValueType::Atom(a.atom_type()),
            Variant::Array(a) => ValueType::Array(a.element_type()),
        }
    }

    fn atom_for(&self, to: AtomType) -> Result<&Atom, ValueError> {
        match self {
            Variant::Atom(a) => Ok(a),
            Variant::Array(arr) => Err(ValueError::NotConvertible {
                from: arr.element_type(),
                to,
            }),
        }
    }

    /// Coerces this value to `int`, per the runtime coercion rules: strings
    /// parse by decimal rules, `bool` yields 0/1, `double` truncates.
    pub fn int_value(&self) -> Result<i64, ValueError> {
        let atom = self.atom_for(AtomType::Int)?;
        match atom {
            Atom::Int(v) => Ok(*v),
            Atom::Double(v) => Ok(*v as i64),
            Atom::Bool(v) => Ok(if *v { 1 } else { 0 }),
            Atom::String(s) => s.trim().parse::<i64>().map_err(|_| ValueError::ConversionFailed {
                from: AtomType::String,
                to: AtomType::Int,
            }),
            Atom::Point(_) => Err(ValueError::NotConvertible {
                from: AtomType::Point,
                to: AtomType::Int,
            }),
        }
    }

    /// Coerces this value to `double`. See [`Variant::int_value`] for the
    /// shared coercion rules.
    pub fn double_value(&self) -> Result<f64, ValueError> {
        let atom = self.atom_for(AtomType::Double)?;
        match atom {
            Atom::Int(v) => Ok(*v as f64),
            Atom::Double(v) => Ok(*v),
            Atom::Bool(_) => Err(ValueError::NotConvertible {
                from: AtomType::Bool,
                to: AtomType::Double,
            }),
            Atom::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ValueError::ConversionFailed {
                    from: AtomType::String,
                    to: AtomType::Double,
                }),
            Atom::Point(_) => Err(ValueError::NotConvertible {
                from: AtomType::Point,
                to: AtomType::Double,
            }),
        }
    }

    /// Coerces this value to `bool`. Only the strings `"true"`/`"false"`
    /// coerce; any other string is [`ValueError::InvalidBooleanValue`].
    pub fn bool_value(&self) -> Result<bool, ValueError> {
        let atom = self.atom_for(AtomType::Bool)?;
        match atom {
            Atom::Bool(v) => Ok(*v),
            Atom::String(s) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(ValueError::InvalidBooleanValue(s.to_string())),
            },
            Atom::Int(_) => Err(ValueError::NotConvertible {
                from: AtomType::Int,
                to: AtomType::Bool,
            }),
            Atom::Double(_) => Err(ValueError::NotConvertible {
                from: AtomType::Double,
                to: AtomType::Bool,
            }),
            Atom::Point(_) => Err(ValueError::NotConvertible {
                from: AtomType::Point,
                to: AtomType::Bool,
            }),
        }
    }

    /// Coerces this value to `string`, using the same textual form the
    /// [`fmt::Display`] impl produces for atoms. `point` is not
    /// convertible to `string` per the conversion matrix, even though
    /// `Point` itself implements `Display`.
    pub fn string_value(&self) -> Result<String, ValueError> {
        let atom = self.atom_for(AtomType::String)?;
        match atom {
            Atom::Point(_) => Err(ValueError::NotConvertible {
                from: AtomType::Point,
                to: AtomType::String,
            }),
            _ => Ok(atom.to_string()),
        }
    }

    /// Coerces this value to `point`. A two-element array of numeric atoms
    /// coerces to a point; any other shape is
    /// [`ValueError::NotConvertible`].
    pub fn point_value(&self) -> Result<Point, ValueError> {
        match self {
            Variant::Atom(Atom::Point(p)) => Ok(*p),
            Variant::Array(Array::Int(v)) if v.len() == 2 => {
                Ok(Point::new(v[0] as f64, v[1] as f64))
            }
            Variant::Array(Array::Double(v)) if v.len() == 2 => Ok(Point::new(v[0], v[1])),
            Variant::Atom(a) => Err(ValueError::NotConvertible {
                from: a.atom_type(),
                to: AtomType::Point,
            }),
            Variant::Array(arr) => Err(ValueError::NotConvertible {
                from: arr.element_type(),
                to: AtomType::Point,
            }),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Atom(a) => write!(f, "{a}"),
            Variant::Array(arr) => {
                f.write_str("[")?;
                macro_rules! join {
                    ($v:expr) => {{
                        for (i, item) in $v.iter().enumerate() {
                            if i > 0 {
                                f.write_str(",")?;
                            }
                            write!(f, "{item}")?;
                        }
                    }};
                }
                match arr {
                    Array::Int(v) => join!(v),
                    Array::Double(v) => join!(v),
                    Array::Bool(v) => join!(v),
                    Array::String(v) => join!(v),
                    Array::Point(v) => join!(v),
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_int_round_trip() {
        assert_eq!(Variant::string("10").int_value().unwrap(), 10);
    }

    #[test]
    fn string_double_round_trip() {
        assert_eq!(Variant::string("10").double_value().unwrap(), 10.0);
    }

    #[test]
    fn fractional_string_to_int_fails() {
        let err = Variant::string("1.5").int_value().unwrap_err();
        assert_eq!(
            err,
            ValueError::ConversionFailed {
                from: AtomType::String,
                to: AtomType::Int
            }
        );
    }

    #[test]
    fn two_element_int_array_is_a_point() {
        let v = Variant::Array(Array::Int(alloc::vec![1, 2]));
        assert_eq!(v.point_value().unwrap(), Point::new(1.0, 2.0));
    }

    #[test]
    fn int_to_point_is_not_convertible() {
        let err = Variant::int(10).point_value().unwrap_err();
        assert_eq!(
            err,
            ValueError::NotConvertible {
                from: AtomType::Int,
                to: AtomType::Point
            }
        );
    }

    #[test]
    fn only_true_false_strings_coerce_to_bool() {
        assert!(Variant::string("true").bool_value().unwrap());
        assert!(!Variant::string("false").bool_value().unwrap());
        assert!(Variant::string("yes").bool_value().is_err());
    }

    #[test]
    fn bool_to_int_is_zero_or_one() {
        assert_eq!(Variant::bool(true).int_value().unwrap(), 1);
        assert_eq!(Variant::bool(false).int_value().unwrap(), 0);
    }

    #[test]
    fn double_to_int_truncates() {
        assert_eq!(Variant::double(3.9).int_value().unwrap(), 3);
        assert_eq!(Variant::double(-3.9).int_value().unwrap(), -3);
    }
}
