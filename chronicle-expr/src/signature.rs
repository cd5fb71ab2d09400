//! Function signatures: the shape a [`crate::function::Function`] checks
//! call sites against.

use alloc::string::String;
use alloc::vec::Vec;

use chronicle_value::{is_convertible, AtomType, ValueType};

/// The type constraint on a single function argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentType {
    /// Any value type is accepted.
    Any,
    /// Exactly one atom type is accepted (after conversion).
    Concrete(AtomType),
    /// Any of a set of atom types is accepted.
    Union(Vec<AtomType>),
}

impl ArgumentType {
    fn accepts(&self, value: ValueType) -> bool {
        let ValueType::Atom(given) = value else {
            // Arrays are never implicitly convertible to a scalar argument slot;
            // a function wanting an array declares it through its own contract,
            // outside the scalar ArgumentType algebra.
            return false;
        };
        match self {
            ArgumentType::Any => true,
            ArgumentType::Concrete(expected) => is_convertible(given, *expected),
            ArgumentType::Union(options) => options.iter().any(|t| is_convertible(given, *t)),
        }
    }
}

impl core::fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ArgumentType::Any => f.write_str("any"),
            ArgumentType::Concrete(t) => write!(f, "{t}"),
            ArgumentType::Union(ts) => {
                f.write_str("one of [")?;
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{t}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// One positional or variadic argument slot in a [`Signature`].
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionArgument {
    /// Argument name, used in diagnostics only.
    pub name: String,
    /// The accepted type(s).
    pub ty: ArgumentType,
    /// Whether the argument must be a literal/constant at bind time.
    /// Reserved for callers with that requirement; `chronicle-expr` itself
    /// does not enforce it (no call site in this crate needs compile-time
    /// constants), but the field is part of the documented signature shape.
    pub is_constant: bool,
}

impl FunctionArgument {
    /// Builds a required, non-constant argument of the given type.
    pub fn new(name: impl Into<String>, ty: ArgumentType) -> Self {
        FunctionArgument {
            name: name.into(),
            ty,
            is_constant: false,
        }
    }
}

/// A function's callable shape: positional arguments, an optional variadic
/// tail, and a return type.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Required positional arguments, in order.
    pub positional: Vec<FunctionArgument>,
    /// The type every argument past `positional` must satisfy, if the
    /// function is variadic.
    pub variadic: Option<FunctionArgument>,
    /// The type the function call evaluates to.
    pub returns: ValueType,
}

/// Why a call site did not match a [`Signature`].
#[derive(Debug, Clone, PartialEq)]
pub enum SignatureError {
    /// Too few or too many arguments were given.
    InvalidNumberOfArguments {
        /// Number of arguments actually given.
        given: usize,
        /// Minimum number of arguments required.
        min_required: usize,
    },
    /// One or more arguments did not match their declared type.
    TypeMismatch(Vec<usize>),
}

impl Signature {
    /// Checks a call's argument types against this signature. Returns the
    /// 0-based indices of mismatched arguments, or the arity error, in
    /// accordance with §4.6 of the expression language's binding rules.
    pub fn validate(&self, argtypes: &[ValueType]) -> Result<(), SignatureError> {
        let min_required = self.positional.len() + usize::from(self.variadic.is_some());
        match &self.variadic {
            None if argtypes.len() != self.positional.len() => {
                return Err(SignatureError::InvalidNumberOfArguments {
                    given: argtypes.len(),
                    min_required: self.positional.len(),
                });
            }
            Some(_) if argtypes.len() < min_required => {
                return Err(SignatureError::InvalidNumberOfArguments {
                    given: argtypes.len(),
                    min_required,
                });
            }
            _ => {}
        }

        let mut mismatches = Vec::new();
        for (i, arg_ty) in argtypes.iter().enumerate() {
            let slot = self
                .positional
                .get(i)
                .or(self.variadic.as_ref())
                .expect("arity already checked above");
            if !slot.ty.accepts(*arg_ty) {
                mismatches.push(i);
            }
        }
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(SignatureError::TypeMismatch(mismatches))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_signature() -> Signature {
        Signature {
            positional: alloc::vec![
                FunctionArgument::new("a", ArgumentType::Concrete(AtomType::Double)),
                FunctionArgument::new("b", ArgumentType::Concrete(AtomType::Double)),
            ],
            variadic: None,
            returns: ValueType::Atom(AtomType::Double),
        }
    }

    #[test]
    fn arity_mismatch() {
        let sig = add_signature();
        assert_eq!(
            sig.validate(&[ValueType::Atom(AtomType::Double)]),
            Err(SignatureError::InvalidNumberOfArguments {
                given: 1,
                min_required: 2
            })
        );
    }

    #[test]
    fn type_mismatch_reports_index() {
        let sig = add_signature();
        let err = sig
            .validate(&[
                ValueType::Atom(AtomType::Double),
                ValueType::Atom(AtomType::Point),
            ])
            .unwrap_err();
        assert_eq!(err, SignatureError::TypeMismatch(alloc::vec![1]));
    }

    #[test]
    fn convertible_types_pass() {
        let sig = add_signature();
        // int is convertible to double.
        assert!(sig
            .validate(&[ValueType::Atom(AtomType::Int), ValueType::Atom(AtomType::Int)])
            .is_ok());
    }

    #[test]
    fn variadic_requires_at_least_one_trailing_argument() {
        let sig = Signature {
            positional: Vec::new(),
            variadic: Some(FunctionArgument::new(
                "items",
                ArgumentType::Concrete(AtomType::String),
            )),
            returns: ValueType::Atom(AtomType::String),
        };
        assert_eq!(
            sig.validate(&[]),
            Err(SignatureError::InvalidNumberOfArguments {
                given: 0,
                min_required: 1
            })
        );
        assert!(sig
            .validate(&[ValueType::Atom(AtomType::String), ValueType::Atom(AtomType::String)])
            .is_ok());
    }
}
