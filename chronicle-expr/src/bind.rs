//! Binding: resolving an unbound [`Expr`]'s variable and function names
//! against a concrete context, producing a typed [`BoundExpr`].

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use chronicle_value::{Variant, ValueType};

use crate::ast::Expr;
use crate::function::{Function, FunctionRegistry};
use crate::signature::SignatureError;
use crate::variable::VariableReference;

/// Supplies the variables a binder may reference by name.
///
/// Implemented by whatever owns the variable namespace for a given bind
/// call (in the full system, the object memory for a frame); kept as a
/// trait here so `chronicle-expr` has no dependency on `chronicle-core`.
pub trait VariableResolver {
    /// Resolves a bare identifier to a variable reference and its type.
    fn resolve(&self, name: &str) -> Option<(VariableReference, ValueType)>;

    /// All names known to this resolver, for "did you mean" suggestions.
    /// The default implementation offers no suggestions.
    fn names(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// Reserved function names the six arithmetic and six comparison operators
/// bind to. A catalog missing one of these is a programming error (the
/// function catalog, not a malformed expression, is at fault).
pub fn reserved_operator_name(op: &str, arity: Arity) -> &'static str {
    match (op, arity) {
        ("+", Arity::Binary) => "__add__",
        ("-", Arity::Binary) => "__sub__",
        ("*", Arity::Binary) => "__mul__",
        ("/", Arity::Binary) => "__div__",
        ("%", Arity::Binary) => "__mod__",
        ("-", Arity::Unary) => "__neg__",
        ("==", Arity::Binary) => "__eq__",
        ("!=", Arity::Binary) => "__ne__",
        ("<", Arity::Binary) => "__lt__",
        ("<=", Arity::Binary) => "__le__",
        (">", Arity::Binary) => "__gt__",
        (">=", Arity::Binary) => "__ge__",
        _ => panic!("unrecognized operator {op} (arity {arity:?}) reached binding"),
    }
}

/// Whether an operator occurrence is unary or binary; only relevant for
/// `-`, which is both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// One operand.
    Unary,
    /// Two operands.
    Binary,
}

/// A typed expression tree whose variable and function references have
/// been resolved against a context. Borrows the [`FunctionRegistry`] it
/// was bound against, the way a `facet-solver` `Resolution` borrows its
/// originating `Schema`.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpr<'f> {
    /// A literal value.
    Value(Variant),
    /// A resolved variable reference.
    Variable(VariableReference, ValueType),
    /// A unary operator application.
    Unary(BoundCall<'f>, Box<BoundExpr<'f>>),
    /// A binary operator application.
    Binary(BoundCall<'f>, Box<BoundExpr<'f>>, Box<BoundExpr<'f>>),
    /// A function call.
    Function(BoundCall<'f>, Vec<BoundExpr<'f>>),
}

/// A resolved function reference together with the result type the binder
/// computed for this call site.
#[derive(Clone, Copy)]
pub struct BoundCall<'f> {
    pub(crate) name: &'f str,
    pub(crate) function: &'f (dyn Function + Send + Sync),
}

impl fmt::Debug for BoundCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundCall").field("name", &self.name).finish()
    }
}

impl PartialEq for BoundCall<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<'f> BoundExpr<'f> {
    /// This node's computed result type.
    pub fn result_type(&self) -> ValueType {
        match self {
            BoundExpr::Value(v) => v.value_type(),
            BoundExpr::Variable(_, ty) => *ty,
            BoundExpr::Unary(call, _) | BoundExpr::Binary(call, _, _) | BoundExpr::Function(call, _) => {
                call.function.signature().returns
            }
        }
    }
}

/// Why binding an [`Expr`] failed.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// No variable by this name was found.
    UnknownVariable {
        /// The offending name.
        name: String,
        /// A suggested alternative, if a close match was found.
        suggestion: Option<String>,
    },
    /// No function by this name was found.
    UnknownFunction {
        /// The offending name.
        name: String,
        /// A suggested alternative, if a close match was found.
        suggestion: Option<String>,
    },
    /// A call's argument count didn't fit the function's signature.
    InvalidNumberOfArguments {
        /// Number of arguments given at the call site.
        given: usize,
        /// Minimum number of arguments the signature requires.
        min_required: usize,
    },
    /// A call's argument at `index` had a type the signature rejects.
    ArgumentTypeMismatch {
        /// The offending argument's 0-based index.
        index: usize,
        /// A human-readable description of the expected type.
        expected_type_description: String,
    },
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionError::UnknownVariable { name, suggestion } => {
                write!(f, "unknown variable {name:?}")?;
                if let Some(s) = suggestion {
                    write!(f, ", did you mean {s:?}?")?;
                }
                Ok(())
            }
            ExpressionError::UnknownFunction { name, suggestion } => {
                write!(f, "unknown function {name:?}")?;
                if let Some(s) = suggestion {
                    write!(f, ", did you mean {s:?}?")?;
                }
                Ok(())
            }
            ExpressionError::InvalidNumberOfArguments { given, min_required } => {
                write!(f, "expected at least {min_required} argument(s), got {given}")
            }
            ExpressionError::ArgumentTypeMismatch {
                index,
                expected_type_description,
            } => write!(f, "argument {index}: expected {expected_type_description}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ExpressionError {}

/// Binds an unbound [`Expr`] against a variable resolver and function
/// catalog, producing a [`BoundExpr`] with a computed result type at every
/// node.
pub fn bind<'f>(
    expr: &Expr,
    variables: &dyn VariableResolver,
    functions: &'f FunctionRegistry,
) -> Result<BoundExpr<'f>, ExpressionError> {
    match expr {
        Expr::Value(v) => Ok(BoundExpr::Value(v.clone())),
        Expr::Variable(name) => {
            let (reference, ty) = variables.resolve(name).ok_or_else(|| {
                ExpressionError::UnknownVariable {
                    name: name.clone(),
                    suggestion: suggest(name, variables.names().into_iter()),
                }
            })?;
            Ok(BoundExpr::Variable(reference, ty))
        }
        Expr::Unary(op, operand) => {
            let operand = bind(operand, variables, functions)?;
            let call = resolve_operator(op, Arity::Unary, functions)?;
            check_call(&call, &[operand.result_type()])?;
            Ok(BoundExpr::Unary(call, Box::new(operand)))
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = bind(lhs, variables, functions)?;
            let rhs = bind(rhs, variables, functions)?;
            let call = resolve_operator(op, Arity::Binary, functions)?;
            check_call(&call, &[lhs.result_type(), rhs.result_type()])?;
            Ok(BoundExpr::Binary(call, Box::new(lhs), Box::new(rhs)))
        }
        Expr::Function(name, args) => {
            let bound_args = args
                .iter()
                .map(|a| bind(a, variables, functions))
                .collect::<Result<Vec<_>, _>>()?;
            let (canonical_name, function) = functions.get_with_name(name).ok_or_else(|| ExpressionError::UnknownFunction {
                name: name.clone(),
                suggestion: suggest(name, functions.names()),
            })?;
            let call = BoundCall { name: canonical_name, function };
            let argtypes: Vec<ValueType> = bound_args.iter().map(|a| a.result_type()).collect();
            check_call(&call, &argtypes)?;
            Ok(BoundExpr::Function(call, bound_args))
        }
    }
}

fn resolve_operator<'f>(
    op: &str,
    arity: Arity,
    functions: &'f FunctionRegistry,
) -> Result<BoundCall<'f>, ExpressionError> {
    let name = reserved_operator_name(op, arity);
    let function = functions
        .get(name)
        .unwrap_or_else(|| panic!("function catalog is missing reserved operator {name:?}"));
    Ok(BoundCall { name, function })
}

fn check_call(call: &BoundCall<'_>, argtypes: &[ValueType]) -> Result<(), ExpressionError> {
    call.function
        .signature()
        .validate(argtypes)
        .map_err(|e| match e {
            SignatureError::InvalidNumberOfArguments { given, min_required } => {
                ExpressionError::InvalidNumberOfArguments { given, min_required }
            }
            SignatureError::TypeMismatch(indices) => {
                let sig = call.function.signature();
                let index = indices[0];
                let expected = sig
                    .positional
                    .get(index)
                    .or(sig.variadic.as_ref())
                    .map(|a| format!("{}", a.ty))
                    .unwrap_or_else(|| "<unknown>".into());
                ExpressionError::ArgumentTypeMismatch {
                    index,
                    expected_type_description: expected,
                }
            }
        })
}

fn suggest<'a>(name: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    suggest_impl(name, candidates)
}

#[cfg(feature = "suggestions")]
fn suggest_impl<'a>(name: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    candidates
        .map(|c| (c, strsim::jaro_winkler(name, c)))
        .filter(|(_, score)| *score > 0.85)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(c, _)| String::from(c))
}

#[cfg(not(feature = "suggestions"))]
fn suggest_impl<'a>(_name: &str, _candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    None
}
