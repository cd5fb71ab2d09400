use alloc::string::String;
use alloc::vec::Vec;

use chronicle_value::Variant;

/// An unbound expression tree: variable and function references are plain
/// strings, not yet resolved against any context.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Value(Variant),
    /// A bare identifier, resolved to a variable during binding.
    Variable(String),
    /// A unary operator application, e.g. `-x`. `op` is the raw operator
    /// text (`"-"`); binding maps it to its reserved function name.
    Unary(String, Box<Expr>),
    /// A binary operator application, e.g. `x + y`.
    Binary(String, Box<Expr>, Box<Expr>),
    /// A function call, `name(args...)`.
    Function(String, Vec<Expr>),
}
