//! Callable functions: the things a bound expression's `Unary`/`Binary`/
//! `Function` nodes invoke.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt;

use chronicle_value::{Variant, ValueError};

use crate::signature::Signature;

/// A function's argument didn't just fail the signature check (that's
/// caught at bind time) — its *value*, at call time, was invalid for this
/// particular body (e.g. division by zero).
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionError {
    /// The argument at `index` failed to coerce/compute.
    InvalidArgument(usize, ValueError),
    /// The function received the wrong number of evaluated arguments. This
    /// is a defensive check only — the binder already validated arity
    /// against the signature, so this indicates an internal inconsistency.
    InvalidNumberOfArguments(usize),
    /// A runtime-only condition the signature can't express (e.g. division
    /// by zero).
    DomainError(String),
}

impl fmt::Display for FunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionError::InvalidArgument(i, e) => write!(f, "argument {i}: {e}"),
            FunctionError::InvalidNumberOfArguments(n) => {
                write!(f, "wrong number of arguments: {n}")
            }
            FunctionError::DomainError(msg) => f.write_str(msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FunctionError {}

/// A named, callable function with a checkable [`Signature`].
pub trait Function {
    /// This function's callable shape.
    fn signature(&self) -> &Signature;

    /// Applies the function to already-evaluated arguments.
    fn apply(&self, args: &[Variant]) -> Result<Variant, FunctionError>;
}

/// A function built from a plain closure and a signature, for the common
/// case of a pure, stateless builtin.
pub struct NativeFunction {
    signature: Signature,
    body: Box<dyn Fn(&[Variant]) -> Result<Variant, FunctionError> + Send + Sync>,
}

impl NativeFunction {
    /// Builds a native function from its signature and implementation.
    pub fn new(
        signature: Signature,
        body: impl Fn(&[Variant]) -> Result<Variant, FunctionError> + Send + Sync + 'static,
    ) -> Self {
        NativeFunction {
            signature,
            body: Box::new(body),
        }
    }
}

impl Function for NativeFunction {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn apply(&self, args: &[Variant]) -> Result<Variant, FunctionError> {
        (self.body)(args)
    }
}

/// A name-keyed catalog of [`Function`]s, consulted during binding
/// (for signature checking) and evaluation (for application).
#[derive(Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Box<dyn Function + Send + Sync>>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        FunctionRegistry {
            functions: BTreeMap::new(),
        }
    }

    /// Registers a function under `name`, replacing any previous
    /// registration.
    pub fn register(&mut self, name: impl Into<String>, function: impl Function + Send + Sync + 'static) {
        self.functions.insert(name.into(), Box::new(function));
    }

    /// Looks up a function by name.
    pub fn get(&self, name: &str) -> Option<&(dyn Function + Send + Sync)> {
        self.functions.get(name).map(|f| f.as_ref())
    }

    /// Looks up a function by name, also returning the registry's own
    /// copy of the name (borrowed for the registry's lifetime, unlike the
    /// caller's lookup key).
    pub(crate) fn get_with_name(&self, name: &str) -> Option<(&str, &(dyn Function + Send + Sync))> {
        self.functions
            .get_key_value(name)
            .map(|(k, f)| (k.as_str(), f.as_ref()))
    }

    /// All registered names, for "did you mean" suggestions.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|s| s.as_str())
    }
}
