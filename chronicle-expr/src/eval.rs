//! Evaluation: walking a [`BoundExpr`] against concrete variable values to
//! produce a [`Variant`].

use alloc::vec::Vec;
use core::fmt;

use chronicle_value::Variant;

use crate::bind::BoundExpr;
use crate::function::FunctionError;
use crate::variable::VariableReference;

/// Supplies the current value of a resolved [`VariableReference`] during
/// evaluation. Kept separate from [`crate::bind::VariableResolver`] because
/// binding happens once per expression while lookup happens once per
/// evaluation (e.g. once per simulation tick).
pub trait VariableLookup {
    /// The current value of this reference, if it still exists.
    fn value(&self, reference: VariableReference) -> Option<Variant>;
}

/// Why evaluating a [`BoundExpr`] failed.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A variable reference that resolved fine at bind time no longer
    /// resolves to a value (e.g. the referenced object was removed).
    MissingVariable(VariableReference),
    /// A function call failed at the value level (bad argument, division
    /// by zero, etc).
    Function(FunctionError),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::MissingVariable(r) => write!(f, "variable no longer has a value: {r:?}"),
            EvalError::Function(e) => write!(f, "{e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EvalError {}

impl From<FunctionError> for EvalError {
    fn from(e: FunctionError) -> Self {
        EvalError::Function(e)
    }
}

/// Evaluates a bound expression tree against a variable value source.
pub fn eval(expr: &BoundExpr<'_>, values: &dyn VariableLookup) -> Result<Variant, EvalError> {
    match expr {
        BoundExpr::Value(v) => Ok(v.clone()),
        BoundExpr::Variable(reference, _) => values
            .value(*reference)
            .ok_or(EvalError::MissingVariable(*reference)),
        BoundExpr::Unary(call, operand) => {
            let arg = eval(operand, values)?;
            Ok(call.function.apply(&[arg])?)
        }
        BoundExpr::Binary(call, lhs, rhs) => {
            let lhs = eval(lhs, values)?;
            let rhs = eval(rhs, values)?;
            Ok(call.function.apply(&[lhs, rhs])?)
        }
        BoundExpr::Function(call, args) => {
            let evaluated = args
                .iter()
                .map(|a| eval(a, values))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(call.function.apply(&evaluated)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::{bind, VariableResolver};
    use crate::builtins::standard_registry;
    use crate::parser::parse;
    use chronicle_value::ValueType;
    use chronicle_value::AtomType;

    struct OneVar {
        name: &'static str,
        reference: VariableReference,
        ty: ValueType,
        value: Variant,
    }

    impl VariableResolver for OneVar {
        fn resolve(&self, name: &str) -> Option<(VariableReference, ValueType)> {
            if name == self.name {
                Some((self.reference, self.ty))
            } else {
                None
            }
        }
    }

    impl VariableLookup for OneVar {
        fn value(&self, reference: VariableReference) -> Option<Variant> {
            if reference == self.reference {
                Some(self.value.clone())
            } else {
                None
            }
        }
    }

    #[test]
    fn scenario_two_times_paren_x_plus_three() {
        let expr = parse("2 * (x + 3)").unwrap();
        let registry = standard_registry();
        let ctx = OneVar {
            name: "x",
            reference: VariableReference::Object(1),
            ty: ValueType::Atom(AtomType::Double),
            value: Variant::double(4.0),
        };
        let bound = bind(&expr, &ctx, &registry).unwrap();
        let result = eval(&bound, &ctx).unwrap();
        assert_eq!(result.double_value().unwrap(), 14.0);
    }

    #[test]
    fn division_by_zero_is_a_domain_error() {
        let expr = parse("1 / 0").unwrap();
        let registry = standard_registry();
        let ctx = OneVar {
            name: "x",
            reference: VariableReference::Object(1),
            ty: ValueType::Atom(AtomType::Double),
            value: Variant::double(0.0),
        };
        let bound = bind(&expr, &ctx, &registry).unwrap();
        let err = eval(&bound, &ctx).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Function(FunctionError::DomainError(_))
        ));
    }
}
