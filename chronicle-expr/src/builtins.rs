//! The standard function catalog: the twelve reserved operator functions
//! every parsed operator binds to (§4.6), plus a handful of everyday math
//! functions and one variadic example so [`FunctionRegistry`] exercises
//! its full shape (positional, variadic, `Any`/`Concrete`/`Union` argument
//! types).

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use chronicle_value::{AtomType, ValueType, Variant};

use crate::function::{FunctionError, FunctionRegistry, NativeFunction};
use crate::signature::{ArgumentType, FunctionArgument, Signature};

fn numeric_arg(name: &str) -> FunctionArgument {
    FunctionArgument::new(name, ArgumentType::Union(vec![AtomType::Int, AtomType::Double]))
}

fn binary_numeric(
    op: impl Fn(f64, f64) -> Result<f64, FunctionError> + Send + Sync + 'static,
) -> NativeFunction {
    NativeFunction::new(
        Signature {
            positional: vec![numeric_arg("a"), numeric_arg("b")],
            variadic: None,
            returns: ValueType::Atom(AtomType::Double),
        },
        move |args| {
            let a = args[0]
                .double_value()
                .map_err(|e| FunctionError::InvalidArgument(0, e))?;
            let b = args[1]
                .double_value()
                .map_err(|e| FunctionError::InvalidArgument(1, e))?;
            op(a, b).map(Variant::double)
        },
    )
}

fn unary_numeric(op: impl Fn(f64) -> f64 + Send + Sync + 'static) -> NativeFunction {
    NativeFunction::new(
        Signature {
            positional: vec![numeric_arg("a")],
            variadic: None,
            returns: ValueType::Atom(AtomType::Double),
        },
        move |args| {
            let a = args[0]
                .double_value()
                .map_err(|e| FunctionError::InvalidArgument(0, e))?;
            Ok(Variant::double(op(a)))
        },
    )
}

fn compare(op: impl Fn(core::cmp::Ordering) -> bool + Send + Sync + 'static) -> NativeFunction {
    NativeFunction::new(
        Signature {
            positional: vec![
                FunctionArgument::new("a", ArgumentType::Any),
                FunctionArgument::new("b", ArgumentType::Any),
            ],
            variadic: None,
            returns: ValueType::Atom(AtomType::Bool),
        },
        move |args| {
            let ordering = comparable_ordering(&args[0], &args[1])?;
            Ok(Variant::bool(op(ordering)))
        },
    )
}

fn comparable_ordering(a: &Variant, b: &Variant) -> Result<core::cmp::Ordering, FunctionError> {
    if let (Ok(a), Ok(b)) = (a.double_value(), b.double_value()) {
        return a
            .partial_cmp(&b)
            .ok_or_else(|| FunctionError::DomainError("NaN is not ordered".into()));
    }
    if let (Ok(a), Ok(b)) = (a.string_value(), b.string_value()) {
        return Ok(a.cmp(&b));
    }
    Err(FunctionError::DomainError(
        "values are not comparable to one another".into(),
    ))
}

/// Builds a [`FunctionRegistry`] with the twelve reserved operator
/// functions and the standard math/string builtins registered.
pub fn standard_registry() -> FunctionRegistry {
    let mut reg = FunctionRegistry::new();

    reg.register("__add__", binary_numeric(|a, b| Ok(a + b)));
    reg.register("__sub__", binary_numeric(|a, b| Ok(a - b)));
    reg.register("__mul__", binary_numeric(|a, b| Ok(a * b)));
    reg.register(
        "__div__",
        binary_numeric(|a, b| {
            if b == 0.0 {
                Err(FunctionError::DomainError("division by zero".into()))
            } else {
                Ok(a / b)
            }
        }),
    );
    reg.register(
        "__mod__",
        binary_numeric(|a, b| {
            if b == 0.0 {
                Err(FunctionError::DomainError("modulo by zero".into()))
            } else {
                Ok(a % b)
            }
        }),
    );
    reg.register("__neg__", unary_numeric(|a| -a));

    reg.register("__eq__", compare(|o| o == core::cmp::Ordering::Equal));
    reg.register("__ne__", compare(|o| o != core::cmp::Ordering::Equal));
    reg.register("__lt__", compare(|o| o == core::cmp::Ordering::Less));
    reg.register(
        "__le__",
        compare(|o| o != core::cmp::Ordering::Greater),
    );
    reg.register("__gt__", compare(|o| o == core::cmp::Ordering::Greater));
    reg.register("__ge__", compare(|o| o != core::cmp::Ordering::Less));

    reg.register("abs", unary_numeric(f64::abs));
    reg.register("floor", unary_numeric(f64::floor));
    reg.register("ceil", unary_numeric(f64::ceil));
    reg.register("round", unary_numeric(f64::round));
    reg.register(
        "sqrt",
        NativeFunction::new(
            Signature {
                positional: vec![numeric_arg("a")],
                variadic: None,
                returns: ValueType::Atom(AtomType::Double),
            },
            |args| {
                let a = args[0]
                    .double_value()
                    .map_err(|e| FunctionError::InvalidArgument(0, e))?;
                if a < 0.0 {
                    Err(FunctionError::DomainError(
                        "sqrt of a negative number".into(),
                    ))
                } else {
                    Ok(Variant::double(a.sqrt()))
                }
            },
        ),
    );
    reg.register("pow", binary_numeric(|a, b| Ok(a.powf(b))));
    reg.register("min", binary_numeric(|a, b| Ok(a.min(b))));
    reg.register("max", binary_numeric(|a, b| Ok(a.max(b))));

    reg.register(
        "concat",
        NativeFunction::new(
            Signature {
                positional: Vec::new(),
                variadic: Some(FunctionArgument::new(
                    "parts",
                    ArgumentType::Concrete(AtomType::String),
                )),
                returns: ValueType::Atom(AtomType::String),
            },
            |args| {
                let mut out = String::new();
                for (i, a) in args.iter().enumerate() {
                    out.push_str(
                        &a.string_value()
                            .map_err(|e| FunctionError::InvalidArgument(i, e))?,
                    );
                }
                Ok(Variant::string(out))
            },
        ),
    );

    reg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Function;

    #[test]
    fn add_coerces_ints_to_double() {
        let reg = standard_registry();
        let add = reg.get("__add__").unwrap();
        let result = add.apply(&[Variant::int(2), Variant::int(3)]).unwrap();
        assert_eq!(result, Variant::double(5.0));
    }

    #[test]
    fn div_by_zero_is_domain_error() {
        let reg = standard_registry();
        let div = reg.get("__div__").unwrap();
        let err = div.apply(&[Variant::int(1), Variant::int(0)]).unwrap_err();
        assert!(matches!(err, FunctionError::DomainError(_)));
    }

    #[test]
    fn concat_joins_strings() {
        let reg = standard_registry();
        let concat = reg.get("concat").unwrap();
        let result = concat
            .apply(&[Variant::string("a"), Variant::string("b"), Variant::string("c")])
            .unwrap();
        assert_eq!(result, Variant::string("abc"));
    }

    #[test]
    fn string_equality_compares_lexically() {
        let reg = standard_registry();
        let eq = reg.get("__eq__").unwrap();
        assert_eq!(
            eq.apply(&[Variant::string("a"), Variant::string("a")]).unwrap(),
            Variant::bool(true)
        );
        let lt = reg.get("__lt__").unwrap();
        assert_eq!(
            lt.apply(&[Variant::string("a"), Variant::string("b")]).unwrap(),
            Variant::bool(true)
        );
    }
}
