use std::cmp::Ordering;

use xqc_ast::ComparisonOp;
use xqc_schema_type::Xs;

use crate::atomic::Atomic;
use crate::error::{self, Error};

use super::cast::cast;
use super::cast_binary::cast_binary_compare;

/// Value comparison (`eq`, `lt`, ...) of two atomized operands.
///
/// Untyped operands compare as strings. Comparing values of incomparable
/// types is a type error.
pub fn compare_values(op: ComparisonOp, a: Atomic, b: Atomic) -> error::Result<bool> {
    let (a, b) = cast_binary_compare(a, b)?;
    let ordering = match (&a, &b) {
        (Atomic::Integer(_, a), Atomic::Integer(_, b)) => Some(a.cmp(b)),
        (Atomic::Decimal(a), Atomic::Decimal(b)) => Some(a.cmp(b)),
        // partial_cmp on the inner floats so NaN stays incomparable
        (Atomic::Float(a), Atomic::Float(b)) => a.0.partial_cmp(&b.0),
        (Atomic::Double(a), Atomic::Double(b)) => a.0.partial_cmp(&b.0),
        (Atomic::String(a), Atomic::String(b)) => Some(a.cmp(b)),
        (Atomic::Boolean(a), Atomic::Boolean(b)) => Some(a.cmp(b)),
        _ => return Err(Error::XPTY0004),
    };
    Ok(match ordering {
        Some(ordering) => test(op, ordering),
        // NaN is unequal to everything, including itself
        None => op == ComparisonOp::Ne,
    })
}

/// One pair of a general comparison. Untyped values take the type of the
/// other operand: double against numbers, string against strings and
/// untyped.
pub(crate) fn general_compare(op: ComparisonOp, a: Atomic, b: Atomic) -> error::Result<bool> {
    let (a, b) = match (a.is_untyped(), b.is_untyped()) {
        (true, true) => (a, b),
        (true, false) => (untyped_as(a, &b)?, b),
        (false, true) => {
            let b = untyped_as(b, &a)?;
            (a, b)
        }
        (false, false) => (a, b),
    };
    compare_values(op, a, b)
}

fn untyped_as(untyped: Atomic, other: &Atomic) -> error::Result<Atomic> {
    if other.is_numeric() {
        cast(untyped, Xs::Double)
    } else {
        match other {
            Atomic::String(_) => cast(untyped, Xs::String),
            other => cast(untyped, other.schema_type()),
        }
    }
}

fn test(op: ComparisonOp, ordering: Ordering) -> bool {
    match op {
        ComparisonOp::Eq => ordering == Ordering::Equal,
        ComparisonOp::Ne => ordering != Ordering::Equal,
        ComparisonOp::Lt => ordering == Ordering::Less,
        ComparisonOp::Le => ordering != Ordering::Greater,
        ComparisonOp::Gt => ordering == Ordering::Greater,
        ComparisonOp::Ge => ordering != Ordering::Less,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_numeric_comparison_promotes() {
        assert_eq!(
            compare_values(ComparisonOp::Eq, Atomic::from(1i64), Atomic::from(1.0f64)),
            Ok(true)
        );
        assert_eq!(
            compare_values(
                ComparisonOp::Lt,
                Atomic::Decimal(dec!(1.5)),
                Atomic::from(2i64)
            ),
            Ok(true)
        );
    }

    #[test]
    fn test_nan() {
        let nan = Atomic::from(f64::NAN);
        assert_eq!(compare_values(ComparisonOp::Eq, nan.clone(), nan.clone()), Ok(false));
        assert_eq!(compare_values(ComparisonOp::Ne, nan.clone(), nan), Ok(true));
    }

    #[test]
    fn test_untyped_value_comparison_is_string() {
        assert_eq!(
            compare_values(ComparisonOp::Eq, Atomic::Untyped("1".into()), Atomic::from(1i64)),
            Err(Error::XPTY0004)
        );
        assert_eq!(
            compare_values(ComparisonOp::Eq, Atomic::Untyped("a".into()), Atomic::from("a")),
            Ok(true)
        );
    }

    #[test]
    fn test_general_comparison_casts_untyped() {
        assert_eq!(
            general_compare(ComparisonOp::Eq, Atomic::Untyped("1.0".into()), Atomic::from(1i64)),
            Ok(true)
        );
        assert_eq!(
            general_compare(ComparisonOp::Eq, Atomic::Untyped("1".into()), Atomic::from(true)),
            Ok(true)
        );
        assert_eq!(
            general_compare(ComparisonOp::Eq, Atomic::Untyped("x".into()), Atomic::from(1i64)),
            Err(Error::FORG0001)
        );
    }
}
