use ibig::IBig;
use num_traits::Float;
use ordered_float::OrderedFloat;
use rust_decimal::prelude::*;
use xqc_ast::ArithmeticOp;
use xqc_schema_type::Xs;

use crate::atomic::Atomic;
use crate::error::{self, Error};

use super::cast_binary::{cast_binary_arithmetic, cast_untyped_arithmetic};

/// Apply an arithmetic operator to two atomized operands.
///
/// Untyped operands are read as doubles; the operands are then promoted to
/// a common numeric type.
pub fn arithmetic(op: ArithmeticOp, a: Atomic, b: Atomic) -> error::Result<Atomic> {
    let (a, b) = cast_binary_arithmetic(a, b)?;
    match (a, b) {
        (Atomic::Integer(_, a), Atomic::Integer(_, b)) => integer_op(op, a, b),
        (Atomic::Decimal(a), Atomic::Decimal(b)) => decimal_op(op, a, b),
        (Atomic::Float(a), Atomic::Float(b)) => {
            float_op(op, a.0, b.0).map(|f| Atomic::Float(OrderedFloat(f)))
        }
        (Atomic::Double(a), Atomic::Double(b)) => {
            float_op(op, a.0, b.0).map(|f| Atomic::Double(OrderedFloat(f)))
        }
        _ => Err(Error::XPTY0004),
    }
}

/// Unary minus.
pub fn negate(a: Atomic) -> error::Result<Atomic> {
    match cast_untyped_arithmetic(a)? {
        Atomic::Integer(_, i) => Ok(Atomic::Integer(Xs::Integer, -i)),
        Atomic::Decimal(d) => Ok(Atomic::Decimal(-d)),
        Atomic::Float(f) => Ok(Atomic::Float(-f)),
        Atomic::Double(d) => Ok(Atomic::Double(-d)),
        _ => Err(Error::XPTY0004),
    }
}

/// Unary plus leaves the value alone once it is known to be a number.
pub fn plus(a: Atomic) -> error::Result<Atomic> {
    let a = cast_untyped_arithmetic(a)?;
    if a.is_numeric() {
        Ok(a)
    } else {
        Err(Error::XPTY0004)
    }
}

fn integer_op(op: ArithmeticOp, a: IBig, b: IBig) -> error::Result<Atomic> {
    let zero = IBig::from(0u8);
    let value = match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Subtract => a - b,
        ArithmeticOp::Multiply => a * b,
        ArithmeticOp::Divide => {
            // integer division yields a decimal
            let a = decimal_of(a)?;
            let b = decimal_of(b)?;
            return decimal_op(op, a, b);
        }
        ArithmeticOp::IntegerDivide => {
            if b == zero {
                return Err(Error::FOAR0001);
            }
            // truncates toward zero
            a / b
        }
        ArithmeticOp::Modulo => {
            if b == zero {
                return Err(Error::FOAR0001);
            }
            // the sign follows the dividend
            a % b
        }
    };
    Ok(Atomic::Integer(Xs::Integer, value))
}

fn decimal_of(i: IBig) -> error::Result<Decimal> {
    let i = i128::try_from(i).map_err(|_| Error::FOAR0002)?;
    Decimal::from_i128(i).ok_or(Error::FOAR0002)
}

fn decimal_op(op: ArithmeticOp, a: Decimal, b: Decimal) -> error::Result<Atomic> {
    let value = match op {
        ArithmeticOp::Add => a.checked_add(b).ok_or(Error::FOAR0002)?,
        ArithmeticOp::Subtract => a.checked_sub(b).ok_or(Error::FOAR0002)?,
        ArithmeticOp::Multiply => a.checked_mul(b).ok_or(Error::FOAR0002)?,
        ArithmeticOp::Divide => {
            if b.is_zero() {
                return Err(Error::FOAR0001);
            }
            a.checked_div(b).ok_or(Error::FOAR0002)?
        }
        ArithmeticOp::IntegerDivide => {
            if b.is_zero() {
                return Err(Error::FOAR0001);
            }
            let quotient = a.checked_div(b).ok_or(Error::FOAR0002)?.trunc();
            let quotient = quotient.to_i128().ok_or(Error::FOAR0002)?;
            return Ok(Atomic::Integer(Xs::Integer, quotient.into()));
        }
        ArithmeticOp::Modulo => {
            if b.is_zero() {
                return Err(Error::FOAR0001);
            }
            a.checked_rem(b).ok_or(Error::FOAR0002)?
        }
    };
    Ok(Atomic::Decimal(value))
}

fn float_op<F>(op: ArithmeticOp, a: F, b: F) -> error::Result<F>
where
    F: Float,
{
    Ok(match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Subtract => a - b,
        ArithmeticOp::Multiply => a * b,
        // IEEE semantics: infinity or NaN, never an error
        ArithmeticOp::Divide => a / b,
        ArithmeticOp::IntegerDivide => {
            if b.is_zero() {
                return Err(Error::FOAR0001);
            }
            let quotient = (a / b).trunc();
            if quotient.is_nan() || quotient.is_infinite() {
                return Err(Error::FOAR0002);
            }
            quotient
        }
        ArithmeticOp::Modulo => a % b,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn int(i: i64) -> Atomic {
        Atomic::from(i)
    }

    #[test]
    fn test_unary_plus_keeps_the_sign() {
        let Ok(Atomic::Double(d)) = plus(Atomic::from(-0.0f64)) else {
            panic!("expected a double");
        };
        assert!(d.0 == 0.0 && d.0.is_sign_negative());
        assert_eq!(plus(int(3)), Ok(int(3)));
        assert_eq!(plus(Atomic::Untyped("2".into())), Ok(Atomic::from(2.0f64)));
        assert_eq!(plus(Atomic::Boolean(true)), Err(Error::XPTY0004));
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(arithmetic(ArithmeticOp::Add, int(1), int(2)), Ok(int(3)));
        assert_eq!(
            arithmetic(ArithmeticOp::Divide, int(1), int(4)),
            Ok(Atomic::Decimal(dec!(0.25)))
        );
        assert_eq!(
            arithmetic(ArithmeticOp::IntegerDivide, int(-7), int(2)),
            Ok(int(-3))
        );
        assert_eq!(arithmetic(ArithmeticOp::Modulo, int(-7), int(2)), Ok(int(-1)));
        assert_eq!(
            arithmetic(ArithmeticOp::Divide, int(1), int(0)),
            Err(Error::FOAR0001)
        );
    }

    #[test]
    fn test_promotion() {
        assert_eq!(
            arithmetic(ArithmeticOp::Add, int(1), Atomic::Decimal(dec!(0.5))),
            Ok(Atomic::Decimal(dec!(1.5)))
        );
        assert_eq!(
            arithmetic(ArithmeticOp::Multiply, Atomic::Decimal(dec!(2)), Atomic::from(1.5f64)),
            Ok(Atomic::from(3.0f64))
        );
        assert_eq!(
            arithmetic(ArithmeticOp::Add, Atomic::Untyped("2".into()), int(1)),
            Ok(Atomic::from(3.0f64))
        );
    }

    #[test]
    fn test_double_division_by_zero() {
        assert_eq!(
            arithmetic(ArithmeticOp::Divide, Atomic::from(1.0f64), Atomic::from(0.0f64)),
            Ok(Atomic::from(f64::INFINITY))
        );
        assert_eq!(
            arithmetic(
                ArithmeticOp::IntegerDivide,
                Atomic::from(1.0f64),
                Atomic::from(0.0f64)
            ),
            Err(Error::FOAR0001)
        );
    }

    #[test]
    fn test_type_errors() {
        assert_eq!(
            arithmetic(ArithmeticOp::Add, Atomic::from("a"), int(1)),
            Err(Error::XPTY0004)
        );
        assert_eq!(
            arithmetic(ArithmeticOp::Add, Atomic::Untyped("a".into()), int(1)),
            Err(Error::FORG0001)
        );
        assert_eq!(negate(int(3)), Ok(int(-3)));
        assert_eq!(negate(Atomic::Boolean(true)), Err(Error::XPTY0004));
    }
}
