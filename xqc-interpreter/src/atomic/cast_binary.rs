use crate::atomic::Atomic;
use crate::error;

use super::cast::{cast_to_decimal, cast_to_double, cast_to_float};

pub(crate) fn cast_binary_arithmetic(a: Atomic, b: Atomic) -> error::Result<(Atomic, Atomic)> {
    let a = cast_untyped_arithmetic(a)?;
    let b = cast_untyped_arithmetic(b)?;

    cast_binary(a, b)
}

pub(crate) fn cast_binary_compare(a: Atomic, b: Atomic) -> error::Result<(Atomic, Atomic)> {
    let a = cast_untyped_compare(a);
    let b = cast_untyped_compare(b);

    cast_binary(a, b)
}

// an untyped operand of arithmetic is read as a double
pub(crate) fn cast_untyped_arithmetic(value: Atomic) -> error::Result<Atomic> {
    if let Atomic::Untyped(_) = value {
        cast_to_double(value)
    } else {
        Ok(value)
    }
}

// an untyped operand of a value comparison is read as a string
fn cast_untyped_compare(value: Atomic) -> Atomic {
    if let Atomic::Untyped(s) = value {
        Atomic::String(s)
    } else {
        value
    }
}

fn cast_binary(a: Atomic, b: Atomic) -> error::Result<(Atomic, Atomic)> {
    use Atomic::*;

    match (&a, &b) {
        (Decimal(_), Float(_)) | (Integer(..), Float(_)) => Ok((cast_to_float(a)?, b)),
        (Float(_), Decimal(_)) | (Float(_), Integer(..)) => Ok((a, cast_to_float(b)?)),
        (Decimal(_), Double(_)) | (Integer(..), Double(_)) | (Float(_), Double(_)) => {
            Ok((cast_to_double(a)?, b))
        }
        (Double(_), Decimal(_)) | (Double(_), Integer(..)) | (Double(_), Float(_)) => {
            Ok((a, cast_to_double(b)?))
        }
        (Decimal(_), Integer(..)) => Ok((a, cast_to_decimal(b)?)),
        (Integer(..), Decimal(_)) => Ok((cast_to_decimal(a)?, b)),
        // otherwise, we don't cast
        _ => Ok((a, b)),
    }
}
