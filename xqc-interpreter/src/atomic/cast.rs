use ibig::IBig;
use ordered_float::OrderedFloat;
use rust_decimal::prelude::*;
use xqc_schema_type::Xs;

use crate::atomic::Atomic;
use crate::error::{self, Error};

use super::atomic_core::ibig_to_f64;

/// Cast an atomic value to a target type, as `cast as` does.
pub(crate) fn cast(atomic: Atomic, target: Xs) -> error::Result<Atomic> {
    if atomic.schema_type() == target {
        return Ok(atomic);
    }
    match target {
        Xs::String => Ok(Atomic::String(atomic.string_value().into())),
        Xs::UntypedAtomic => Ok(Atomic::Untyped(atomic.string_value().into())),
        Xs::Boolean => cast_to_boolean(atomic),
        Xs::Decimal => cast_to_decimal(atomic),
        Xs::Float => cast_to_float(atomic),
        Xs::Double => cast_to_double(atomic),
        Xs::AnyAtomicType | Xs::AnySimpleType | Xs::Notation => Err(Error::XPST0080),
        xs if xs.derives_from(Xs::Integer) => cast_to_integer_type(atomic, xs),
        _ => Err(Error::XPTY0004),
    }
}

/// Whether `cast` would succeed.
pub(crate) fn castable(atomic: Atomic, target: Xs) -> bool {
    cast(atomic, target).is_ok()
}

fn cast_to_boolean(atomic: Atomic) -> error::Result<Atomic> {
    match atomic {
        Atomic::String(s) | Atomic::Untyped(s) => match s.trim() {
            "true" | "1" => Ok(Atomic::Boolean(true)),
            "false" | "0" => Ok(Atomic::Boolean(false)),
            _ => Err(Error::FORG0001),
        },
        atomic => Ok(Atomic::Boolean(atomic.effective_boolean_value()?)),
    }
}

pub(crate) fn cast_to_double(atomic: Atomic) -> error::Result<Atomic> {
    let value = match &atomic {
        Atomic::String(s) | Atomic::Untyped(s) => parse_float(s)?,
        Atomic::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Atomic::Integer(_, i) => ibig_to_f64(i),
        Atomic::Decimal(d) => d.to_f64().ok_or(Error::FOCA0002)?,
        Atomic::Float(f) => f.0 as f64,
        Atomic::Double(_) => return Ok(atomic),
    };
    Ok(Atomic::Double(OrderedFloat(value)))
}

pub(crate) fn cast_to_float(atomic: Atomic) -> error::Result<Atomic> {
    match cast_to_double(atomic)? {
        Atomic::Double(d) => Ok(Atomic::Float(OrderedFloat(d.0 as f32))),
        _ => Err(Error::XPTY0004),
    }
}

pub(crate) fn cast_to_decimal(atomic: Atomic) -> error::Result<Atomic> {
    let value = match &atomic {
        Atomic::String(s) | Atomic::Untyped(s) => parse_decimal(s)?,
        Atomic::Boolean(b) => {
            if *b {
                Decimal::ONE
            } else {
                Decimal::ZERO
            }
        }
        Atomic::Integer(_, i) => {
            let i = i128::try_from(i.clone()).map_err(|_| Error::FOCA0001)?;
            Decimal::from_i128(i).ok_or(Error::FOCA0001)?
        }
        Atomic::Decimal(_) => return Ok(atomic),
        Atomic::Float(_) | Atomic::Double(_) => {
            let f = atomic.to_f64().ok_or(Error::XPTY0004)?;
            if !f.is_finite() {
                return Err(Error::FOCA0002);
            }
            Decimal::from_f64(f).ok_or(Error::FOCA0001)?
        }
    };
    Ok(Atomic::Decimal(value))
}

fn cast_to_integer_type(atomic: Atomic, target: Xs) -> error::Result<Atomic> {
    let value: IBig = match &atomic {
        Atomic::String(s) | Atomic::Untyped(s) => parse_integer(s)?,
        Atomic::Boolean(b) => IBig::from(*b as u8),
        Atomic::Integer(_, i) => i.clone(),
        Atomic::Decimal(d) => {
            let truncated = d.trunc().to_i128().ok_or(Error::FOCA0002)?;
            IBig::from(truncated)
        }
        Atomic::Float(_) | Atomic::Double(_) => {
            let f = atomic.to_f64().ok_or(Error::XPTY0004)?;
            if !f.is_finite() {
                return Err(Error::FOCA0002);
            }
            let truncated = f.trunc();
            if truncated.abs() >= i128::MAX as f64 {
                return Err(Error::FOCA0002);
            }
            IBig::from(truncated as i128)
        }
    };
    if let Some((min, max)) = target.integer_bounds() {
        let below = min.is_some_and(|min| value < IBig::from(min));
        let above = max.is_some_and(|max| value > IBig::from(max));
        if below || above {
            return Err(Error::FORG0001);
        }
    }
    Ok(Atomic::Integer(target, value))
}

fn parse_integer(s: &str) -> error::Result<IBig> {
    let s = s.trim();
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::FORG0001);
    }
    let value = IBig::from_str_radix(digits, 10).map_err(|_| Error::FORG0001)?;
    Ok(if s.starts_with('-') { -value } else { value })
}

fn parse_decimal(s: &str) -> error::Result<Decimal> {
    let s = s.trim();
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let valid = !unsigned.is_empty()
        && unsigned != "."
        && unsigned.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && unsigned.bytes().filter(|b| *b == b'.').count() <= 1;
    if !valid {
        return Err(Error::FORG0001);
    }
    let unsigned = unsigned.strip_suffix('.').unwrap_or(unsigned);
    let value = Decimal::from_str(unsigned).map_err(|_| Error::FOCA0001)?;
    Ok(if s.starts_with('-') { -value } else { value })
}

fn parse_float(s: &str) -> error::Result<f64> {
    let s = s.trim();
    match s {
        "INF" | "+INF" => return Ok(f64::INFINITY),
        "-INF" => return Ok(f64::NEG_INFINITY),
        "NaN" => return Ok(f64::NAN),
        _ => {}
    }
    // Rust would also accept "inf" and "nan" spellings
    let lexical = !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !lexical {
        return Err(Error::FORG0001);
    }
    s.parse().map_err(|_| Error::FORG0001)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_string_to_integer() {
        assert_eq!(
            cast(" 42 ".into(), Xs::Integer),
            Ok(Atomic::Integer(Xs::Integer, IBig::from(42)))
        );
        assert_eq!(
            cast("-7".into(), Xs::Integer),
            Ok(Atomic::Integer(Xs::Integer, IBig::from(-7)))
        );
        assert_eq!(cast("4.5".into(), Xs::Integer), Err(Error::FORG0001));
        assert_eq!(cast("".into(), Xs::Integer), Err(Error::FORG0001));
    }

    #[test]
    fn test_derived_integer_bounds() {
        assert!(cast("255".into(), Xs::UnsignedByte).is_ok());
        assert_eq!(cast("256".into(), Xs::UnsignedByte), Err(Error::FORG0001));
        assert_eq!(
            cast(Atomic::from(-1i64), Xs::NonNegativeInteger),
            Err(Error::FORG0001)
        );
    }

    #[test]
    fn test_numeric_casts() {
        assert_eq!(
            cast(Atomic::from(3.9f64), Xs::Integer),
            Ok(Atomic::Integer(Xs::Integer, IBig::from(3)))
        );
        assert_eq!(cast(Atomic::from(f64::NAN), Xs::Integer), Err(Error::FOCA0002));
        assert_eq!(
            cast(Atomic::from(2i64), Xs::Decimal),
            Ok(Atomic::Decimal(dec!(2)))
        );
        assert_eq!(cast("1e3".into(), Xs::Double), Ok(Atomic::from(1000.0f64)));
        assert_eq!(cast("inf".into(), Xs::Double), Err(Error::FORG0001));
        assert_eq!(cast("1.5e0".into(), Xs::Decimal), Err(Error::FORG0001));
    }

    #[test]
    fn test_boolean_casts() {
        assert_eq!(cast("1".into(), Xs::Boolean), Ok(Atomic::Boolean(true)));
        assert_eq!(cast("no".into(), Xs::Boolean), Err(Error::FORG0001));
        assert_eq!(
            cast(Atomic::from(0.0f64), Xs::Boolean),
            Ok(Atomic::Boolean(false))
        );
        assert_eq!(
            cast(Atomic::Boolean(true), Xs::String),
            Ok(Atomic::from("true"))
        );
    }

    #[test]
    fn test_abstract_target() {
        assert_eq!(cast("a".into(), Xs::AnyAtomicType), Err(Error::XPST0080));
        assert!(!castable("a".into(), Xs::Integer));
        assert!(castable("12".into(), Xs::Short));
    }
}
