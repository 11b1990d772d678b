use std::fmt;
use std::rc::Rc;

use ibig::IBig;
use ordered_float::OrderedFloat;
use rust_decimal::prelude::*;
use xqc_ast::Constant;
use xqc_schema_type::Xs;

use crate::error;

/// An atomic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Atomic {
    /// The typed value of a node without a schema type.
    Untyped(Rc<str>),
    String(Rc<str>),
    Boolean(bool),
    /// An integer, with the (possibly derived) integer type it was made
    /// as.
    Integer(Xs, IBig),
    Decimal(Decimal),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
}

impl Atomic {
    pub fn schema_type(&self) -> Xs {
        match self {
            Atomic::Untyped(_) => Xs::UntypedAtomic,
            Atomic::String(_) => Xs::String,
            Atomic::Boolean(_) => Xs::Boolean,
            Atomic::Integer(xs, _) => *xs,
            Atomic::Decimal(_) => Xs::Decimal,
            Atomic::Float(_) => Xs::Float,
            Atomic::Double(_) => Xs::Double,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Atomic::Integer(..) | Atomic::Decimal(_) | Atomic::Float(_) | Atomic::Double(_)
        )
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Atomic::Float(f) => f.is_nan(),
            Atomic::Double(d) => d.is_nan(),
            _ => false,
        }
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Atomic::Untyped(_))
    }

    /// The effective boolean value of a singleton sequence holding this
    /// value.
    pub fn effective_boolean_value(&self) -> error::Result<bool> {
        match self {
            Atomic::Boolean(b) => Ok(*b),
            Atomic::String(s) | Atomic::Untyped(s) => Ok(!s.is_empty()),
            Atomic::Integer(_, i) => Ok(*i != IBig::from(0u8)),
            Atomic::Decimal(d) => Ok(!d.is_zero()),
            Atomic::Float(f) => Ok(!(f.is_nan() || f.0 == 0.0)),
            Atomic::Double(d) => Ok(!(d.is_nan() || d.0 == 0.0)),
        }
    }

    /// The canonical lexical representation.
    pub fn string_value(&self) -> String {
        match self {
            Atomic::String(s) | Atomic::Untyped(s) => s.to_string(),
            Atomic::Boolean(b) => b.to_string(),
            Atomic::Integer(_, i) => i.to_string(),
            Atomic::Decimal(d) => d.normalize().to_string(),
            Atomic::Float(f) => canonical_float(f.0 as f64, f.0.to_string()),
            Atomic::Double(d) => canonical_float(d.0, d.0.to_string()),
        }
    }

    /// Numeric value as an `f64`, if this is a number.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Atomic::Integer(_, i) => Some(ibig_to_f64(i)),
            Atomic::Decimal(d) => d.to_f64(),
            Atomic::Float(f) => Some(f.0 as f64),
            Atomic::Double(d) => Some(d.0),
            _ => None,
        }
    }

    /// The value as an index or count: an integer-valued number.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Atomic::Integer(_, i) => i64::try_from(i.clone()).ok(),
            _ => {
                let f = self.to_f64()?;
                (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
            }
        }
    }

    /// Back into a tree constant, for constant folding. Derived integer
    /// types, floats and untyped values have no literal form.
    pub fn to_constant(&self) -> Option<Constant> {
        match self {
            Atomic::String(s) => Some(Constant::String(s.to_string())),
            Atomic::Boolean(b) => Some(Constant::Boolean(*b)),
            Atomic::Integer(Xs::Integer, i) => Some(Constant::Integer(i.clone())),
            Atomic::Decimal(d) => Some(Constant::Decimal(*d)),
            Atomic::Double(d) => Some(Constant::Double(*d)),
            _ => None,
        }
    }
}

pub(crate) fn ibig_to_f64(i: &IBig) -> f64 {
    match i64::try_from(i.clone()) {
        Ok(i) => i as f64,
        // the decimal representation always parses
        Err(_) => i.to_string().parse().unwrap_or(f64::NAN),
    }
}

// `display` is the shortest round-trip rendering, which never uses an
// exponent
fn canonical_float(value: f64, display: String) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-6..1e6).contains(&magnitude) {
        return display;
    }
    let exponent = format!("{:E}", value);
    match exponent.split_once('E') {
        Some((mantissa, exp)) if !mantissa.contains('.') => format!("{mantissa}.0E{exp}"),
        _ => exponent,
    }
}

impl From<&Constant> for Atomic {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Boolean(b) => Atomic::Boolean(*b),
            Constant::Integer(i) => Atomic::Integer(Xs::Integer, i.clone()),
            Constant::Decimal(d) => Atomic::Decimal(*d),
            Constant::Double(d) => Atomic::Double(*d),
            Constant::String(s) => Atomic::String(s.as_str().into()),
        }
    }
}

impl From<bool> for Atomic {
    fn from(b: bool) -> Self {
        Atomic::Boolean(b)
    }
}

impl From<i64> for Atomic {
    fn from(i: i64) -> Self {
        Atomic::Integer(Xs::Integer, i.into())
    }
}

impl From<usize> for Atomic {
    fn from(i: usize) -> Self {
        Atomic::Integer(Xs::Integer, i.into())
    }
}

impl From<IBig> for Atomic {
    fn from(i: IBig) -> Self {
        Atomic::Integer(Xs::Integer, i)
    }
}

impl From<Decimal> for Atomic {
    fn from(d: Decimal) -> Self {
        Atomic::Decimal(d)
    }
}

impl From<f64> for Atomic {
    fn from(d: f64) -> Self {
        Atomic::Double(OrderedFloat(d))
    }
}

impl From<f32> for Atomic {
    fn from(f: f32) -> Self {
        Atomic::Float(OrderedFloat(f))
    }
}

impl From<&str> for Atomic {
    fn from(s: &str) -> Self {
        Atomic::String(s.into())
    }
}

impl From<String> for Atomic {
    fn from(s: String) -> Self {
        Atomic::String(s.into())
    }
}

impl fmt::Display for Atomic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.string_value())
    }
}
