//! Atomic values and the operations defined on them.
mod atomic_core;
mod cast;
mod cast_binary;
mod compare;
mod op;

pub use atomic_core::Atomic;
pub(crate) use cast::{cast, cast_to_double, castable};
pub(crate) use cast_binary::cast_untyped_arithmetic;
pub use compare::compare_values;
pub(crate) use compare::general_compare;
pub use op::{arithmetic, negate, plus};
