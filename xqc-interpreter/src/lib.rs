//! Runtime for compiled expression trees.
//!
//! Evaluation is pull based: most nodes hand out a lazily pulled iterator,
//! some produce a single item, and constructors push into a [`Receiver`].
//! The [`Interpreter`] adapts between these, so callers can ask for
//! whichever style suits them.
mod atomic;
mod context;
mod error;
mod frame;
mod interpreter;
mod pattern;
mod program;
mod sequence;
mod value;
mod xml;

pub use atomic::{arithmetic, compare_values, negate, plus, Atomic};
pub use context::{DynamicContext, DynamicContextBuilder, KeyResolver};
pub use error::{Error, Result, SpannedError, SpannedResult};
pub use frame::{Focus, Frame};
pub use interpreter::{Buffer, Interpreter, ItemIter, Receiver};
pub use program::Program;
pub use sequence::{effective_boolean_value, Item, Sequence, SequenceIter};
pub use value::{Closure, Tail, Value};
pub use xml::DocumentOrder;
