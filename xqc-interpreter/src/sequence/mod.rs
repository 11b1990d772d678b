mod item;
mod sequence_core;

pub use item::{effective_boolean_value, Item};
pub use sequence_core::{Sequence, SequenceIter};
