use crate::error::SpannedResult;
use crate::sequence::{Item, Sequence};

/// The push side of evaluation: producers write items into a receiver.
pub trait Receiver {
    fn item(&mut self, item: Item) -> SpannedResult<()>;

    /// No more items follow.
    fn close(&mut self) -> SpannedResult<()> {
        Ok(())
    }
}

/// A receiver collecting items into a sequence.
#[derive(Debug, Default)]
pub struct Buffer {
    items: Vec<Item>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_sequence(self) -> Sequence {
        self.items.into()
    }
}

impl Receiver for Buffer {
    fn item(&mut self, item: Item) -> SpannedResult<()> {
        self.items.push(item);
        Ok(())
    }
}
