use xqc_ast::Slot;

use crate::sequence::Item;
use crate::value::Value;

/// The focus: context item, its 1-based position and, when known, the
/// size of the sequence being iterated.
#[derive(Debug, Clone, PartialEq)]
pub struct Focus {
    pub item: Item,
    pub position: usize,
    pub size: Option<usize>,
}

/// Per-evaluation state: range variable values by slot, and the focus.
///
/// A frame is owned by one evaluation and passed explicitly into every
/// call; lazy iterators take their own copy.
#[derive(Debug, Clone)]
pub struct Frame<'e> {
    slots: Vec<Option<Value<'e>>>,
    focus: Option<Focus>,
}

impl<'e> Frame<'e> {
    pub fn new(size: usize) -> Self {
        Frame {
            slots: vec![None; size],
            focus: None,
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&Value<'e>> {
        self.slots.get(slot.0).and_then(|value| value.as_ref())
    }

    pub fn set(&mut self, slot: Slot, value: Value<'e>) {
        if slot.0 >= self.slots.len() {
            self.slots.resize(slot.0 + 1, None);
        }
        self.slots[slot.0] = Some(value);
    }

    pub fn with(&self, slot: Slot, value: Value<'e>) -> Frame<'e> {
        let mut frame = self.clone();
        frame.set(slot, value);
        frame
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    pub fn with_focus(&self, item: Item, position: usize, size: Option<usize>) -> Frame<'e> {
        Frame {
            slots: self.slots.clone(),
            focus: Some(Focus {
                item,
                position,
                size,
            }),
        }
    }

    pub fn set_focus(&mut self, focus: Option<Focus>) {
        self.focus = focus;
    }

    /// A child frame for a nested evaluation: same slots and focus, but
    /// nothing set on it reaches this frame.
    pub fn nested(&self) -> Frame<'e> {
        self.clone()
    }

    /// A frame holding only the given slots and no focus: the snapshot a
    /// closure keeps.
    pub fn capture(&self, slots: &[Slot]) -> Frame<'e> {
        let mut captured = Frame::new(self.slots.len());
        for slot in slots {
            if let Some(value) = self.get(*slot) {
                captured.set(*slot, value.clone());
            }
        }
        captured
    }
}
