use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::SpannedResult;

use super::item::{effective_boolean_value, Item};

/// A materialized sequence: a view `start..end` onto a shared buffer.
///
/// Clones and slices are O(1) and share the buffer. A view that ends at the
/// end of its buffer owns the buffer's tail: appending to it extends the
/// buffer in place. No other view can observe the new items, since every
/// view stops at its own `end`. Appending to a view that does not own the
/// tail copies.
#[derive(Clone)]
pub struct Sequence {
    buffer: Rc<RefCell<Vec<Item>>>,
    start: usize,
    end: usize,
}

impl Sequence {
    pub fn empty() -> Self {
        Vec::new().into()
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The item at a 0-based index.
    pub fn get(&self, index: usize) -> Option<Item> {
        if index >= self.len() {
            return None;
        }
        self.buffer.borrow().get(self.start + index).cloned()
    }

    pub fn first(&self) -> Option<Item> {
        self.get(0)
    }

    pub fn last(&self) -> Option<Item> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn iter(&self) -> SequenceIter {
        SequenceIter {
            sequence: self.clone(),
            index: 0,
        }
    }

    pub fn items(&self) -> Vec<Item> {
        self.buffer.borrow()[self.start..self.end].to_vec()
    }

    /// Items `start..end` (0-based, clamped to the sequence).
    pub fn slice(&self, start: usize, end: usize) -> Sequence {
        let end = end.min(self.len());
        let start = start.min(end);
        Sequence {
            buffer: self.buffer.clone(),
            start: self.start + start,
            end: self.start + end,
        }
    }

    /// Everything but the first `count` items.
    pub fn skip(&self, count: usize) -> Sequence {
        self.slice(count, self.len())
    }

    fn owns_tail(&self) -> bool {
        self.end == self.buffer.borrow().len()
    }

    /// This sequence followed by `items`.
    pub fn extend(&self, items: impl IntoIterator<Item = Item>) -> Sequence {
        // collect first: `items` may be reading this very buffer
        let items: Vec<Item> = items.into_iter().collect();
        if items.is_empty() {
            return self.clone();
        }
        if self.owns_tail() {
            let mut buffer = self.buffer.borrow_mut();
            buffer.extend(items);
            let end = buffer.len();
            drop(buffer);
            return Sequence {
                buffer: self.buffer.clone(),
                start: self.start,
                end,
            };
        }
        let mut copy = self.items();
        copy.extend(items);
        copy.into()
    }

    pub fn append(&self, other: &Sequence) -> Sequence {
        if self.is_empty() {
            return other.clone();
        }
        self.extend(other.iter())
    }

    /// Whether the two sequences are views onto the same buffer.
    pub fn shares_buffer(&self, other: &Sequence) -> bool {
        Rc::ptr_eq(&self.buffer, &other.buffer)
    }

    pub fn effective_boolean_value(&self) -> SpannedResult<bool> {
        effective_boolean_value(self.iter().map(Ok))
    }
}

impl From<Vec<Item>> for Sequence {
    fn from(items: Vec<Item>) -> Self {
        let end = items.len();
        Sequence {
            buffer: Rc::new(RefCell::new(items)),
            start: 0,
            end,
        }
    }
}

impl From<Item> for Sequence {
    fn from(item: Item) -> Self {
        vec![item].into()
    }
}

impl FromIterator<Item> for Sequence {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items()).finish()
    }
}

/// Iterator over a sequence. It holds its own view, so it outlives the
/// sequence it came from.
pub struct SequenceIter {
    sequence: Sequence,
    index: usize,
}

impl Iterator for SequenceIter {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        let item = self.sequence.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sequence.len() - self.index;
        (remaining, Some(remaining))
    }
}
