use std::iter;
use std::rc::Rc;

use ahash::{HashMap, HashMapExt};
use xqc_ast::{ComparisonOp, Dependencies, Expr};

use crate::atomic::{general_compare, Atomic};
use crate::error::{Error, SpannedResult};
use crate::frame::Frame;
use crate::sequence::{effective_boolean_value, Item};

use super::item::position_of;
use super::{empty_iter, try_iter, Interpreter, ItemIter};

/// Items of a filter base with the atomized keys each one has.
///
/// When every key is a string or untyped value, lookups for string-like
/// values go through `by_string`; anything else falls back to comparing
/// against every key.
#[derive(Debug)]
pub(crate) struct Index {
    items: Vec<Item>,
    keys: Vec<Vec<Atomic>>,
    by_string: HashMap<String, Vec<usize>>,
    exact: bool,
}

fn is_string_like(atomic: &Atomic) -> bool {
    matches!(atomic, Atomic::String(_) | Atomic::Untyped(_))
}

impl Index {
    fn lookup(&self, values: &[Atomic]) -> SpannedResult<Vec<Item>> {
        if self.exact && values.iter().all(is_string_like) {
            let mut positions: Vec<usize> = values
                .iter()
                .filter_map(|value| self.by_string.get(&value.string_value()))
                .flatten()
                .copied()
                .collect();
            positions.sort_unstable();
            positions.dedup();
            return Ok(positions.into_iter().map(|i| self.items[i].clone()).collect());
        }
        let mut items = Vec::new();
        for (item, keys) in self.items.iter().zip(&self.keys) {
            'keys: for key in keys {
                for value in values {
                    if general_compare(ComparisonOp::Eq, key.clone(), value.clone())? {
                        items.push(item.clone());
                        break 'keys;
                    }
                }
            }
        }
        Ok(items)
    }
}

impl<'e, 'x> Interpreter<'e, 'x> {
    pub(crate) fn filter(
        &self,
        base: &'e Expr,
        predicate: &'e Expr,
        frame: &Frame<'e>,
    ) -> ItemIter<'_> {
        if !predicate.info.depends_on_focus() {
            // the same value for every item: evaluate it once
            let value = try_iter!(self.evaluate(predicate, frame));
            if let (1, Some(Item::Atomic(atomic))) = (value.len(), value.first()) {
                if atomic.is_numeric() {
                    return match position_of(&atomic) {
                        Some(position) => {
                            Box::new(self.iterate(base, frame).skip(position - 1).take(1))
                        }
                        None => empty_iter(),
                    };
                }
            }
            return if try_iter!(value.effective_boolean_value()) {
                self.iterate(base, frame)
            } else {
                empty_iter()
            };
        }

        let outer = frame.clone();
        let select = move |position: usize, item: Item, size: Option<usize>| {
            let inner = outer.with_focus(item.clone(), position, size);
            self.predicate_truth(predicate, &inner, position)
                .map(|selected| selected.then_some(item))
                .transpose()
        };
        if predicate.info.dependencies.contains(Dependencies::LAST) {
            let items = try_iter!(self.evaluate(base, frame));
            let size = Some(items.len());
            Box::new(
                items
                    .iter()
                    .enumerate()
                    .filter_map(move |(i, item)| select(i + 1, item, size)),
            )
        } else {
            Box::new(
                self.iterate(base, frame)
                    .enumerate()
                    .filter_map(move |(i, item)| match item {
                        Ok(item) => select(i + 1, item, None),
                        Err(error) => Some(Err(error)),
                    }),
            )
        }
    }

    /// Whether a predicate selects the item at `position`: a numeric
    /// value selects by position, anything else by its effective boolean
    /// value.
    pub(crate) fn predicate_truth(
        &self,
        predicate: &'e Expr,
        frame: &Frame<'e>,
        position: usize,
    ) -> SpannedResult<bool> {
        let mut items = self.iterate(predicate, frame);
        match items.next().transpose()? {
            None => Ok(false),
            Some(Item::Atomic(atomic)) if atomic.is_numeric() => {
                if items.next().transpose()?.is_some() {
                    return Err(Error::FORG0006.into());
                }
                Ok(position_of(&atomic) == Some(position))
            }
            Some(first) => effective_boolean_value(iter::once(Ok(first)).chain(items)),
        }
    }

    /// `base[key_path = value]` answered from an index over `base`, built
    /// on first use and shared by later evaluations with the same focus.
    pub(crate) fn indexed_filter(
        &self,
        expr: &'e Expr,
        base: &'e Expr,
        key_path: &'e Expr,
        value: &'e Expr,
        frame: &Frame<'e>,
    ) -> SpannedResult<Vec<Item>> {
        let values = self.atomize(value, frame).collect::<SpannedResult<Vec<_>>>()?;
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let focus_node = if base.info.depends_on_focus() {
            match self.context_item(frame)?.to_node() {
                Some(node) => Some(node),
                // not worth caching
                None => return self.build_index(base, key_path, frame)?.lookup(&values),
            }
        } else {
            None
        };
        let key = (expr as *const Expr as usize, focus_node);
        let cached = self.indexes.borrow().get(&key).cloned();
        let index = match cached {
            Some(index) => index,
            None => {
                let index = Rc::new(self.build_index(base, key_path, frame)?);
                tracing::debug!(items = index.items.len(), exact = index.exact, "built filter index");
                self.indexes.borrow_mut().insert(key, index.clone());
                index
            }
        };
        index.lookup(&values)
    }

    fn build_index(
        &self,
        base: &'e Expr,
        key_path: &'e Expr,
        frame: &Frame<'e>,
    ) -> SpannedResult<Index> {
        let items = self.evaluate(base, frame)?.items();
        let size = Some(items.len());
        let mut keys = Vec::with_capacity(items.len());
        let mut by_string: HashMap<String, Vec<usize>> = HashMap::new();
        let mut exact = true;
        for (i, item) in items.iter().enumerate() {
            let inner = frame.with_focus(item.clone(), i + 1, size);
            let item_keys = self.atomize(key_path, &inner).collect::<SpannedResult<Vec<_>>>()?;
            for key in &item_keys {
                if !is_string_like(key) {
                    exact = false;
                    continue;
                }
                let positions = by_string.entry(key.string_value()).or_default();
                if positions.last() != Some(&i) {
                    positions.push(i);
                }
            }
            keys.push(item_keys);
        }
        Ok(Index {
            items,
            keys,
            by_string,
            exact,
        })
    }
}
