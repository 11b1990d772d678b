use std::cell::OnceCell;
use std::rc::Rc;

use xqc_ast::Expr;

use crate::frame::Frame;
use crate::sequence::Sequence;

/// The value of a variable or argument: materialized, or deferred.
#[derive(Debug, Clone)]
pub enum Value<'e> {
    Sequence(Sequence),
    Closure(Rc<Closure<'e>>),
    Tail(Rc<Tail<'e>>),
}

/// Unperformed work: an expression with a snapshot of exactly the
/// bindings it reads.
#[derive(Debug)]
pub struct Closure<'e> {
    pub(crate) expr: &'e Expr,
    pub(crate) frame: Frame<'e>,
    memo: Option<OnceCell<Sequence>>,
}

impl<'e> Closure<'e> {
    /// A closure pulled at most once; its items are streamed, not kept.
    pub fn one_shot(expr: &'e Expr, frame: Frame<'e>) -> Self {
        Closure {
            expr,
            frame,
            memo: None,
        }
    }

    /// A closure that keeps its first materialization.
    pub fn memo(expr: &'e Expr, frame: Frame<'e>) -> Self {
        Closure {
            expr,
            frame,
            memo: Some(OnceCell::new()),
        }
    }

    pub fn is_memo(&self) -> bool {
        self.memo.is_some()
    }

    pub(crate) fn cached(&self) -> Option<Sequence> {
        self.memo.as_ref().and_then(|cell| cell.get().cloned())
    }

    pub(crate) fn remember(&self, sequence: &Sequence) {
        if let Some(cell) = &self.memo {
            // already set only if a nested evaluation got there first, with
            // the same items
            let _ = cell.set(sequence.clone());
        }
    }
}

/// A deferred value minus its first `skip` items.
#[derive(Debug)]
pub struct Tail<'e> {
    pub(crate) base: Value<'e>,
    pub(crate) skip: usize,
}

impl<'e> Value<'e> {
    pub fn empty() -> Self {
        Value::Sequence(Sequence::empty())
    }

    /// Drop the first `skip` items. A materialized base is sliced in
    /// O(1); tails of tails collapse into one, so repeated tailing does
    /// not build a chain of wrappers.
    pub fn tail(self, skip: usize) -> Value<'e> {
        match self {
            Value::Sequence(sequence) => Value::Sequence(sequence.skip(skip)),
            Value::Tail(tail) => Value::Tail(Rc::new(Tail {
                base: tail.base.clone(),
                skip: tail.skip + skip,
            })),
            base => Value::Tail(Rc::new(Tail { base, skip })),
        }
    }

    pub fn is_deferred(&self) -> bool {
        !matches!(self, Value::Sequence(_))
    }
}

impl From<Sequence> for Value<'_> {
    fn from(sequence: Sequence) -> Self {
        Value::Sequence(sequence)
    }
}
