mod builtins;
mod construct;
mod filter;
mod item;
mod iterate;
mod lazy;
mod receiver;
mod types;

use std::cell::{Ref, RefCell};
use std::iter;
use std::marker::PhantomData;
use std::rc::Rc;

use ahash::{HashMap, HashMapExt};
use xot::Xot;
use xqc_ast::{Expr, Methods};

use crate::atomic::Atomic;
use crate::context::DynamicContext;
use crate::error::{Error, SpannedResult};
use crate::frame::Frame;
use crate::program::Program;
use crate::sequence::{effective_boolean_value, Item, Sequence};
use crate::xml::DocumentOrder;

use filter::Index;
pub use receiver::{Buffer, Receiver};

/// A lazily pulled sequence of items.
pub type ItemIter<'i> = Box<dyn Iterator<Item = SpannedResult<Item>> + 'i>;
pub(crate) type AtomicIter<'i> = Box<dyn Iterator<Item = SpannedResult<Atomic>> + 'i>;

type IndexKey = (usize, Option<xot::Node>);

/// Evaluates expression trees against documents in one `Xot` arena.
///
/// The interpreter holds only per-evaluation state: the document order
/// annotations and the index cache. Variable bindings and the focus travel
/// in the [`Frame`] passed to every call.
///
/// Every node is evaluated through one of three methods: a single item,
/// a pulled iterator, or pushing into a [`Receiver`]. Each node kind
/// implements the ones it declares in [`Expr::methods`]; the others are
/// adapted from those.
pub struct Interpreter<'e, 'x> {
    context: &'x DynamicContext,
    // borrowed only for the duration of a navigation or construction step,
    // never across an iterator yield
    xot: RefCell<&'x mut Xot>,
    order: DocumentOrder,
    indexes: RefCell<HashMap<IndexKey, Rc<Index>>>,
    exprs: PhantomData<&'e Expr>,
}

impl<'e, 'x> Interpreter<'e, 'x> {
    pub fn new(context: &'x DynamicContext, xot: &'x mut Xot) -> Self {
        Interpreter {
            context,
            xot: RefCell::new(xot),
            order: DocumentOrder::new(),
            indexes: RefCell::new(HashMap::new()),
            exprs: PhantomData,
        }
    }

    pub fn xot(&self) -> Ref<'_, &'x mut Xot> {
        self.xot.borrow()
    }

    pub fn document_order(&self) -> &DocumentOrder {
        &self.order
    }

    /// Run a program in a frame prepared by [`Program::frame`].
    pub fn run(&self, program: &'e Program, frame: &Frame<'e>) -> SpannedResult<Sequence> {
        tracing::trace!(frame_size = program.frame_size, "running program");
        self.evaluate(&program.expr, frame)
    }

    /// Evaluate to a materialized sequence.
    pub fn evaluate(&self, expr: &'e Expr, frame: &Frame<'e>) -> SpannedResult<Sequence> {
        let items = self
            .iterate(expr, frame)
            .collect::<SpannedResult<Vec<Item>>>()?;
        Ok(items.into())
    }

    /// Evaluate lazily.
    pub fn iterate(&self, expr: &'e Expr, frame: &Frame<'e>) -> ItemIter<'_> {
        let location = expr.location;
        let methods = expr.methods();
        let items: ItemIter<'_> = if methods.contains(Methods::ITERATE) {
            self.iterate_native(expr, frame)
        } else if methods.contains(Methods::ITEM) {
            Box::new(self.item_native(expr, frame).transpose().into_iter())
        } else {
            match self.push_production(expr, frame) {
                Ok(sequence) => sequence_iter(sequence),
                Err(error) => error_iter(error),
            }
        };
        Box::new(items.map(move |item| item.map_err(|error| error.or_at(location))))
    }

    /// Evaluate an expression that produces at most one item.
    pub fn evaluate_item(&self, expr: &'e Expr, frame: &Frame<'e>) -> SpannedResult<Option<Item>> {
        let result = if expr.methods().contains(Methods::ITEM) {
            self.item_native(expr, frame)
        } else {
            at_most_one(self.iterate(expr, frame))
        };
        result.map_err(|error| error.or_at(expr.location))
    }

    /// Push the items of an expression into a receiver.
    pub fn process(
        &self,
        expr: &'e Expr,
        frame: &Frame<'e>,
        receiver: &mut dyn Receiver,
    ) -> SpannedResult<()> {
        let result = if expr.methods().contains(Methods::PROCESS) {
            self.process_native(expr, frame, receiver)
        } else {
            self.iterate(expr, frame)
                .try_for_each(|item| receiver.item(item?))
        };
        result.map_err(|error| error.or_at(expr.location))
    }

    /// Run a push producer into a fresh buffer, in a nested frame, closing
    /// the buffer before its items are handed back.
    pub(crate) fn push_production(
        &self,
        expr: &'e Expr,
        frame: &Frame<'e>,
    ) -> SpannedResult<Sequence> {
        let nested = frame.nested();
        let mut buffer = Buffer::new();
        self.process(expr, &nested, &mut buffer)?;
        buffer.close()?;
        Ok(buffer.into_sequence())
    }

    pub(crate) fn effective_boolean_value(
        &self,
        expr: &'e Expr,
        frame: &Frame<'e>,
    ) -> SpannedResult<bool> {
        effective_boolean_value(self.iterate(expr, frame))
            .map_err(|error| error.or_at(expr.location))
    }

    /// Atomized items of an expression.
    pub(crate) fn atomize(
        &self,
        expr: &'e Expr,
        frame: &Frame<'e>,
    ) -> AtomicIter<'_> {
        Box::new(self.iterate(expr, frame).map(move |item| {
            let item = item?;
            let xot = self.xot.borrow();
            Ok(item.atomized(&xot))
        }))
    }

    /// The atomized value of an expression that must produce at most one
    /// item.
    pub(crate) fn atomize_optional(
        &self,
        expr: &'e Expr,
        frame: &Frame<'e>,
    ) -> SpannedResult<Option<Atomic>> {
        let item = self.evaluate_item(expr, frame)?;
        let xot = self.xot.borrow();
        Ok(item.map(|item| item.atomized(&xot)))
    }

    pub(crate) fn context_item(&self, frame: &Frame<'e>) -> SpannedResult<Item> {
        frame
            .focus()
            .map(|focus| focus.item.clone())
            .ok_or_else(|| Error::XPDY0002.into())
    }

    pub(crate) fn context_node(&self, frame: &Frame<'e>) -> SpannedResult<xot::Node> {
        self.context_item(frame)?
            .to_node()
            .ok_or_else(|| Error::XPTY0020.into())
    }

    /// All items must be nodes; sorted into document order without
    /// duplicates.
    pub(crate) fn sorted_nodes(&self, expr: &'e Expr, frame: &Frame<'e>) -> SpannedResult<Vec<xot::Node>> {
        let mut nodes = self
            .iterate(expr, frame)
            .map(|item| item?.to_node().ok_or_else(|| Error::XPTY0004.into()))
            .collect::<SpannedResult<Vec<_>>>()?;
        let xot = self.xot.borrow();
        self.order.sort_nodes(&mut nodes, &xot);
        Ok(nodes)
    }
}

pub(crate) fn at_most_one<'i>(mut items: impl Iterator<Item = SpannedResult<Item>> + 'i) -> SpannedResult<Option<Item>> {
    let first = items.next().transpose()?;
    if first.is_some() && items.next().transpose()?.is_some() {
        return Err(Error::XPTY0004.into());
    }
    Ok(first)
}

pub(crate) fn sequence_iter<'i>(sequence: Sequence) -> ItemIter<'i> {
    Box::new(sequence.iter().map(Ok))
}

pub(crate) fn error_iter<'i>(error: impl Into<crate::error::SpannedError>) -> ItemIter<'i> {
    Box::new(iter::once(Err(error.into())))
}

pub(crate) fn empty_iter<'i>() -> ItemIter<'i> {
    Box::new(iter::empty())
}

/// Unwrap a result, or return an iterator yielding just the error.
macro_rules! try_iter {
    ($e:expr) => {
        match $e {
            Ok(value) => value,
            Err(error) => return $crate::interpreter::error_iter(error),
        }
    };
}
pub(crate) use try_iter;

#[cfg(test)]
mod tests {
    use xqc_ast::{
        ComparisonOp, Constant, Dependencies, EvaluationMode, ExprKind, LocationId, Slot, VarRef,
    };
    use xqc_name::Name;

    use super::*;

    fn expr(kind: ExprKind) -> Expr {
        Expr::new(kind, LocationId::default())
    }

    fn int(i: i64) -> Expr {
        Expr::constant(Constant::Integer(i.into()), LocationId::default())
    }

    fn range(a: i64, b: i64) -> Expr {
        expr(ExprKind::Range(int(a).boxed(), int(b).boxed()))
    }

    fn integers(sequence: &Sequence) -> Vec<i64> {
        sequence
            .iter()
            .map(|item| item.to_atomic().and_then(|a| a.to_integer()).unwrap())
            .collect()
    }

    fn evaluate(expr: &Expr) -> SpannedResult<Sequence> {
        let context = DynamicContext::default();
        let mut xot = Xot::new();
        let interpreter = Interpreter::new(&context, &mut xot);
        interpreter.evaluate(expr, &Frame::new(4))
    }

    #[test]
    fn test_for_is_lazy() {
        // (for $x in 1 to 1000000000 return $x)[1] pulls one item
        let for_expr = expr(ExprKind::For {
            slot: Slot(0),
            source: range(1, 1_000_000_000).boxed(),
            action: expr(ExprKind::VarRef(VarRef::Range(Slot(0)))).boxed(),
        });
        let first = expr(ExprKind::FirstItem(for_expr.boxed()));
        assert_eq!(integers(&evaluate(&first).unwrap()), vec![1]);
    }

    #[test]
    fn test_positional_filter_evaluated_once() {
        let filter = expr(ExprKind::Filter {
            base: range(1, 10).boxed(),
            predicate: int(3).boxed(),
            positional: true,
        });
        assert_eq!(integers(&evaluate(&filter).unwrap()), vec![3]);
    }

    #[test]
    fn test_focus_dependent_filter() {
        let mut predicate = expr(ExprKind::GeneralComparison(
            ComparisonOp::Gt,
            expr(ExprKind::ContextItem).boxed(),
            int(7).boxed(),
        ));
        predicate.info.dependencies = Dependencies::CONTEXT_ITEM;
        let filter = expr(ExprKind::Filter {
            base: range(1, 10).boxed(),
            predicate: predicate.boxed(),
            positional: false,
        });
        assert_eq!(integers(&evaluate(&filter).unwrap()), vec![8, 9, 10]);
    }

    #[test]
    fn test_effective_boolean_value_of_two_atomics() {
        let condition = expr(ExprKind::Literal(vec![
            Constant::Integer(1.into()),
            Constant::Integer(2.into()),
        ]));
        let if_expr = expr(ExprKind::If {
            condition: condition.boxed(),
            then: int(1).boxed(),
            otherwise: int(0).boxed(),
        });
        assert_eq!(evaluate(&if_expr).unwrap_err().error, Error::FORG0006);
    }

    #[test]
    fn test_memo_closure_is_shared() {
        let mut value = range(1, 3);
        value.mode = EvaluationMode::MemoClosure(Box::new([]));
        let var = || expr(ExprKind::VarRef(VarRef::Range(Slot(0))));
        let let_expr = expr(ExprKind::Let {
            slot: Slot(0),
            value: value.boxed(),
            action: expr(ExprKind::Block(vec![var(), var()])).boxed(),
        });
        assert_eq!(
            integers(&evaluate(&let_expr).unwrap()),
            vec![1, 2, 3, 1, 2, 3]
        );
    }

    #[test]
    fn test_unbound_variable() {
        let var = expr(ExprKind::VarRef(VarRef::Global(Name::unprefixed("x"))));
        assert_eq!(evaluate(&var).unwrap_err().error, Error::XPDY0002);
    }

    #[test]
    fn test_element_constructor() {
        let content = expr(ExprKind::Literal(vec![
            Constant::String("a".to_string()),
            Constant::Integer(1.into()),
        ]));
        let element = expr(ExprKind::ElementConstructor {
            name: Name::unprefixed("e"),
            content: content.boxed(),
        });
        let context = DynamicContext::default();
        let mut xot = Xot::new();
        let interpreter = Interpreter::new(&context, &mut xot);
        let result = interpreter.evaluate(&element, &Frame::new(0)).unwrap();
        let node = result.first().and_then(|item| item.to_node()).unwrap();
        assert_eq!(interpreter.xot().to_string(node).unwrap(), "<e>a 1</e>");
    }
}
