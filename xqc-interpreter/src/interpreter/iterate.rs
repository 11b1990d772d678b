use std::iter;

use ahash::{HashSet, HashSetExt};
use ibig::IBig;
use xqc_ast::{Dependencies, Expr, ExprKind, SetOp, VarRef};
use xqc_schema_type::Xs;

use crate::atomic::{cast, Atomic};
use crate::error::{Error, SpannedResult};
use crate::frame::Frame;
use crate::sequence::{Item, Sequence};
use crate::value::Value;
use crate::xml::axis_nodes;

use super::{empty_iter, error_iter, sequence_iter, try_iter, Interpreter, ItemIter};

impl<'e, 'x> Interpreter<'e, 'x> {
    pub(crate) fn iterate_native(&self, expr: &'e Expr, frame: &Frame<'e>) -> ItemIter<'_> {
        match &expr.kind {
            ExprKind::Literal(constants) => Box::new(
                constants
                    .iter()
                    .map(|constant| Ok(Item::Atomic(Atomic::from(constant)))),
            ),
            ExprKind::VarRef(VarRef::Range(slot)) => match frame.get(*slot) {
                Some(value) => self.iterate_value(value.clone()),
                None => error_iter(Error::XPDY0002),
            },
            ExprKind::VarRef(VarRef::Global(name)) => match self.context.variable(name) {
                Some(sequence) => sequence_iter(sequence.clone()),
                None => error_iter(Error::XPDY0002),
            },
            ExprKind::Range(a, b) => {
                let start = try_iter!(self.range_bound(a, frame));
                let end = try_iter!(self.range_bound(b, frame));
                match (start, end) {
                    (Some(start), Some(end)) if start <= end => {
                        let one = IBig::from(1u8);
                        Box::new(
                            iter::successors(Some(start), move |n| {
                                (*n < end).then(|| n + &one)
                            })
                            .map(|n| Ok(Item::from(n))),
                        )
                    }
                    _ => empty_iter(),
                }
            }
            ExprKind::SetOperation(op, a, b) => {
                let nodes = try_iter!(self.set_operation(*op, a, b, frame));
                Box::new(nodes.into_iter().map(|node| Ok(Item::Node(node))))
            }
            ExprKind::Block(items) => {
                let frame = frame.clone();
                Box::new(items.iter().flat_map(move |item| self.iterate(item, &frame)))
            }
            ExprKind::If {
                condition,
                then,
                otherwise,
            } => {
                if try_iter!(self.effective_boolean_value(condition, frame)) {
                    self.iterate(then, frame)
                } else {
                    self.iterate(otherwise, frame)
                }
            }
            ExprKind::For {
                slot,
                source,
                action,
            } => {
                let slot = *slot;
                let frame = frame.clone();
                Box::new(
                    self.iterate(source, &frame)
                        .flat_map(move |item| match item {
                            Ok(item) => {
                                let value = Value::from(Sequence::from(item));
                                self.iterate(action, &frame.with(slot, value))
                            }
                            Err(error) => error_iter(error),
                        }),
                )
            }
            ExprKind::Let {
                slot,
                value,
                action,
            } => {
                let value = try_iter!(self.lazy_evaluate(value, frame));
                self.iterate(action, &frame.with(*slot, value))
            }
            ExprKind::Path(a, b) => self.path(a, b, frame),
            ExprKind::DocumentSort(a) => {
                let items = try_iter!(self.document_sort(a, frame));
                Box::new(items.into_iter().map(Ok))
            }
            ExprKind::AxisStep(axis, node_test) => {
                let node = try_iter!(self.context_node(frame));
                let nodes = {
                    let xot = self.xot.borrow();
                    axis_nodes(*axis, node_test, node, &xot, &self.order)
                };
                Box::new(nodes.into_iter().map(|node| Ok(Item::Node(node))))
            }
            ExprKind::Reverse(a) => {
                let mut items = try_iter!(self.evaluate(a, frame)).items();
                items.reverse();
                Box::new(items.into_iter().map(Ok))
            }
            ExprKind::Filter {
                base, predicate, ..
            } => self.filter(base, predicate, frame),
            ExprKind::Slice { base, min, max } => {
                let skip = min.saturating_sub(1);
                match max {
                    Some(max) if *max < *min => empty_iter(),
                    Some(max) => Box::new(self.iterate(base, frame).skip(skip).take(max - skip)),
                    None => Box::new(self.iterate(base, frame).skip(skip)),
                }
            }
            ExprKind::IndexedFilter {
                base,
                key_path,
                value,
            } => {
                let items = try_iter!(self.indexed_filter(expr, base, key_path, value, frame));
                Box::new(items.into_iter().map(Ok))
            }
            ExprKind::Treat {
                operand,
                sequence_type,
            } => {
                let sequence = try_iter!(self.evaluate(operand, frame));
                if !self.matches_sequence_type(sequence_type, &sequence) {
                    return error_iter(Error::XPDY0050);
                }
                sequence_iter(sequence)
            }
            ExprKind::FunctionCall { function, args } => {
                sequence_iter(try_iter!(self.call(function, args, frame)))
            }
            ExprKind::ElementConstructor { .. } | ExprKind::TextConstructor(_) => {
                sequence_iter(try_iter!(self.push_production(expr, frame)))
            }
            _ => Box::new(self.item_native(expr, frame).transpose().into_iter()),
        }
    }

    /// One end of a range expression: an integer, or empty.
    fn range_bound(&self, expr: &'e Expr, frame: &Frame<'e>) -> SpannedResult<Option<IBig>> {
        let atomic = match self.atomize_optional(expr, frame)? {
            Some(Atomic::Untyped(s)) => cast(Atomic::Untyped(s), Xs::Integer)?,
            Some(atomic) => atomic,
            None => return Ok(None),
        };
        match atomic {
            Atomic::Integer(_, i) => Ok(Some(i)),
            _ => Err(Error::XPTY0004.into()),
        }
    }

    fn set_operation(
        &self,
        op: SetOp,
        a: &'e Expr,
        b: &'e Expr,
        frame: &Frame<'e>,
    ) -> SpannedResult<Vec<xot::Node>> {
        let a = self.sorted_nodes(a, frame)?;
        let b = self.sorted_nodes(b, frame)?;
        Ok(match op {
            SetOp::Union => {
                let mut nodes = a;
                nodes.extend(b);
                let xot = self.xot.borrow();
                self.order.sort_nodes(&mut nodes, &xot);
                nodes
            }
            SetOp::Intersect => {
                let b: HashSet<xot::Node> = b.into_iter().collect();
                a.into_iter().filter(|node| b.contains(node)).collect()
            }
            SetOp::Except => {
                let mut excluded = HashSet::with_capacity(b.len());
                excluded.extend(b);
                a.into_iter().filter(|node| !excluded.contains(node)).collect()
            }
        })
    }

    fn path(&self, a: &'e Expr, b: &'e Expr, frame: &Frame<'e>) -> ItemIter<'_> {
        let outer = frame.clone();
        let step = move |(i, item): (usize, SpannedResult<Item>), size: Option<usize>| match item {
            Ok(item) if item.is_node() => self.iterate(b, &outer.with_focus(item, i + 1, size)),
            Ok(_) => error_iter(Error::XPTY0019),
            Err(error) => error_iter(error),
        };
        // last() on the right needs the size of the left up front
        if b.info.dependencies.contains(Dependencies::LAST) {
            let items = try_iter!(self.evaluate(a, frame));
            let size = Some(items.len());
            Box::new(
                items
                    .iter()
                    .map(Ok)
                    .enumerate()
                    .flat_map(move |entry| step(entry, size)),
            )
        } else {
            Box::new(
                self.iterate(a, frame)
                    .enumerate()
                    .flat_map(move |entry| step(entry, None)),
            )
        }
    }

    fn document_sort(&self, expr: &'e Expr, frame: &Frame<'e>) -> SpannedResult<Vec<Item>> {
        let items = self.evaluate(expr, frame)?.items();
        let nodes: Vec<xot::Node> = items.iter().filter_map(Item::to_node).collect();
        if nodes.is_empty() {
            return Ok(items);
        }
        if nodes.len() != items.len() {
            return Err(Error::XPTY0018.into());
        }
        let mut nodes = nodes;
        let xot = self.xot.borrow();
        self.order.sort_nodes(&mut nodes, &xot);
        Ok(nodes.into_iter().map(Item::Node).collect())
    }
}
