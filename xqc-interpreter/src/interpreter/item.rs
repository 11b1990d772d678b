use xqc_ast::{Expr, ExprKind, NodeComparisonOp, Quantifier};

use crate::atomic::{arithmetic, cast, castable, compare_values, general_compare, negate, plus, Atomic};
use crate::error::{Error, SpannedResult};
use crate::frame::Frame;
use crate::sequence::{Item, Sequence};
use crate::value::Value;

use super::{at_most_one, Interpreter};

impl<'e, 'x> Interpreter<'e, 'x> {
    pub(crate) fn item_native(&self, expr: &'e Expr, frame: &Frame<'e>) -> SpannedResult<Option<Item>> {
        let item = match &expr.kind {
            ExprKind::Literal(constants) => {
                return match constants.as_slice() {
                    [] => Ok(None),
                    [constant] => Ok(Some(Item::Atomic(Atomic::from(constant)))),
                    _ => Err(Error::XPTY0004.into()),
                };
            }
            ExprKind::ContextItem => self.context_item(frame)?,
            ExprKind::Root => {
                let node = self.context_node(frame)?;
                let xot = self.xot.borrow();
                let root = xot.root(node);
                if !xot.is_document(root) {
                    return Err(Error::XPDY0050.into());
                }
                Item::Node(root)
            }
            ExprKind::Arithmetic(op, a, b) => {
                let (Some(a), Some(b)) = (self.atomize_optional(a, frame)?, self.atomize_optional(b, frame)?)
                else {
                    return Ok(None);
                };
                arithmetic(*op, a, b)?.into()
            }
            ExprKind::Negate(a) => match self.atomize_optional(a, frame)? {
                Some(a) => negate(a)?.into(),
                None => return Ok(None),
            },
            ExprKind::Plus(a) => match self.atomize_optional(a, frame)? {
                Some(a) => plus(a)?.into(),
                None => return Ok(None),
            },
            ExprKind::ValueComparison(op, a, b) => {
                let (Some(a), Some(b)) = (self.atomize_optional(a, frame)?, self.atomize_optional(b, frame)?)
                else {
                    return Ok(None);
                };
                compare_values(*op, a, b)?.into()
            }
            ExprKind::GeneralComparison(op, a, b) => {
                let left = self.atomize(a, frame).collect::<SpannedResult<Vec<Atomic>>>()?;
                let mut found = false;
                if !left.is_empty() {
                    for right in self.atomize(b, frame) {
                        let right = right?;
                        for left in &left {
                            if general_compare(*op, left.clone(), right.clone())? {
                                found = true;
                                break;
                            }
                        }
                        if found {
                            break;
                        }
                    }
                }
                found.into()
            }
            ExprKind::NodeComparison(op, a, b) => {
                let (Some(a), Some(b)) = (self.evaluate_item(a, frame)?, self.evaluate_item(b, frame)?) else {
                    return Ok(None);
                };
                let (Some(a), Some(b)) = (a.to_node(), b.to_node()) else {
                    return Err(Error::XPTY0004.into());
                };
                let xot = self.xot.borrow();
                let result = match op {
                    NodeComparisonOp::Is => a == b,
                    NodeComparisonOp::Precedes => self.order.compare(a, b, &xot).is_lt(),
                    NodeComparisonOp::Follows => self.order.compare(a, b, &xot).is_gt(),
                };
                result.into()
            }
            ExprKind::And(a, b) => {
                (self.effective_boolean_value(a, frame)? && self.effective_boolean_value(b, frame)?)
                    .into()
            }
            ExprKind::Or(a, b) => {
                (self.effective_boolean_value(a, frame)? || self.effective_boolean_value(b, frame)?)
                    .into()
            }
            ExprKind::Quantified {
                quantifier,
                slot,
                source,
                satisfies,
            } => {
                let every = *quantifier == Quantifier::Every;
                let mut result = every;
                for item in self.iterate(source, frame) {
                    let value = Value::from(Sequence::from(item?));
                    if self.effective_boolean_value(satisfies, &frame.with(*slot, value))? != every {
                        result = !every;
                        break;
                    }
                }
                result.into()
            }
            ExprKind::Cast {
                operand,
                target,
                optional,
            } => match self.atomize_optional(operand, frame)? {
                Some(atomic) => cast(atomic, *target)?.into(),
                None if *optional => return Ok(None),
                None => return Err(Error::XPTY0004.into()),
            },
            ExprKind::Castable {
                operand,
                target,
                optional,
            } => match self.atomize(operand, frame).collect::<SpannedResult<Vec<_>>>()?.as_slice() {
                [atomic] => castable(atomic.clone(), *target).into(),
                [] => (*optional).into(),
                _ => false.into(),
            },
            ExprKind::InstanceOf {
                operand,
                sequence_type,
            } => {
                let sequence = self.evaluate(operand, frame)?;
                self.matches_sequence_type(sequence_type, &sequence).into()
            }
            ExprKind::FirstItem(a) => return self.iterate(a, frame).next().transpose(),
            ExprKind::LastItem(a) => {
                let mut last = None;
                for item in self.iterate(a, frame) {
                    last = Some(item?);
                }
                return Ok(last);
            }
            ExprKind::ItemAt { base, index } => {
                let Some(index) = self.atomize_optional(index, frame)? else {
                    return Ok(None);
                };
                return match position_of(&index) {
                    Some(position) => self.iterate(base, frame).nth(position - 1).transpose(),
                    None => Ok(None),
                };
            }
            _ => return at_most_one(self.iterate_native(expr, frame)),
        };
        Ok(Some(item))
    }
}

/// The 1-based position a numeric predicate value selects, if any.
pub(crate) fn position_of(atomic: &Atomic) -> Option<usize> {
    if !atomic.is_numeric() {
        return None;
    }
    atomic
        .to_integer()
        .and_then(|i| usize::try_from(i).ok())
        .filter(|position| *position >= 1)
}
