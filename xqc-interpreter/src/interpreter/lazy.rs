use xqc_ast::{BuiltinFunction, EvaluationMode, Expr, ExprKind, FunctionRef, VarRef};

use crate::error::{Error, SpannedResult};
use crate::frame::Frame;
use crate::sequence::Sequence;
use crate::value::{Closure, Value};

use super::{sequence_iter, Interpreter, ItemIter};

impl<'e, 'x> Interpreter<'e, 'x> {
    /// The value of an expression bound to a variable, following the
    /// evaluation mode chosen for it at compile time.
    pub(crate) fn lazy_evaluate(&self, expr: &'e Expr, frame: &Frame<'e>) -> SpannedResult<Value<'e>> {
        let value = match &expr.mode {
            EvaluationMode::ReturnEmpty => Value::empty(),
            EvaluationMode::AlreadyValue | EvaluationMode::IterateAndMaterialize => {
                self.evaluate(expr, frame)?.into()
            }
            EvaluationMode::SingleItem => self
                .evaluate_item(expr, frame)?
                .map(Sequence::from)
                .unwrap_or_else(Sequence::empty)
                .into(),
            EvaluationMode::PushProduction => self.push_production(expr, frame)?.into(),
            EvaluationMode::EvaluateVariable => match &expr.kind {
                ExprKind::VarRef(var_ref) => self.variable_value(var_ref, frame)?,
                _ => self.evaluate(expr, frame)?.into(),
            },
            EvaluationMode::MaterializeVariable => match &expr.kind {
                ExprKind::VarRef(var_ref) => {
                    let value = self.variable_value(var_ref, frame)?;
                    self.materialize(&value)?.into()
                }
                _ => self.evaluate(expr, frame)?.into(),
            },
            EvaluationMode::OneShotClosure(slots) => {
                Value::Closure(Closure::one_shot(expr, frame.capture(slots)).into())
            }
            EvaluationMode::MemoClosure(slots) => {
                Value::Closure(Closure::memo(expr, frame.capture(slots)).into())
            }
            EvaluationMode::LazyTail => match &expr.kind {
                ExprKind::Slice {
                    base,
                    min,
                    max: None,
                } => match &base.kind {
                    ExprKind::VarRef(var_ref) => self
                        .variable_value(var_ref, frame)?
                        .tail(min.saturating_sub(1)),
                    _ => self.evaluate(expr, frame)?.into(),
                },
                ExprKind::FunctionCall {
                    function: FunctionRef::Builtin(BuiltinFunction::Tail),
                    args,
                } => match args.as_slice() {
                    [Expr {
                        kind: ExprKind::VarRef(var_ref),
                        ..
                    }] => self.variable_value(var_ref, frame)?.tail(1),
                    _ => self.evaluate(expr, frame)?.into(),
                },
                _ => self.evaluate(expr, frame)?.into(),
            },
            EvaluationMode::SharedAppend => match &expr.kind {
                ExprKind::Block(items) => match items.as_slice() {
                    [Expr {
                        kind: ExprKind::VarRef(var_ref),
                        ..
                    }, rest] => {
                        let head = self.variable_value(var_ref, frame)?;
                        let head = self.materialize(&head)?;
                        let rest = self.evaluate(rest, frame)?;
                        head.append(&rest).into()
                    }
                    _ => self.evaluate(expr, frame)?.into(),
                },
                _ => self.evaluate(expr, frame)?.into(),
            },
        };
        Ok(value)
    }

    fn variable_value(&self, var_ref: &VarRef, frame: &Frame<'e>) -> SpannedResult<Value<'e>> {
        match var_ref {
            VarRef::Range(slot) => frame.get(*slot).cloned().ok_or_else(|| Error::XPDY0002.into()),
            VarRef::Global(name) => self
                .context
                .variable(name)
                .map(|sequence| Value::Sequence(sequence.clone()))
                .ok_or_else(|| Error::XPDY0002.into()),
        }
    }

    /// Items of a possibly deferred value. A one-shot closure streams;
    /// a memo closure materializes once and replays its cache.
    pub(crate) fn iterate_value(&self, value: Value<'e>) -> ItemIter<'_> {
        match value {
            Value::Sequence(sequence) => sequence_iter(sequence),
            Value::Closure(closure) if !closure.is_memo() => {
                self.iterate(closure.expr, &closure.frame)
            }
            Value::Tail(tail) => Box::new(self.iterate_value(tail.base.clone()).skip(tail.skip)),
            value => match self.materialize(&value) {
                Ok(sequence) => sequence_iter(sequence),
                Err(error) => super::error_iter(error),
            },
        }
    }

    pub(crate) fn materialize(&self, value: &Value<'e>) -> SpannedResult<Sequence> {
        match value {
            Value::Sequence(sequence) => Ok(sequence.clone()),
            Value::Closure(closure) => {
                if let Some(sequence) = closure.cached() {
                    return Ok(sequence);
                }
                let sequence = self.evaluate(closure.expr, &closure.frame)?;
                closure.remember(&sequence);
                Ok(sequence)
            }
            Value::Tail(tail) => Ok(self.materialize(&tail.base)?.skip(tail.skip)),
        }
    }
}
