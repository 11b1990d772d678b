use xqc_ast::{
    BuiltinFunction, CompileUnit, Dependencies, Expr, ExprKind, FunctionRef, OptimizerConfig,
    Ordering, Slot, StaticContext, StaticResult, VarRef,
};

use crate::filter;
use crate::promotion;
use crate::typecheck::TypeChecker;

/// How many times hoisting is retried after it changed the tree.
const MAX_PROMOTION_ROUNDS: usize = 8;

/// Rewrites a checked tree into a cheaper equivalent one.
///
/// Each node is rewritten after its children. A rewritten node is checked
/// again and offered for rewriting once more, since one rewrite often
/// enables another. Loop and focus invariant subexpressions are hoisted
/// afterwards, repeating while hoisting finds something.
pub struct Optimizer<'a> {
    context: &'a StaticContext,
    unit: &'a mut CompileUnit,
    config: OptimizerConfig,
}

impl<'a> Optimizer<'a> {
    pub fn new(context: &'a StaticContext, unit: &'a mut CompileUnit) -> Self {
        let config = context.optimizer();
        Optimizer {
            context,
            unit,
            config,
        }
    }

    pub fn optimize(&mut self, expr: Expr) -> StaticResult<Expr> {
        if !self.config.optimize {
            return Ok(expr);
        }
        let mut expr = self.rewrite_tree(expr)?;
        if !self.config.hoist {
            return Ok(expr);
        }
        for _ in 0..MAX_PROMOTION_ROUNDS {
            let (promoted, hoisted) = promotion::promote(expr, self.unit);
            expr = self.check(promoted)?;
            if hoisted == 0 {
                break;
            }
            tracing::debug!(hoisted, "hoisted invariant subexpressions");
            expr = self.rewrite_tree(expr)?;
        }
        Ok(expr)
    }

    fn check(&mut self, expr: Expr) -> StaticResult<Expr> {
        TypeChecker::new(self.context, self.unit).check(expr)
    }

    fn rewrite_tree(&mut self, expr: Expr) -> StaticResult<Expr> {
        let expr = expr.map_children(&mut |child| self.rewrite_tree(child))?;
        self.rewrite(expr)
    }

    fn rewrite(&mut self, expr: Expr) -> StaticResult<Expr> {
        let (rewritten, rewrite) = match &expr.kind {
            ExprKind::Filter { .. } => filter::specialize(expr, self.config.index),
            ExprKind::For { .. } => rewrite_for(expr),
            ExprKind::DocumentSort(inner) if is_redundant_sort(inner) => {
                (unordered(expr), Some("redundant sort"))
            }
            ExprKind::If { condition, .. } if is_unordered_candidate(condition) => {
                (unordered_children(expr, |i| i == 0), Some("unordered condition"))
            }
            ExprKind::And(a, b) | ExprKind::Or(a, b)
                if is_unordered_candidate(a) || is_unordered_candidate(b) =>
            {
                (unordered_children(expr, |_| true), Some("unordered operand"))
            }
            ExprKind::Quantified { source, .. } if is_unordered_candidate(source) => {
                (unordered_children(expr, |i| i == 0), Some("unordered source"))
            }
            ExprKind::FunctionCall {
                function: FunctionRef::Builtin(function),
                args,
            } if ignores_order(*function) && args.iter().any(is_unordered_candidate) => {
                (unordered_children(expr, |_| true), Some("unordered argument"))
            }
            _ => (expr, None),
        };
        match rewrite {
            None => Ok(rewritten),
            Some(rewrite) => {
                let checked = self.check(rewritten)?;
                tracing::debug!(rewrite, result = %checked, "optimized");
                self.rewrite(checked)
            }
        }
    }
}

/// Functions that only look at whether their argument has items.
fn ignores_order(function: BuiltinFunction) -> bool {
    matches!(
        function,
        BuiltinFunction::Boolean
            | BuiltinFunction::Not
            | BuiltinFunction::Empty
            | BuiltinFunction::Exists
    )
}

/// A document sort that can go without changing the result: only nodes go
/// in, so it can't raise a type error, and they already come out in order.
fn is_redundant_sort(inner: &Expr) -> bool {
    inner.info.item_type.is_node()
        && (inner.info.cardinality.at_most_one() || inner.ordering() >= Ordering::Ordered)
}

fn is_unordered_candidate(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::DocumentSort(inner) if inner.info.item_type.is_node())
}

/// Drop a document sort of nodes where only the presence of items counts.
/// Duplicates and order don't change the effective boolean value.
pub(crate) fn unordered(expr: Expr) -> Expr {
    match expr.kind {
        ExprKind::DocumentSort(inner) if inner.info.item_type.is_node() => *inner,
        kind => Expr { kind, ..expr },
    }
}

/// Apply [`unordered`] to the children selected by index.
fn unordered_children(expr: Expr, select: impl Fn(usize) -> bool) -> Expr {
    let mut index = 0;
    let result = expr.map_children(&mut |child| {
        let child = if select(index) { unordered(child) } else { child };
        index += 1;
        Ok::<_, std::convert::Infallible>(child)
    });
    match result {
        Ok(expr) => expr,
        Err(never) => match never {},
    }
}

fn rewrite_for(expr: Expr) -> (Expr, Option<&'static str>) {
    let (slot, source, action) = match expr.kind {
        ExprKind::For {
            slot,
            source,
            action,
        } => (slot, source, action),
        kind => return (Expr { kind, ..expr }, None),
    };
    let location = expr.location;
    if source.info.cardinality.is_exactly_one() {
        let rewritten = Expr::new(
            ExprKind::Let {
                slot,
                value: source,
                action,
            },
            location,
        );
        return (rewritten, Some("single item for"));
    }
    if is_step_of(slot, &action) {
        let step = strip_head(*action);
        let rewritten = Expr::new(ExprKind::Path(source, step.boxed()), location);
        return (rewritten, Some("for as path"));
    }
    let expr = Expr {
        kind: ExprKind::For {
            slot,
            source,
            action,
        },
        ..expr
    };
    (expr, None)
}

/// Is the loop body `$slot/step/...`, with no step mentioning the loop
/// variable again or asking for its position among siblings?
fn is_step_of(slot: Slot, action: &Expr) -> bool {
    let ExprKind::Path(head, step) = &action.kind else {
        return false;
    };
    let head_ok = match &head.kind {
        ExprKind::VarRef(VarRef::Range(s)) => *s == slot,
        _ => is_step_of(slot, head),
    };
    head_ok
        && !step.references_slot(slot)
        && !step
            .info
            .dependencies
            .intersects(Dependencies::POSITION | Dependencies::LAST)
}

/// Drop the leading variable of a path accepted by [`is_step_of`].
fn strip_head(action: Expr) -> Expr {
    match action.kind {
        ExprKind::Path(head, step) => match head.kind {
            ExprKind::VarRef(_) => *step,
            _ => Expr::new(
                ExprKind::Path(strip_head(*head).boxed(), step),
                action.location,
            ),
        },
        kind => Expr { kind, ..action },
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use xqc_ast::{parse_expression, OptimizerConfig, StaticContextBuilder};
    use xqc_name::Name;

    use crate::compile::compile_expr;

    use super::*;

    fn compile(text: &str, optimizer: OptimizerConfig) -> String {
        let context = StaticContextBuilder::default().optimizer(optimizer).build();
        let mut unit = CompileUnit::new();
        unit.declare_parameter(Name::unprefixed("x"), None);
        let expr = parse_expression(text, &context, &mut unit).unwrap();
        compile_expr(expr, &context, &mut unit).unwrap().to_string()
    }

    fn o(text: &str) -> String {
        compile(
            text,
            OptimizerConfig {
                hoist: false,
                ..OptimizerConfig::default()
            },
        )
    }

    #[test]
    fn test_redundant_sorts() {
        assert_snapshot!(o("/a/b"), @"(/ (/ / child::a) child::b)");
        assert_snapshot!(o("a//b"), @"(sort (/ (/ child::a descendant-or-self::node()) child::b))");
        assert_snapshot!(o("../a"), @"(/ (reverse parent::node()) child::a)");
        // atomic results must still be checked against nodes
        assert_snapshot!(o("a/string()"), @"(sort (/ child::a (string)))");
    }

    #[test]
    fn test_order_insensitive_consumers() {
        assert_snapshot!(o("exists(a//b)"), @"(exists (/ (/ child::a descendant-or-self::node()) child::b))");
        assert_snapshot!(
            o("if (a//b) then 1 else 2"),
            @"(if (/ (/ child::a descendant-or-self::node()) child::b) 1 2)"
        );
        assert_snapshot!(o("count(a//b)"), @"(count (sort (/ (/ child::a descendant-or-self::node()) child::b)))");
    }

    #[test]
    fn test_single_item_for_becomes_let() {
        assert_snapshot!(o("for $y in 1 return $y + 1"), @"(let $1 1 (+ $1 1))");
    }

    #[test]
    fn test_for_becomes_path() {
        assert_snapshot!(o("for $y in a return $y/b"), @"(/ child::a child::b)");
        assert_snapshot!(
            o("for $y in a return for $z in $y/b return $z/c"),
            @"(/ child::a (/ child::b child::c))"
        );
        assert_snapshot!(o("for $y in a return $y/b[last()]"), @"(/ child::a (last child::b))");
        assert_snapshot!(
            o("for $y in a return $y/b[. = $y]"),
            @"(for $1 child::a (/ $1 (filter child::b (= . $1))))"
        );
    }

    #[test]
    fn test_disabled_optimizer_keeps_shapes() {
        let text = "$x[1]";
        assert_snapshot!(compile(text, OptimizerConfig::disabled()), @"(filter $0 1)");
    }
}
