use std::collections::BTreeSet;

use xqc_ast::{BindingKind, CompileUnit, Expr, ExprKind, Slot, VarRef};
use xqc_name::Name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OfferKind {
    /// The body of a `for` or a quantifier, evaluated once per item.
    LoopInvariant,
    /// A predicate or path step, evaluated once per focus item.
    FocusInvariant,
}

/// Collects the subexpressions of one body that can be evaluated once,
/// outside it.
struct PromotionOffer {
    kind: OfferKind,
    /// Slots bound between the site and the subexpression being looked at.
    forbidden: BTreeSet<Slot>,
    accepted: Vec<(Slot, Expr)>,
}

impl PromotionOffer {
    fn new(kind: OfferKind, forbidden: impl IntoIterator<Item = Slot>) -> Self {
        PromotionOffer {
            kind,
            forbidden: forbidden.into_iter().collect(),
            accepted: Vec::new(),
        }
    }

    fn accepts(&self, expr: &Expr) -> bool {
        !is_trivial(expr)
            && !expr.info.depends_on_focus()
            && !expr.info.creates_nodes
            && expr.free_slots().is_disjoint(&self.forbidden)
    }

    /// Replace every maximal acceptable subexpression of `expr` by a
    /// reference to a fresh hoisted binding.
    fn collect(&mut self, expr: Expr, unit: &mut CompileUnit) -> Expr {
        if self.accepts(&expr) {
            let location = expr.location;
            let slot = unit
                .bindings
                .allocate(Name::unprefixed("hoisted"), BindingKind::Hoisted, None);
            unit.bindings.get_mut(slot).inferred = expr.info.sequence_type();
            self.accepted.push((slot, expr));
            return Expr::new(ExprKind::VarRef(VarRef::Range(slot)), location);
        }
        match expr.kind {
            // a binding hoisted out of an inner site moves out further
            // instead of getting rebound
            ExprKind::Let {
                slot,
                value,
                action,
            } if unit.bindings.get(slot).kind == BindingKind::Hoisted && self.accepts(&value) => {
                self.accepted.push((slot, *value));
                self.collect(*action, unit)
            }
            kind => {
                let bound = match &kind {
                    ExprKind::For { slot, .. }
                    | ExprKind::Let { slot, .. }
                    | ExprKind::Quantified { slot, .. } => Some(*slot),
                    _ => None,
                };
                let fresh = bound.is_some_and(|slot| self.forbidden.insert(slot));
                let expr = Expr { kind, ..expr };
                let result = expr.map_children(&mut |child| {
                    Ok::<_, std::convert::Infallible>(self.collect(child, unit))
                });
                if let (true, Some(slot)) = (fresh, bound) {
                    self.forbidden.remove(&slot);
                }
                match result {
                    Ok(expr) => expr,
                    Err(never) => match never {},
                }
            }
        }
    }

    /// Wrap the site in the accepted bindings, first accepted outermost.
    fn wrap(self, site: Expr) -> Expr {
        let location = site.location;
        let kind = self.kind;
        self.accepted
            .into_iter()
            .rev()
            .fold(site, |action, (slot, value)| {
                tracing::debug!(?kind, slot = slot.0, %value, "hoisted");
                Expr::new(
                    ExprKind::Let {
                        slot,
                        value: value.boxed(),
                        action: action.boxed(),
                    },
                    location,
                )
            })
    }
}

fn is_trivial(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Literal(_) | ExprKind::VarRef(_) | ExprKind::ContextItem | ExprKind::Root
    )
}

/// Move loop- and focus-invariant subexpressions out of the bodies that
/// would evaluate them repeatedly. Returns the rewritten tree and how many
/// bindings were hoisted.
///
/// Hoisted bindings are evaluated lazily and at most once, so an
/// expression that raises an error, or sits in a branch that is never
/// taken, behaves as it did before.
pub(crate) fn promote(expr: Expr, unit: &mut CompileUnit) -> (Expr, usize) {
    let mut hoisted = 0;
    let expr = visit(expr, unit, &mut hoisted);
    (expr, hoisted)
}

fn visit(expr: Expr, unit: &mut CompileUnit, hoisted: &mut usize) -> Expr {
    let expr = match expr.map_children(&mut |child| {
        Ok::<_, std::convert::Infallible>(visit(child, unit, hoisted))
    }) {
        Ok(expr) => expr,
        Err(never) => match never {},
    };
    let (offer, site) = match expr.kind {
        ExprKind::For {
            slot,
            source,
            action,
        } => {
            let mut offer = PromotionOffer::new(OfferKind::LoopInvariant, [slot]);
            let action = offer.collect(*action, unit);
            let site = ExprKind::For {
                slot,
                source,
                action: action.boxed(),
            };
            (offer, site)
        }
        ExprKind::Quantified {
            quantifier,
            slot,
            source,
            satisfies,
        } => {
            let mut offer = PromotionOffer::new(OfferKind::LoopInvariant, [slot]);
            let satisfies = offer.collect(*satisfies, unit);
            let site = ExprKind::Quantified {
                quantifier,
                slot,
                source,
                satisfies: satisfies.boxed(),
            };
            (offer, site)
        }
        ExprKind::Filter {
            base,
            predicate,
            positional,
        } => {
            let mut offer = PromotionOffer::new(OfferKind::FocusInvariant, []);
            // hoisting the whole predicate gains nothing
            let predicate = if offer.accepts(&predicate) {
                *predicate
            } else {
                offer.collect(*predicate, unit)
            };
            let site = ExprKind::Filter {
                base,
                predicate: predicate.boxed(),
                positional,
            };
            (offer, site)
        }
        ExprKind::Path(head, step) => {
            let mut offer = PromotionOffer::new(OfferKind::FocusInvariant, []);
            let step = offer.collect(*step, unit);
            (offer, ExprKind::Path(head, step.boxed()))
        }
        kind => return Expr { kind, ..expr },
    };
    let site = Expr { kind: site, ..expr };
    if offer.accepted.is_empty() {
        return site;
    }
    *hoisted += offer.accepted.len();
    offer.wrap(site)
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use xqc_ast::{parse_expression, StaticContextBuilder};

    use crate::compile::compile_expr;

    use super::*;

    fn h(text: &str) -> String {
        let context = StaticContextBuilder::default().build();
        let mut unit = CompileUnit::new();
        unit.declare_parameter(Name::unprefixed("x"), None);
        let expr = parse_expression(text, &context, &mut unit).unwrap();
        compile_expr(expr, &context, &mut unit).unwrap().to_string()
    }

    #[test]
    fn test_loop_invariant_hoisted() {
        assert_snapshot!(
            h("for $y in (1, 2, 3) return $y + count($x)"),
            @"(let $2 (count $0) (for $1 (1, 2, 3) (+ $1 $2)))"
        );
    }

    #[test]
    fn test_predicate_invariant_hoisted() {
        assert_snapshot!(
            h("$x[. = count($x)]"),
            @"(let $1 (count $0) (filter $0 (= . $1)))"
        );
    }

    #[test]
    fn test_nested_loops_hoist_to_outermost() {
        assert_snapshot!(
            h("for $a in (1, 2) return for $b in (3, 4) return $a + $b + count($x)"),
            @"(let $3 (count $0) (for $1 (1, 2) (for $2 (3, 4) (+ (+ $1 $2) $3))))"
        );
    }

    #[test]
    fn test_loop_variable_blocks_hoisting() {
        assert_snapshot!(
            h("for $y in (1, 2) return count(($y, $x))"),
            @"(for $1 (1, 2) (count (, $1 $0)))"
        );
    }

    #[test]
    fn test_focus_and_construction_stay() {
        assert_snapshot!(
            h("for $y in (1, 2) return $y + count(a)"),
            @"(for $1 (1, 2) (+ $1 (count child::a)))"
        );
        assert_snapshot!(
            h("for $y in (1, 2) return element e { 1 }"),
            @"(for $1 (1, 2) (element e 1))"
        );
    }

    #[test]
    fn test_hoisted_bindings_typed() {
        let context = StaticContextBuilder::default().build();
        let mut unit = CompileUnit::new();
        unit.declare_parameter(Name::unprefixed("x"), None);
        let expr = parse_expression(
            "for $y in (1, 2, 3) return $y + count($x)",
            &context,
            &mut unit,
        )
        .unwrap();
        compile_expr(expr, &context, &mut unit).unwrap();
        let (_, binding) = unit
            .bindings
            .iter()
            .find(|(_, b)| b.kind == BindingKind::Hoisted)
            .unwrap();
        assert_eq!(binding.inferred.to_string(), "xs:integer");
    }
}
