use ibig::IBig;
use xqc_ast::{
    BuiltinFunction, ComparisonOp, Constant, Dependencies, Expr, ExprKind, FunctionRef, ItemType,
    LocationId,
};
use xqc_interpreter::Atomic;

use crate::optimize::unordered;

/// The positions `min..=max` (1-based) a predicate selects; `max` is
/// unbounded when `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Positions {
    min: usize,
    max: Option<usize>,
}

impl Positions {
    fn new(min: i64, max: Option<i64>) -> Self {
        let clamp = |n: i64| usize::try_from(n.max(0)).unwrap_or(usize::MAX);
        Positions {
            min: clamp(min.max(1)),
            max: max.map(clamp),
        }
    }

    fn intersect(self, other: Positions) -> Positions {
        let max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Positions {
            min: self.min.max(other.min),
            max,
        }
    }

    fn is_empty(&self) -> bool {
        self.max.is_some_and(|max| max < self.min)
    }
}

/// Rewrite a checked filter into a cheaper node when its predicate has a
/// recognizable shape. Returns the result and the name of the rewrite, or
/// the filter unchanged and `None`. A rewritten tree needs checking again.
pub(crate) fn specialize(expr: Expr, index: bool) -> (Expr, Option<&'static str>) {
    let Expr {
        kind,
        location,
        info,
        mode,
    } = expr;
    let (base, predicate, positional) = match kind {
        ExprKind::Filter {
            base,
            predicate,
            positional,
        } => (*base, *predicate, positional),
        kind => {
            let expr = Expr {
                kind,
                location,
                info,
                mode,
            };
            return (expr, None);
        }
    };

    if let Some(constant) = predicate.as_constant() {
        match constant {
            Constant::Integer(_) => {
                let positions = match Atomic::from(constant).to_integer() {
                    Some(n) => Positions::new(n, Some(n)),
                    None => Positions {
                        min: 1,
                        max: Some(0),
                    },
                };
                return (select(base, positions, location), Some("constant position"));
            }
            Constant::Boolean(_) | Constant::String(_) => {
                let keep = Atomic::from(constant)
                    .effective_boolean_value()
                    .unwrap_or(false);
                let result = if keep { base } else { Expr::empty(location) };
                return (result, Some("constant predicate"));
            }
            Constant::Decimal(_) | Constant::Double(_) => {}
        }
    }

    if let Some(positions) = positions(&predicate) {
        return (select(base, positions, location), Some("position range"));
    }

    if is_invariant_number(&predicate) {
        let rewritten = Expr::new(
            ExprKind::ItemAt {
                base: base.boxed(),
                index: predicate.boxed(),
            },
            location,
        );
        return (rewritten, Some("invariant position"));
    }

    let predicate = match split_conjunction(predicate) {
        Ok((positional, qualifier)) => {
            let inner = Expr::new(
                ExprKind::Filter {
                    base: base.boxed(),
                    predicate: positional.boxed(),
                    positional: true,
                },
                location,
            );
            let (inner, _) = specialize(inner, false);
            let rewritten = Expr::new(
                ExprKind::Filter {
                    base: inner.boxed(),
                    predicate: boolean(qualifier).boxed(),
                    positional: false,
                },
                location,
            );
            return (rewritten, Some("split positional conjunction"));
        }
        Err(predicate) => predicate,
    };

    let mut rewrite = None;
    let predicate = if positional {
        predicate
    } else {
        let is_sorted = matches!(predicate.kind, ExprKind::DocumentSort(_));
        let predicate = unordered(predicate);
        if is_sorted && !matches!(predicate.kind, ExprKind::DocumentSort(_)) {
            rewrite = Some("unordered predicate");
        }
        predicate
    };

    if index && !positional {
        if let Some((key_path, value)) = index_key(&base, &predicate) {
            let rewritten = Expr::new(
                ExprKind::IndexedFilter {
                    base: base.boxed(),
                    key_path: key_path.boxed(),
                    value: value.boxed(),
                },
                location,
            );
            return (rewritten, Some("indexed lookup"));
        }
    }

    let filter = Expr {
        kind: ExprKind::Filter {
            base: base.boxed(),
            predicate: predicate.boxed(),
            positional,
        },
        location,
        info,
        mode,
    };
    (filter, rewrite)
}

/// The cheapest node selecting `positions` out of `base`.
fn select(base: Expr, positions: Positions, location: LocationId) -> Expr {
    if positions.is_empty() {
        return Expr::empty(location);
    }
    let kind = match (positions.min, positions.max) {
        (1, None) => return base,
        (1, Some(1)) => ExprKind::FirstItem(base.boxed()),
        (min, Some(max)) if min == max => ExprKind::ItemAt {
            base: base.boxed(),
            index: Expr::constant(Constant::Integer(IBig::from(min)), location).boxed(),
        },
        (min, max) => ExprKind::Slice {
            base: base.boxed(),
            min,
            max,
        },
    };
    Expr::new(kind, location)
}

fn is_position(expr: &Expr) -> bool {
    matches!(
        &expr.kind,
        ExprKind::FunctionCall { function: FunctionRef::Builtin(BuiltinFunction::Position), args }
            if args.is_empty()
    )
}

fn integer(expr: &Expr) -> Option<i64> {
    match expr.as_constant()? {
        constant @ Constant::Integer(_) => Atomic::from(constant).to_integer(),
        _ => None,
    }
}

/// The positions selected by comparisons of `position()` with integer
/// literals, possibly joined with `and`.
fn positions(predicate: &Expr) -> Option<Positions> {
    let (op, position, other, general) = match &predicate.kind {
        ExprKind::And(a, b) => return Some(positions(a)?.intersect(positions(b)?)),
        ExprKind::GeneralComparison(op, a, b) => (*op, a, b, true),
        ExprKind::ValueComparison(op, a, b) => (*op, a, b, false),
        _ => return None,
    };
    let (op, other) = if is_position(position) {
        (op, other)
    } else if is_position(other) {
        (op.inverse(), position)
    } else {
        return None;
    };
    if let ExprKind::Range(low, high) = &other.kind {
        // `position() = (2 to 4)` holds for any position in the range
        if general && op == ComparisonOp::Eq {
            return Some(Positions::new(integer(low)?, Some(integer(high)?)));
        }
        return None;
    }
    let n = integer(other)?;
    Some(match op {
        ComparisonOp::Eq => Positions::new(n, Some(n)),
        ComparisonOp::Lt => Positions::new(1, Some(n.saturating_sub(1))),
        ComparisonOp::Le => Positions::new(1, Some(n)),
        ComparisonOp::Gt => Positions::new(n.saturating_add(1), None),
        ComparisonOp::Ge => Positions::new(n, None),
        ComparisonOp::Ne => return None,
    })
}

/// A single number that stays the same for every item of the base.
fn is_invariant_number(predicate: &Expr) -> bool {
    matches!(&predicate.info.item_type, ItemType::Atomic(xs) if xs.is_numeric())
        && predicate.info.cardinality.is_exactly_one()
        && !predicate.info.depends_on_focus()
        && !predicate.info.creates_nodes
}

fn explicitly_positional(expr: &Expr) -> bool {
    expr.info
        .dependencies
        .intersects(Dependencies::POSITION | Dependencies::LAST)
}

/// Split `A and B` where exactly one side mentions `position()` or
/// `last()` into that side and the other. A number on the positional side
/// is only a truth value here, so it is converted explicitly.
fn split_conjunction(predicate: Expr) -> Result<(Expr, Expr), Expr> {
    let (a, b) = match predicate.kind {
        ExprKind::And(a, b) => (a, b),
        kind => return Err(Expr { kind, ..predicate }),
    };
    let (positional, qualifier) = match (explicitly_positional(&a), explicitly_positional(&b)) {
        (true, false) => (*a, *b),
        (false, true) => (*b, *a),
        _ => {
            return Err(Expr {
                kind: ExprKind::And(a, b),
                ..predicate
            })
        }
    };
    let positional = if positional.info.item_type.may_be_numeric() {
        boolean(positional)
    } else {
        positional
    };
    Ok((positional, qualifier))
}

fn boolean(expr: Expr) -> Expr {
    let location = expr.location;
    Expr::new(
        ExprKind::FunctionCall {
            function: FunctionRef::Builtin(BuiltinFunction::Boolean),
            args: vec![expr],
        },
        location,
    )
}

/// For `base[key = value]`: the key path and the lookup value, when the
/// base is an absolute path that is the same wherever it is evaluated in a
/// document, the key is a path from each base item, and the value does
/// not depend on the focus.
fn index_key(base: &Expr, predicate: &Expr) -> Option<(Expr, Expr)> {
    let ExprKind::GeneralComparison(ComparisonOp::Eq, a, b) = &predicate.kind else {
        return None;
    };
    let base_ok = is_absolute(base)
        && base.free_slots().is_empty()
        && !base.info.creates_nodes
        && Dependencies::CONTEXT_ITEM.contains(base.info.dependencies);
    if !base_ok {
        return None;
    }
    if is_key_path(a) && is_lookup_value(b) {
        Some(((**a).clone(), (**b).clone()))
    } else if is_key_path(b) && is_lookup_value(a) {
        Some(((**b).clone(), (**a).clone()))
    } else {
        None
    }
}

fn is_absolute(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Root => true,
        ExprKind::DocumentSort(a)
        | ExprKind::Path(a, _)
        | ExprKind::Filter { base: a, .. }
        | ExprKind::FirstItem(a)
        | ExprKind::LastItem(a)
        | ExprKind::ItemAt { base: a, .. }
        | ExprKind::Slice { base: a, .. }
        | ExprKind::IndexedFilter { base: a, .. } => is_absolute(a),
        _ => false,
    }
}

fn is_key_path(expr: &Expr) -> bool {
    fn leftmost(expr: &Expr) -> &Expr {
        match &expr.kind {
            ExprKind::DocumentSort(a)
            | ExprKind::Path(a, _)
            | ExprKind::Reverse(a)
            | ExprKind::Filter { base: a, .. } => leftmost(a),
            _ => expr,
        }
    }
    expr.info.dependencies == Dependencies::CONTEXT_ITEM
        && !expr.info.creates_nodes
        && expr.free_slots().is_empty()
        && matches!(
            leftmost(expr).kind,
            ExprKind::AxisStep(..) | ExprKind::ContextItem
        )
}

fn is_lookup_value(expr: &Expr) -> bool {
    !expr.info.depends_on_focus() && !expr.info.creates_nodes
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use xqc_ast::{parse_expression, CompileUnit, OptimizerConfig, StaticContextBuilder};
    use xqc_name::Name;

    use crate::compile::compile_expr;

    fn o(text: &str) -> String {
        let context = StaticContextBuilder::default()
            .optimizer(OptimizerConfig {
                hoist: false,
                ..OptimizerConfig::default()
            })
            .build();
        let mut unit = CompileUnit::new();
        unit.declare_parameter(Name::unprefixed("x"), None);
        unit.declare_parameter(Name::unprefixed("i"), None);
        let expr = parse_expression(text, &context, &mut unit).unwrap();
        compile_expr(expr, &context, &mut unit).unwrap().to_string()
    }

    #[test]
    fn test_constant_positions() {
        assert_snapshot!(o("$x[1]"), @"(first $0)");
        assert_snapshot!(o("$x[3]"), @"(item-at $0 3)");
        assert_snapshot!(o("$x[0]"), @"()");
        assert_snapshot!(o("$x[-1]"), @"()");
        assert_snapshot!(o("$x['yes']"), @"$0");
        // never equal to a position
        assert_snapshot!(o("$x[1.5]"), @"(item-at $0 1.5)");
    }

    #[test]
    fn test_position_ranges() {
        assert_snapshot!(o("$x[position() > 2]"), @"(slice $0 3 ..)");
        assert_snapshot!(o("$x[position() <= 2]"), @"(slice $0 1 2)");
        assert_snapshot!(o("$x[3 >= position()]"), @"(slice $0 1 3)");
        assert_snapshot!(o("$x[position() = 2]"), @"(item-at $0 2)");
        assert_snapshot!(o("$x[position() = (2 to 4)]"), @"(slice $0 2 4)");
        assert_snapshot!(
            o("$x[position() ge 2 and position() lt 5]"),
            @"(slice $0 2 4)"
        );
        assert_snapshot!(o("$x[position() < 1]"), @"()");
        assert_snapshot!(o("$x[position() != 2]"), @"(filter $0 (!= (position) 2))");
    }

    #[test]
    fn test_invariant_position() {
        assert_snapshot!(o("$x[count($x) - 1]"), @"(item-at $0 (- (count $0) 1))");
        // the type of $i is unknown, so it may not be a number at all
        assert_snapshot!(o("$x[$i]"), @"(filter $0 $1)");
        assert_snapshot!(o("$x[$i + 1]"), @"(filter $0 (+ $1 1))");
    }

    #[test]
    fn test_split_positional_conjunction() {
        assert_snapshot!(
            o("$x[position() > 1 and . = 'a']"),
            @r#"(filter (slice $0 2 ..) (boolean (= . "a")))"#
        );
        assert_snapshot!(
            o("$x[. = 'a' and last()]"),
            @r#"(filter (filter $0 (boolean (last))) (boolean (= . "a")))"#
        );
    }

    #[test]
    fn test_steps_in_paths() {
        assert_snapshot!(o("a/b[1]"), @"(/ child::a (first child::b))");
        assert_snapshot!(o("a[last()]"), @"(last child::a)");
    }

    #[test]
    fn test_indexed_lookup() {
        // the predicate applies per parent here, so there is no single base
        assert_snapshot!(
            o("/r/item[@id = $i]"),
            @"(/ (/ / child::r) (filter child::item (= attribute::id $1)))"
        );
        assert_snapshot!(
            o("(/r/item)[@id = $i]"),
            @"(index (/ (/ / child::r) child::item) attribute::id $1)"
        );
        // a relative base is scanned
        assert_snapshot!(
            o("$x[@id = 'a']"),
            @r#"(filter $0 (= attribute::id "a"))"#
        );
    }
}
