use std::convert::Infallible;

use xqc_ast::{BuiltinFunction, Constant, Expr, ExprKind, FunctionRef, Quantifier};
use xqc_interpreter::{arithmetic, compare_values, negate, plus, Atomic};

/// Context-independent rewrites, applied bottom-up: constant folding,
/// `[last()]`, operations over an already empty source, and flattening of
/// nested comma sequences.
///
/// Running it twice gives the same tree as running it once.
pub fn simplify(expr: Expr) -> Expr {
    let expr = match expr.map_children(&mut |child| Ok::<_, Infallible>(simplify(child))) {
        Ok(expr) => expr,
        Err(never) => match never {},
    };
    rewrite(expr)
}

fn rewrite(expr: Expr) -> Expr {
    let location = expr.location;
    match expr.kind {
        ExprKind::FunctionCall {
            function: FunctionRef::Builtin(function @ (BuiltinFunction::True | BuiltinFunction::False)),
            args,
        } if args.is_empty() => {
            Expr::constant(Constant::Boolean(function == BuiltinFunction::True), location)
        }
        ExprKind::Arithmetic(op, a, b) => {
            match fold2(&a, &b, |a, b| arithmetic(op, a, b).ok()) {
                Some(constant) => Expr::constant(constant, location),
                None => Expr {
                    kind: ExprKind::Arithmetic(op, a, b),
                    ..expr
                },
            }
        }
        ExprKind::Negate(a) => {
            let folded = a
                .as_constant()
                .and_then(|c| negate(Atomic::from(c)).ok())
                .and_then(|atomic| atomic.to_constant());
            match folded {
                Some(constant) => Expr::constant(constant, location),
                None => Expr {
                    kind: ExprKind::Negate(a),
                    ..expr
                },
            }
        }
        ExprKind::Plus(a) => {
            let folded = a
                .as_constant()
                .and_then(|c| plus(Atomic::from(c)).ok())
                .and_then(|atomic| atomic.to_constant());
            match folded {
                Some(constant) => Expr::constant(constant, location),
                None => Expr {
                    kind: ExprKind::Plus(a),
                    ..expr
                },
            }
        }
        ExprKind::ValueComparison(op, a, b) => {
            let folded = fold2(&a, &b, |a, b| compare_values(op, a, b).ok().map(Atomic::from));
            match folded {
                Some(constant) => Expr::constant(constant, location),
                None => Expr {
                    kind: ExprKind::ValueComparison(op, a, b),
                    ..expr
                },
            }
        }
        ExprKind::And(a, b) => match (constant_truth(&a), constant_truth(&b)) {
            (Some(false), _) => boolean(false, location),
            (Some(true), Some(b)) => boolean(b, location),
            _ => Expr {
                kind: ExprKind::And(a, b),
                ..expr
            },
        },
        ExprKind::Or(a, b) => match (constant_truth(&a), constant_truth(&b)) {
            (Some(true), _) => boolean(true, location),
            (Some(false), Some(b)) => boolean(b, location),
            _ => Expr {
                kind: ExprKind::Or(a, b),
                ..expr
            },
        },
        ExprKind::If {
            condition,
            then,
            otherwise,
        } => match constant_truth(&condition) {
            Some(true) => *then,
            Some(false) => *otherwise,
            None => Expr {
                kind: ExprKind::If {
                    condition,
                    then,
                    otherwise,
                },
                ..expr
            },
        },
        ExprKind::Filter { base, .. } if base.is_empty_literal() => *base,
        ExprKind::Filter {
            base, predicate, ..
        } if is_last_call(&predicate) => Expr::new(ExprKind::LastItem(base), location),
        ExprKind::Path(base, _) if base.is_empty_literal() => *base,
        ExprKind::For { source, .. } if source.is_empty_literal() => *source,
        ExprKind::Quantified {
            quantifier, source, ..
        } if source.is_empty_literal() => boolean(quantifier == Quantifier::Every, location),
        ExprKind::DocumentSort(inner)
            if inner.is_empty_literal() || matches!(inner.kind, ExprKind::DocumentSort(_)) =>
        {
            *inner
        }
        ExprKind::FirstItem(base) | ExprKind::LastItem(base) if base.is_empty_literal() => *base,
        ExprKind::Block(items) => flatten(items, location),
        kind => Expr { kind, ..expr },
    }
}

fn boolean(value: bool, location: xqc_ast::LocationId) -> Expr {
    Expr::constant(Constant::Boolean(value), location)
}

fn fold2(a: &Expr, b: &Expr, f: impl FnOnce(Atomic, Atomic) -> Option<Atomic>) -> Option<Constant> {
    let a = Atomic::from(a.as_constant()?);
    let b = Atomic::from(b.as_constant()?);
    f(a, b)?.to_constant()
}

/// The effective boolean value of a literal, when it is known without
/// running anything.
fn constant_truth(expr: &Expr) -> Option<bool> {
    match &expr.kind {
        ExprKind::Literal(constants) => match constants.as_slice() {
            [] => Some(false),
            [constant] => Atomic::from(constant).effective_boolean_value().ok(),
            _ => None,
        },
        _ => None,
    }
}

fn is_last_call(expr: &Expr) -> bool {
    matches!(
        &expr.kind,
        ExprKind::FunctionCall { function: FunctionRef::Builtin(BuiltinFunction::Last), args }
            if args.is_empty()
    )
}

/// Splice nested sequences into one and merge adjacent literals. Children
/// are already simplified, so a nested block is itself flat.
fn flatten(items: Vec<Expr>, location: xqc_ast::LocationId) -> Expr {
    let mut flat = Vec::with_capacity(items.len());
    for item in items {
        push_flat(&mut flat, item);
    }
    if flat.len() <= 1 {
        return flat.pop().unwrap_or_else(|| Expr::empty(location));
    }
    Expr::new(ExprKind::Block(flat), location)
}

fn push_flat(flat: &mut Vec<Expr>, item: Expr) {
    match item.kind {
        ExprKind::Block(items) => {
            for item in items {
                push_flat(flat, item);
            }
        }
        ExprKind::Literal(constants) => {
            if constants.is_empty() {
                return;
            }
            if let Some(Expr {
                kind: ExprKind::Literal(previous),
                ..
            }) = flat.last_mut()
            {
                previous.extend(constants);
                return;
            }
            flat.push(Expr {
                kind: ExprKind::Literal(constants),
                ..item
            });
        }
        kind => flat.push(Expr { kind, ..item }),
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use xqc_ast::{parse_expression, CompileUnit, StaticContextBuilder};

    use super::*;

    fn parse(text: &str) -> Expr {
        let context = StaticContextBuilder::default().build();
        parse_expression(text, &context, &mut CompileUnit::new()).unwrap()
    }

    fn s(text: &str) -> String {
        simplify(parse(text)).to_string()
    }

    #[test]
    fn test_constant_folding() {
        assert_snapshot!(s("2 + 3 * 4"), @"14");
        assert_snapshot!(s("-(1 + 1)"), @"-2");
        assert_snapshot!(s("1 eq 1"), @"true()");
        assert_snapshot!(s("a + 1 * 2"), @"(+ child::a 2)");
        assert_snapshot!(s("+(1 + 1)"), @"2");
        assert_snapshot!(s("+a"), @"(+ child::a)");
    }

    #[test]
    fn test_dynamic_error_is_not_folded() {
        assert_snapshot!(s("1 idiv 0"), @"(idiv 1 0)");
    }

    #[test]
    fn test_constant_conditions() {
        assert_snapshot!(s("if (true()) then 1 else a"), @"1");
        assert_snapshot!(s("if ('') then a else 2"), @"2");
        assert_snapshot!(s("false() and a"), @"false()");
        assert_snapshot!(s("a or 1"), @"(or child::a 1)");
    }

    #[test]
    fn test_last_predicate() {
        assert_snapshot!(s("a[last()]"), @"(last child::a)");
        assert_snapshot!(s("()[1]"), @"()");
    }

    #[test]
    fn test_flatten_sequences() {
        assert_snapshot!(s("(1, (2, 3), ())"), @"(1, 2, 3)");
        assert_snapshot!(s("(1, (2, a), 3)"), @"(, (1, 2) child::a 3)");
        assert_snapshot!(s("((), ())"), @"()");
    }

    #[test]
    fn test_idempotent() {
        let sources = [
            "1 + 2 * 3",
            "(1, (2, a), (3, (4, ())))",
            "for $x in (1, (2, 3)) return ($x, ($x, 1))",
            "a[last()][1]",
            "if (1 = 1) then (1, ()) else a",
            "some $x in () satisfies $x",
            "/a//b[position() > 2]",
            "-(-(1))",
            "(a, 1)[2]",
            "true() and (false() or a)",
        ];
        for source in sources {
            let once = simplify(parse(source));
            let twice = simplify(once.clone());
            assert_eq!(once, twice, "{source}");
        }
    }
}
