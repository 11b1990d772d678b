use xqc_lexer::Token;

use crate::error::StaticResult;
use crate::expr::{Axis, Expr, ExprKind, FunctionRef, NodeTest};
use crate::function::BuiltinFunction;
use crate::location::LocationId;
use crate::pattern::{Pattern, PatternAlternative, PatternShape};
use crate::types::KindTest;

use super::axis_node_test::descendant_or_self;
use super::Parser;

/// How the first step of a path pattern is anchored.
enum Anchor {
    /// `a/b`: anywhere below the root of the node's tree.
    Relative,
    /// `/a`
    Root,
    /// `//a`
    RootDescendant,
    /// `id(..)/a`, `key(..)//a`
    Rooted(Expr),
}

impl<'a, 'c> Parser<'a, 'c> {
    /// ```text
    /// Pattern ::= PathPattern (("|" | "union") PathPattern)*
    /// ```
    pub(crate) fn parse_pattern(&mut self) -> StaticResult<Pattern> {
        let mut alternatives = vec![self.parse_path_pattern()?];
        while self.eat(&Token::Pipe) || self.eat_name("union") {
            alternatives.push(self.parse_path_pattern()?);
        }
        Ok(Pattern { alternatives })
    }

    fn parse_path_pattern(&mut self) -> StaticResult<PatternAlternative> {
        let location = self.location();
        if self.check(&Token::Dot) {
            return self.parse_predicate_pattern();
        }
        let anchor = if self.eat(&Token::Slash) {
            if !self.starts_step() {
                return Ok(PatternAlternative {
                    shape: PatternShape::DocumentRoot,
                    expr: document_root(location),
                });
            }
            Anchor::Root
        } else if self.eat(&Token::DoubleSlash) {
            Anchor::RootDescendant
        } else if self.check_name("id") || self.check_name("key") {
            if !self.check_nth(1, &Token::LeftParen) {
                Anchor::Relative
            } else {
                let mut rooted = self.parse_primary()?;
                while self.check(&Token::LeftBracket) {
                    rooted = self.parse_predicate(rooted)?;
                }
                if !(self.check(&Token::Slash) || self.check(&Token::DoubleSlash)) {
                    return Ok(PatternAlternative {
                        shape: PatternShape::Path,
                        expr: rooted,
                    });
                }
                Anchor::Rooted(rooted)
            }
        } else {
            Anchor::Relative
        };

        let relative = matches!(anchor, Anchor::Relative);
        let mut expr = match anchor {
            Anchor::Relative => descendant_or_self(root_of_context(location), location),
            Anchor::Root => document_root(location),
            Anchor::RootDescendant => descendant_or_self(document_root(location), location),
            Anchor::Rooted(rooted) => {
                let step_location = self.location();
                if self.eat(&Token::DoubleSlash) {
                    descendant_or_self(rooted, step_location)
                } else {
                    self.expect(&Token::Slash, "/")?;
                    rooted
                }
            }
        };

        let (first, first_shape) = self.parse_step_pattern()?;
        expr = Expr::new(ExprKind::Path(expr.boxed(), first.boxed()), location);
        let mut steps = 1;
        loop {
            let step_location = self.location();
            let descendant = if self.eat(&Token::Slash) {
                false
            } else if self.eat(&Token::DoubleSlash) {
                true
            } else {
                break;
            };
            if descendant {
                expr = descendant_or_self(expr, step_location);
            }
            let (step, _) = self.parse_step_pattern()?;
            expr = Expr::new(ExprKind::Path(expr.boxed(), step.boxed()), step_location);
            steps += 1;
        }

        let shape = match first_shape {
            Some(shape) if relative && steps == 1 => shape,
            _ => PatternShape::Path,
        };
        Ok(PatternAlternative { shape, expr })
    }

    /// `.` followed by predicates, matching any item the predicates accept.
    fn parse_predicate_pattern(&mut self) -> StaticResult<PatternAlternative> {
        let location = self.location();
        self.expect(&Token::Dot, ".")?;
        let mut expr = Expr::new(ExprKind::ContextItem, location);
        let mut predicates = 0;
        while self.check(&Token::LeftBracket) {
            expr = self.parse_predicate(expr)?;
            predicates += 1;
        }
        Ok(PatternAlternative {
            shape: PatternShape::Predicate { predicates },
            expr,
        })
    }

    /// A step restricted to forward axes. Also returns the step's shape
    /// when it is a plain child or attribute step.
    fn parse_step_pattern(&mut self) -> StaticResult<(Expr, Option<PatternShape>)> {
        let location = self.location();
        let has_axis = self.check_nth(1, &Token::DoubleColon);
        let axis_name = match self.peek() {
            Some(Token::NCName(name)) if has_axis => Some(name.to_string()),
            _ => None,
        };
        if let Some(axis_name) = axis_name {
            let allowed = matches!(
                Axis::by_name(&axis_name),
                Some(
                    Axis::Child
                        | Axis::Descendant
                        | Axis::Attribute
                        | Axis::Self_
                        | Axis::DescendantOrSelf
                        | Axis::Namespace
                )
            );
            if !allowed {
                return Err(
                    self.syntax_error(&format!("axis {axis_name} is not allowed in a pattern"))
                );
            }
        } else if !self.starts_pattern_step() {
            return Err(self.expected("a step pattern"));
        }
        let (axis, node_test) = self.parse_axis_and_test()?;
        let mut expr = Expr::new(ExprKind::AxisStep(axis, node_test.clone()), location);
        let mut predicates = 0;
        while self.check(&Token::LeftBracket) {
            expr = self.parse_predicate(expr)?;
            predicates += 1;
        }
        let shape = matches!(axis, Axis::Child | Axis::Attribute).then_some(PatternShape::Step {
            axis,
            node_test,
            predicates,
        });
        Ok((expr, shape))
    }

    fn starts_pattern_step(&mut self) -> bool {
        match self.peek() {
            Some(
                Token::At
                | Token::Asterisk
                | Token::NCName(_)
                | Token::PrefixedQName(_)
                | Token::URIQualifiedName(_)
                | Token::LocalNameWildcard(_)
                | Token::PrefixWildcard(_)
                | Token::BracedURILiteralWildcard(_),
            ) => true,
            _ => false,
        }
    }
}

/// `root(.)`
fn root_of_context(location: LocationId) -> Expr {
    Expr::new(
        ExprKind::FunctionCall {
            function: FunctionRef::Builtin(BuiltinFunction::Root),
            args: Vec::new(),
        },
        location,
    )
}

/// `root(.)/self::document-node()`
fn document_root(location: LocationId) -> Expr {
    let step = Expr::new(
        ExprKind::AxisStep(Axis::Self_, NodeTest::Kind(KindTest::Document(None))),
        location,
    );
    Expr::new(
        ExprKind::Path(root_of_context(location).boxed(), step.boxed()),
        location,
    )
}
