use xqc_lexer::Token;

use crate::error::{Error, StaticResult};
use crate::expr::{Axis, Expr, ExprKind, NameTest, NodeTest};
use crate::location::LocationId;
use crate::types::KindTest;

use super::name::NameDefault;
use super::Parser;

impl<'a, 'c> Parser<'a, 'c> {
    /// ```text
    /// PathExpr ::= "/" RelativePathExpr?
    ///            | "//" RelativePathExpr
    ///            | RelativePathExpr
    /// ```
    ///
    /// A lone `/` is the root; whether a step follows is decided by one
    /// token of lookahead.
    pub(crate) fn parse_path(&mut self) -> StaticResult<Expr> {
        let location = self.location();
        if self.eat(&Token::Slash) {
            let root = Expr::new(ExprKind::Root, location);
            if !self.starts_step() {
                return Ok(root);
            }
            let step = self.parse_step_expr()?;
            let path = Expr::new(ExprKind::Path(root.boxed(), step.boxed()), location);
            return self.parse_relative_path(path, true);
        }
        if self.eat(&Token::DoubleSlash) {
            let root = Expr::new(ExprKind::Root, location);
            let base = descendant_or_self(root, location);
            let step = self.parse_step_expr()?;
            let path = path_step(base, step, location);
            return self.parse_relative_path(path, true);
        }
        let first = self.parse_step_expr()?;
        self.parse_relative_path(first, false)
    }

    // `sorted` tells whether a path operator has been seen already
    fn parse_relative_path(&mut self, mut current: Expr, mut sorted: bool) -> StaticResult<Expr> {
        let location = current.location;
        loop {
            let step_location = self.location();
            if self.eat(&Token::Slash) {
                let step = self.parse_step_expr()?;
                current = path_step(current, step, step_location);
            } else if self.eat(&Token::DoubleSlash) {
                let base = descendant_or_self(sorted_path(current), step_location);
                let step = self.parse_step_expr()?;
                current = path_step(base, step, step_location);
            } else {
                break;
            }
            sorted = true;
        }
        if sorted {
            Ok(Expr::new(ExprKind::DocumentSort(current.boxed()), location))
        } else {
            Ok(current)
        }
    }

    /// Can the next token begin a relative path?
    pub(crate) fn starts_step(&mut self) -> bool {
        match self.peek() {
            Some(
                Token::NCName(_)
                | Token::PrefixedQName(_)
                | Token::URIQualifiedName(_)
                | Token::LocalNameWildcard(_)
                | Token::PrefixWildcard(_)
                | Token::BracedURILiteralWildcard(_)
                | Token::Asterisk
                | Token::At
                | Token::Dot
                | Token::DotDot
                | Token::Dollar
                | Token::LeftParen
                | Token::IntegerLiteral(_)
                | Token::DecimalLiteral(_)
                | Token::DoubleLiteral(_)
                | Token::StringLiteral(_),
            ) => true,
            _ => false,
        }
    }

    fn starts_axis_step(&mut self) -> bool {
        match self.peek().cloned() {
            Some(
                Token::At
                | Token::DotDot
                | Token::Asterisk
                | Token::LocalNameWildcard(_)
                | Token::PrefixWildcard(_)
                | Token::BracedURILiteralWildcard(_),
            ) => true,
            Some(Token::NCName(_)) if self.check_nth(1, &Token::DoubleColon) => true,
            Some(Token::NCName("element")) if self.check_nth_eqname(1) => false,
            Some(Token::NCName("text")) if self.check_nth(1, &Token::LeftBrace) => false,
            Some(Token::NCName(_) | Token::PrefixedQName(_) | Token::URIQualifiedName(_)) => {
                !self.check_nth(1, &Token::LeftParen) || self.check_kind_test()
            }
            _ => false,
        }
    }

    fn parse_step_expr(&mut self) -> StaticResult<Expr> {
        if self.starts_axis_step() {
            self.parse_axis_step()
        } else {
            self.parse_postfix()
        }
    }

    /// A primary expression followed by predicates.
    fn parse_postfix(&mut self) -> StaticResult<Expr> {
        let mut expr = self.parse_primary()?;
        while self.check(&Token::LeftBracket) {
            expr = self.parse_predicate(expr)?;
        }
        Ok(expr)
    }

    /// An axis step with its predicates.
    ///
    /// For a reverse axis the predicates see the nodes in axis order, so
    /// that `preceding-sibling::*[1]` is the nearest sibling, and the result
    /// is reversed once at the end to restore document order.
    pub(crate) fn parse_axis_step(&mut self) -> StaticResult<Expr> {
        let location = self.location();
        let (axis, node_test) = self.parse_axis_and_test()?;
        let mut expr = Expr::new(ExprKind::AxisStep(axis, node_test), location);
        while self.check(&Token::LeftBracket) {
            expr = self.parse_predicate(expr)?;
        }
        if axis.is_reverse() {
            expr = Expr::new(ExprKind::Reverse(expr.boxed()), location);
        }
        Ok(expr)
    }

    pub(crate) fn parse_axis_and_test(&mut self) -> StaticResult<(Axis, NodeTest)> {
        if self.eat(&Token::At) {
            let node_test = self.parse_node_test(Axis::Attribute)?;
            return Ok((Axis::Attribute, node_test));
        }
        if self.eat(&Token::DotDot) {
            return Ok((Axis::Parent, NodeTest::Kind(KindTest::AnyNode)));
        }
        if self.check_nth(1, &Token::DoubleColon) {
            let axis = match self.peek() {
                Some(Token::NCName(name)) => Axis::by_name(name),
                _ => None,
            };
            let Some(axis) = axis else {
                return Err(self.expected("an axis name"));
            };
            self.advance();
            self.advance();
            let node_test = self.parse_node_test(axis)?;
            return Ok((axis, node_test));
        }
        let node_test = self.parse_node_test(Axis::Child)?;
        // the abbreviated axis follows an attribute or namespace kind test
        let axis = match &node_test {
            NodeTest::Kind(KindTest::Attribute(_)) => Axis::Attribute,
            NodeTest::Kind(KindTest::NamespaceNode) => Axis::Namespace,
            _ => Axis::Child,
        };
        Ok((axis, node_test))
    }

    fn parse_node_test(&mut self, axis: Axis) -> StaticResult<NodeTest> {
        if self.check_kind_test() {
            return Ok(NodeTest::Kind(self.parse_kind_test()?));
        }
        let Some(token) = self.peek().cloned() else {
            return Err(self.expected("a node test"));
        };
        let name_test = match token {
            Token::Asterisk => NameTest::Star,
            Token::LocalNameWildcard(wildcard) => {
                let lexeme = self.advance_required("a node test")?;
                let namespace = self
                    .context
                    .namespaces()
                    .by_prefix(wildcard.prefix)
                    .map(|uri| uri.to_string());
                let Some(namespace) = namespace else {
                    return Err(self.error_at(
                        Error::XPST0081,
                        &format!("namespace prefix '{}' is not declared", wildcard.prefix),
                        &lexeme,
                    ));
                };
                return Ok(NodeTest::Name(NameTest::Namespace(namespace)));
            }
            Token::PrefixWildcard(wildcard) => NameTest::LocalName(wildcard.local_name.to_string()),
            Token::BracedURILiteralWildcard(wildcard) => NameTest::Namespace(wildcard.uri.to_string()),
            _ => {
                // the principal node kind of the attribute axis has no
                // default namespace
                let default = if axis == Axis::Attribute {
                    NameDefault::None
                } else {
                    NameDefault::Element
                };
                let (name, _) = self.parse_eqname(default)?;
                return Ok(NodeTest::Name(NameTest::Name(name)));
            }
        };
        self.advance();
        Ok(NodeTest::Name(name_test))
    }

    pub(crate) fn parse_predicate(&mut self, base: Expr) -> StaticResult<Expr> {
        let location = self.location();
        self.expect(&Token::LeftBracket, "[")?;
        let predicate = self.parse_expr()?;
        self.expect(&Token::RightBracket, "]")?;
        Ok(Expr::new(
            ExprKind::Filter {
                base: base.boxed(),
                predicate: predicate.boxed(),
                positional: true,
            },
            location,
        ))
    }
}

/// `base/descendant-or-self::node()`, the expansion of `//`.
/// `E1/E2` evaluates `E2` for each node of `E1` in document order, without
/// duplicates; a left operand that is itself a path gets sorted first.
fn path_step(left: Expr, step: Expr, location: LocationId) -> Expr {
    Expr::new(
        ExprKind::Path(sorted_path(left).boxed(), step.boxed()),
        location,
    )
}

fn sorted_path(expr: Expr) -> Expr {
    if matches!(expr.kind, ExprKind::Path(..)) {
        let location = expr.location;
        Expr::new(ExprKind::DocumentSort(expr.boxed()), location)
    } else {
        expr
    }
}

pub(crate) fn descendant_or_self(base: Expr, location: LocationId) -> Expr {
    let step = Expr::new(
        ExprKind::AxisStep(
            Axis::DescendantOrSelf,
            NodeTest::Kind(KindTest::AnyNode),
        ),
        location,
    );
    Expr::new(ExprKind::Path(base.boxed(), step.boxed()), location)
}
