use xqc_lexer::Token;

use crate::error::StaticResult;
use crate::expr::{
    ArithmeticOp, ComparisonOp, Constant, Expr, ExprKind, FunctionRef, NodeComparisonOp, SetOp,
};
use crate::function::BuiltinFunction;

use super::Parser;

enum Comparison {
    Value(ComparisonOp),
    General(ComparisonOp),
    Node(NodeComparisonOp),
}

impl<'a, 'c> Parser<'a, 'c> {
    /// `Expr ::= ExprSingle ("," ExprSingle)*`
    pub(crate) fn parse_expr(&mut self) -> StaticResult<Expr> {
        let location = self.location();
        let first = self.parse_expr_single()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            items.push(self.parse_expr_single()?);
        }
        Ok(Expr::new(ExprKind::Block(items), location))
    }

    pub(crate) fn parse_expr_single(&mut self) -> StaticResult<Expr> {
        let binds_variable = self.check_nth(1, &Token::Dollar);
        if binds_variable
            && (self.check_name("for")
                || self.check_name("let")
                || self.check_name("some")
                || self.check_name("every"))
        {
            return self.parse_binding_expr();
        }
        if self.check_name("if") && self.check_nth(1, &Token::LeftParen) {
            return self.parse_if();
        }
        self.parse_or()
    }

    fn parse_or(&mut self) -> StaticResult<Expr> {
        let mut left = self.parse_and()?;
        while self.check_name("or") {
            let location = self.location();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::new(ExprKind::Or(left.boxed(), right.boxed()), location);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> StaticResult<Expr> {
        let mut left = self.parse_comparison()?;
        while self.check_name("and") {
            let location = self.location();
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::new(ExprKind::And(left.boxed(), right.boxed()), location);
        }
        Ok(left)
    }

    // comparisons do not chain: `a = b = c` is a syntax error
    fn parse_comparison(&mut self) -> StaticResult<Expr> {
        let left = self.parse_string_concat()?;
        let Some(comparison) = self.comparison_operator() else {
            return Ok(left);
        };
        let location = self.location();
        self.advance();
        let right = self.parse_string_concat()?;
        let (left, right) = (left.boxed(), right.boxed());
        let kind = match comparison {
            Comparison::Value(op) => ExprKind::ValueComparison(op, left, right),
            Comparison::General(op) => ExprKind::GeneralComparison(op, left, right),
            Comparison::Node(op) => ExprKind::NodeComparison(op, left, right),
        };
        Ok(Expr::new(kind, location))
    }

    fn comparison_operator(&mut self) -> Option<Comparison> {
        let comparison = match self.peek()? {
            Token::Equal => Comparison::General(ComparisonOp::Eq),
            Token::NotEqual => Comparison::General(ComparisonOp::Ne),
            Token::LessThan => Comparison::General(ComparisonOp::Lt),
            Token::LessThanEqual => Comparison::General(ComparisonOp::Le),
            Token::GreaterThan => Comparison::General(ComparisonOp::Gt),
            Token::GreaterThanEqual => Comparison::General(ComparisonOp::Ge),
            Token::Precedes => Comparison::Node(NodeComparisonOp::Precedes),
            Token::Follows => Comparison::Node(NodeComparisonOp::Follows),
            Token::NCName("eq") => Comparison::Value(ComparisonOp::Eq),
            Token::NCName("ne") => Comparison::Value(ComparisonOp::Ne),
            Token::NCName("lt") => Comparison::Value(ComparisonOp::Lt),
            Token::NCName("le") => Comparison::Value(ComparisonOp::Le),
            Token::NCName("gt") => Comparison::Value(ComparisonOp::Gt),
            Token::NCName("ge") => Comparison::Value(ComparisonOp::Ge),
            Token::NCName("is") => Comparison::Node(NodeComparisonOp::Is),
            _ => return None,
        };
        Some(comparison)
    }

    /// `a || b || c` becomes `concat(a, b, c)`.
    fn parse_string_concat(&mut self) -> StaticResult<Expr> {
        let first = self.parse_range()?;
        if !self.check(&Token::DoublePipe) {
            return Ok(first);
        }
        let location = self.location();
        let mut args = vec![first];
        while self.eat(&Token::DoublePipe) {
            args.push(self.parse_range()?);
        }
        Ok(Expr::new(
            ExprKind::FunctionCall {
                function: FunctionRef::Builtin(BuiltinFunction::Concat),
                args,
            },
            location,
        ))
    }

    fn parse_range(&mut self) -> StaticResult<Expr> {
        let left = self.parse_additive()?;
        if !self.check_name("to") {
            return Ok(left);
        }
        let location = self.location();
        self.advance();
        let right = self.parse_additive()?;
        Ok(Expr::new(
            ExprKind::Range(left.boxed(), right.boxed()),
            location,
        ))
    }

    fn parse_additive(&mut self) -> StaticResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithmeticOp::Add,
                Some(Token::Minus) => ArithmeticOp::Subtract,
                _ => return Ok(left),
            };
            let location = self.location();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::new(
                ExprKind::Arithmetic(op, left.boxed(), right.boxed()),
                location,
            );
        }
    }

    // in operator position `*` is multiplication, never a wildcard
    fn parse_multiplicative(&mut self) -> StaticResult<Expr> {
        let mut left = self.parse_union()?;
        loop {
            let op = match self.peek() {
                Some(Token::Asterisk) => ArithmeticOp::Multiply,
                Some(Token::NCName("div")) => ArithmeticOp::Divide,
                Some(Token::NCName("idiv")) => ArithmeticOp::IntegerDivide,
                Some(Token::NCName("mod")) => ArithmeticOp::Modulo,
                _ => return Ok(left),
            };
            let location = self.location();
            self.advance();
            let right = self.parse_union()?;
            left = Expr::new(
                ExprKind::Arithmetic(op, left.boxed(), right.boxed()),
                location,
            );
        }
    }

    fn parse_union(&mut self) -> StaticResult<Expr> {
        let mut left = self.parse_intersect_except()?;
        while self.check(&Token::Pipe) || self.check_name("union") {
            let location = self.location();
            self.advance();
            let right = self.parse_intersect_except()?;
            left = Expr::new(
                ExprKind::SetOperation(SetOp::Union, left.boxed(), right.boxed()),
                location,
            );
        }
        Ok(left)
    }

    fn parse_intersect_except(&mut self) -> StaticResult<Expr> {
        let mut left = self.parse_instance_of()?;
        loop {
            let op = if self.check_name("intersect") {
                SetOp::Intersect
            } else if self.check_name("except") {
                SetOp::Except
            } else {
                return Ok(left);
            };
            let location = self.location();
            self.advance();
            let right = self.parse_instance_of()?;
            left = Expr::new(
                ExprKind::SetOperation(op, left.boxed(), right.boxed()),
                location,
            );
        }
    }

    fn parse_instance_of(&mut self) -> StaticResult<Expr> {
        let operand = self.parse_treat()?;
        if !(self.check_name("instance") && self.check_nth_name(1, "of")) {
            return Ok(operand);
        }
        let location = self.location();
        self.advance();
        self.advance();
        let sequence_type = self.parse_sequence_type()?;
        Ok(Expr::new(
            ExprKind::InstanceOf {
                operand: operand.boxed(),
                sequence_type,
            },
            location,
        ))
    }

    fn parse_treat(&mut self) -> StaticResult<Expr> {
        let operand = self.parse_castable()?;
        if !(self.check_name("treat") && self.check_nth_name(1, "as")) {
            return Ok(operand);
        }
        let location = self.location();
        self.advance();
        self.advance();
        let sequence_type = self.parse_sequence_type()?;
        Ok(Expr::new(
            ExprKind::Treat {
                operand: operand.boxed(),
                sequence_type,
            },
            location,
        ))
    }

    fn parse_castable(&mut self) -> StaticResult<Expr> {
        let operand = self.parse_cast()?;
        if !(self.check_name("castable") && self.check_nth_name(1, "as")) {
            return Ok(operand);
        }
        let location = self.location();
        self.advance();
        self.advance();
        let (target, optional) = self.parse_single_type()?;
        Ok(Expr::new(
            ExprKind::Castable {
                operand: operand.boxed(),
                target,
                optional,
            },
            location,
        ))
    }

    fn parse_cast(&mut self) -> StaticResult<Expr> {
        let operand = self.parse_unary()?;
        if !(self.check_name("cast") && self.check_nth_name(1, "as")) {
            return Ok(operand);
        }
        let location = self.location();
        self.advance();
        self.advance();
        let (target, optional) = self.parse_single_type()?;
        Ok(Expr::new(
            ExprKind::Cast {
                operand: operand.boxed(),
                target,
                optional,
            },
            location,
        ))
    }

    fn parse_unary(&mut self) -> StaticResult<Expr> {
        let location = self.location();
        let mut negate = false;
        let mut signed = false;
        loop {
            match self.peek() {
                Some(Token::Minus) => negate = !negate,
                Some(Token::Plus) => {}
                _ => break,
            }
            self.advance();
            signed = true;
        }
        let operand = self.parse_path()?;
        let numeric_literal = matches!(
            operand.as_constant(),
            Some(Constant::Integer(_) | Constant::Decimal(_) | Constant::Double(_))
        );
        let kind = if negate {
            ExprKind::Negate(operand.boxed())
        } else if signed && !numeric_literal {
            ExprKind::Plus(operand.boxed())
        } else {
            return Ok(operand);
        };
        Ok(Expr::new(kind, location))
    }
}
