use ordered_float::OrderedFloat;
use xqc_lexer::{Lexeme, Token};
use xqc_name::{Name, FN_NAMESPACE, XS_NAMESPACE};

use crate::binding::{BindingKind, Slot};
use crate::error::{Error, StaticResult};
use crate::expr::{Constant, Expr, ExprKind, FunctionRef, Quantifier, VarRef};
use crate::function::BuiltinFunction;
use crate::location::LocationId;
use crate::types::SequenceType;

use super::name::NameDefault;
use super::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingClause {
    For,
    Let,
    Some,
    Every,
}

struct Clause {
    slot: Slot,
    source: Expr,
    location: LocationId,
}

impl<'a, 'c> Parser<'a, 'c> {
    pub(crate) fn parse_primary(&mut self) -> StaticResult<Expr> {
        let location = self.location();
        let Some(token) = self.peek().cloned() else {
            return Err(self.expected("an expression"));
        };
        let constant = match &token {
            Token::IntegerLiteral(value) => Some(Constant::Integer(value.clone())),
            Token::DecimalLiteral(value) => Some(Constant::Decimal(*value)),
            Token::DoubleLiteral(value) => Some(Constant::Double(OrderedFloat(*value))),
            Token::StringLiteral(value) => Some(Constant::String(value.to_string())),
            _ => None,
        };
        if let Some(constant) = constant {
            self.advance();
            return Ok(Expr::constant(constant, location));
        }
        match &token {
            Token::Dollar => self.parse_var_ref(),
            Token::LeftParen => self.parse_parenthesized(),
            Token::Dot => {
                self.advance();
                Ok(Expr::new(ExprKind::ContextItem, location))
            }
            Token::NCName("element") if self.check_computed_element() => {
                self.parse_element_constructor()
            }
            Token::NCName("text") if self.check_nth(1, &Token::LeftBrace) => {
                self.advance();
                let content = self.parse_enclosed()?;
                Ok(Expr::new(
                    ExprKind::TextConstructor(content.boxed()),
                    location,
                ))
            }
            _ if self.check_eqname() && self.check_nth(1, &Token::LeftParen) => {
                self.parse_function_call()
            }
            _ => Err(self.expected("an expression")),
        }
    }

    fn parse_var_ref(&mut self) -> StaticResult<Expr> {
        let location = self.location();
        self.expect(&Token::Dollar, "$")?;
        let (name, lexeme) = self.parse_eqname(NameDefault::None)?;
        if let Some(slot) = self.unit.ranges.lookup(&name) {
            return Ok(Expr::new(ExprKind::VarRef(VarRef::Range(slot)), location));
        }
        if self.context.variable_type(&name).is_some() {
            return Ok(Expr::new(ExprKind::VarRef(VarRef::Global(name)), location));
        }
        Err(self.error_at(
            Error::XPST0008,
            &format!("variable ${name} is not declared"),
            &lexeme,
        ))
    }

    fn parse_parenthesized(&mut self) -> StaticResult<Expr> {
        let location = self.location();
        self.expect(&Token::LeftParen, "(")?;
        if self.eat(&Token::RightParen) {
            return Ok(Expr::empty(location));
        }
        let expr = self.parse_expr()?;
        self.expect(&Token::RightParen, ")")?;
        Ok(expr)
    }

    fn parse_enclosed(&mut self) -> StaticResult<Expr> {
        let location = self.location();
        self.expect(&Token::LeftBrace, "{")?;
        if self.eat(&Token::RightBrace) {
            return Ok(Expr::empty(location));
        }
        let expr = self.parse_expr()?;
        self.expect(&Token::RightBrace, "}")?;
        Ok(expr)
    }

    fn check_computed_element(&mut self) -> bool {
        self.check_nth_eqname(1) && self.check_nth(2, &Token::LeftBrace)
    }

    fn parse_element_constructor(&mut self) -> StaticResult<Expr> {
        let location = self.location();
        self.expect_name("element")?;
        let (name, _) = self.parse_eqname(NameDefault::Element)?;
        let content = self.parse_enclosed()?;
        Ok(Expr::new(
            ExprKind::ElementConstructor {
                name,
                content: content.boxed(),
            },
            location,
        ))
    }

    fn parse_function_call(&mut self) -> StaticResult<Expr> {
        let location = self.location();
        let (name, lexeme) = self.parse_eqname(NameDefault::Function)?;
        self.expect(&Token::LeftParen, "(")?;
        let mut args = Vec::new();
        if !self.eat(&Token::RightParen) {
            loop {
                args.push(self.parse_expr_single()?);
                if self.eat(&Token::RightParen) {
                    break;
                }
                self.expect(&Token::Comma, ",")?;
            }
        }

        // constructor functions are casts
        if name.namespace() == Some(XS_NAMESPACE) && args.len() == 1 {
            let target = self.resolve_cast_target(&name, &lexeme)?;
            let operand = args.remove(0);
            return Ok(Expr::new(
                ExprKind::Cast {
                    operand: operand.boxed(),
                    target,
                    optional: true,
                },
                location,
            ));
        }

        let arity = args.len();
        let builtin = if name.namespace() == Some(FN_NAMESPACE) {
            BuiltinFunction::lookup(name.local_name(), arity)
        } else {
            None
        };
        let function = match builtin {
            Some(builtin) => FunctionRef::Builtin(builtin),
            None => self.unknown_function(name, arity, &lexeme)?,
        };
        Ok(Expr::new(ExprKind::FunctionCall { function, args }, location))
    }

    fn unknown_function(
        &self,
        name: Name,
        arity: usize,
        lexeme: &Lexeme,
    ) -> StaticResult<FunctionRef> {
        let message = format!("unknown function {name}#{arity}");
        if self.context.backwards_compatible() {
            self.warn_at(&format!("{message}; calling it will fail"), lexeme);
            Ok(FunctionRef::Unresolved(name))
        } else {
            Err(self.error_at(Error::XPST0017, &message, lexeme))
        }
    }

    pub(crate) fn parse_if(&mut self) -> StaticResult<Expr> {
        let location = self.location();
        self.expect_name("if")?;
        self.expect(&Token::LeftParen, "(")?;
        let condition = self.parse_expr()?;
        self.expect(&Token::RightParen, ")")?;
        self.expect_name("then")?;
        let then = self.parse_expr_single()?;
        self.expect_name("else")?;
        let otherwise = self.parse_expr_single()?;
        Ok(Expr::new(
            ExprKind::If {
                condition: condition.boxed(),
                then: then.boxed(),
                otherwise: otherwise.boxed(),
            },
            location,
        ))
    }

    /// `for`, `let`, `some` and `every` share one production: a list of
    /// binding clauses followed by a single action.
    ///
    /// Each variable comes into scope after its own source, so later
    /// clauses can see earlier ones. The clauses are unwound innermost
    /// first, so the last clause wraps the action and the first clause
    /// wraps everything.
    pub(crate) fn parse_binding_expr(&mut self) -> StaticResult<Expr> {
        let keyword = if self.eat_name("for") {
            BindingClause::For
        } else if self.eat_name("let") {
            BindingClause::Let
        } else if self.eat_name("some") {
            BindingClause::Some
        } else {
            self.expect_name("every")?;
            BindingClause::Every
        };

        let mark = self.unit.ranges.mark();
        let mut clauses = Vec::new();
        let result = self.parse_clauses(keyword, &mut clauses);
        for _ in 0..clauses.len() {
            self.unit.ranges.pop();
        }
        // a failed parse may have left a half-declared clause on the stack
        self.unit.ranges.restore(mark);
        let mut expr = result?;

        for clause in clauses.into_iter().rev() {
            let Clause {
                slot,
                source,
                location,
            } = clause;
            let kind = match keyword {
                BindingClause::For => ExprKind::For {
                    slot,
                    source: source.boxed(),
                    action: expr.boxed(),
                },
                BindingClause::Let => ExprKind::Let {
                    slot,
                    value: source.boxed(),
                    action: expr.boxed(),
                },
                BindingClause::Some | BindingClause::Every => ExprKind::Quantified {
                    quantifier: if keyword == BindingClause::Some {
                        Quantifier::Some
                    } else {
                        Quantifier::Every
                    },
                    slot,
                    source: source.boxed(),
                    satisfies: expr.boxed(),
                },
            };
            expr = Expr::new(kind, location);
        }
        Ok(expr)
    }

    // returns the action; the clauses are collected into `clauses`
    fn parse_clauses(
        &mut self,
        keyword: BindingClause,
        clauses: &mut Vec<Clause>,
    ) -> StaticResult<Expr> {
        loop {
            let location = self.location();
            self.expect(&Token::Dollar, "$")?;
            let (name, _) = self.parse_eqname(NameDefault::None)?;
            let declared = if matches!(keyword, BindingClause::For | BindingClause::Let)
                && self.check_name("as")
            {
                self.advance();
                Some(self.parse_sequence_type()?)
            } else {
                None
            };
            if keyword == BindingClause::Let {
                self.expect(&Token::ColonEqual, ":=")?;
            } else {
                self.expect_name("in")?;
            }
            let source = self.parse_expr_single()?;
            let slot = self.declare(name, declared);
            clauses.push(Clause {
                slot,
                source,
                location,
            });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        match keyword {
            BindingClause::For | BindingClause::Let => self.expect_name("return")?,
            BindingClause::Some | BindingClause::Every => self.expect_name("satisfies")?,
        }
        self.parse_expr_single()
    }

    fn declare(&mut self, name: Name, declared: Option<SequenceType>) -> Slot {
        let slot = self
            .unit
            .bindings
            .allocate(name.clone(), BindingKind::Range, declared);
        self.unit.ranges.push(name, slot);
        slot
    }
}
