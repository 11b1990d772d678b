use xqc_lexer::{Lexeme, Token, TokenStream};

use crate::binding::CompileUnit;
use crate::context::StaticContext;
use crate::error::{Error, StaticError, StaticResult};
use crate::location::{Location, LocationId};

use super::Terminator;

/// Which grammar is being parsed; decides the code of syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Grammar {
    Expression,
    Pattern,
    SequenceType,
}

impl Grammar {
    fn syntax_error(self) -> Error {
        match self {
            Grammar::Expression => Error::XPST0003,
            Grammar::Pattern => Error::XTSE0340,
            Grammar::SequenceType => Error::XTSE0020,
        }
    }
}

/// Recursive descent parser over a lazily pulled token stream.
///
/// Names are resolved as they are parsed, and range variables are pushed
/// onto and popped off the compile unit's stack as binding clauses open
/// and close.
pub(crate) struct Parser<'a, 'c> {
    tokens: TokenStream<'a>,
    pub(crate) context: &'c StaticContext,
    pub(crate) unit: &'c mut CompileUnit,
    grammar: Grammar,
}

impl<'a, 'c> Parser<'a, 'c> {
    pub(crate) fn new(
        text: &'a str,
        start: usize,
        line: usize,
        context: &'c StaticContext,
        unit: &'c mut CompileUnit,
        grammar: Grammar,
    ) -> Self {
        Self {
            tokens: TokenStream::new(text, start, line),
            context,
            unit,
            grammar,
        }
    }

    pub(crate) fn peek(&mut self) -> Option<&Token<'a>> {
        self.tokens.peek().map(|lexeme| &lexeme.token)
    }

    pub(crate) fn peek_nth(&mut self, n: usize) -> Option<&Token<'a>> {
        self.tokens.peek_nth(n).map(|lexeme| &lexeme.token)
    }

    pub(crate) fn check(&mut self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    pub(crate) fn check_nth(&mut self, n: usize, token: &Token) -> bool {
        self.peek_nth(n) == Some(token)
    }

    /// Is the next token the bare name `name`?
    pub(crate) fn check_name(&mut self, name: &str) -> bool {
        self.peek().is_some_and(|token| token.is_name(name))
    }

    pub(crate) fn check_nth_name(&mut self, n: usize, name: &str) -> bool {
        self.peek_nth(n).is_some_and(|token| token.is_name(name))
    }

    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_name(&mut self, name: &str) -> bool {
        if self.check_name(name) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `token` or fail naming what was expected.
    pub(crate) fn expect(&mut self, token: &Token, display: &str) -> StaticResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.expected(&format!("'{display}'")))
        }
    }

    pub(crate) fn expect_name(&mut self, name: &str) -> StaticResult<()> {
        if self.eat_name(name) {
            Ok(())
        } else {
            Err(self.expected(&format!("'{name}'")))
        }
    }

    pub(crate) fn advance(&mut self) -> Option<Lexeme<'a>> {
        self.tokens.next_lexeme()
    }

    /// Consume the next token, failing at end of input.
    pub(crate) fn advance_required(&mut self, what: &str) -> StaticResult<Lexeme<'a>> {
        if self.peek().is_none() {
            return Err(self.expected(what));
        }
        self.advance().ok_or_else(|| self.expected(what))
    }

    pub(crate) fn expect_terminator(&mut self, terminator: Terminator) -> StaticResult<()> {
        match terminator {
            Terminator::EndOfInput => {
                if self.peek().is_some() {
                    let found = self.describe_current();
                    Err(self.syntax_error(&format!("unexpected {found}")))
                } else {
                    Ok(())
                }
            }
            Terminator::RightBrace => self.expect(&Token::RightBrace, "}"),
        }
    }

    fn describe_current(&mut self) -> String {
        match self.tokens.peek() {
            None => "end of input".to_string(),
            Some(Lexeme {
                token: Token::Error,
                text,
                ..
            }) => format!("invalid token '{text}'"),
            Some(lexeme) => format!("'{}'", lexeme.text),
        }
    }

    pub(crate) fn expected(&mut self, what: &str) -> StaticError {
        let found = self.describe_current();
        self.syntax_error(&format!("expected {what}, found {found}"))
    }

    pub(crate) fn syntax_code(&self) -> Error {
        self.grammar.syntax_error()
    }

    /// A syntax error at the current token, coded for the grammar being
    /// parsed.
    pub(crate) fn syntax_error(&mut self, message: &str) -> StaticError {
        let error = self.grammar.syntax_error();
        self.error(error, message)
    }

    /// A static error at the current token.
    pub(crate) fn error(&mut self, error: Error, message: &str) -> StaticError {
        let location = self.current_location();
        StaticError {
            error,
            message: message.to_string(),
            line: location.line,
            column: location.column,
            span: location.span,
        }
    }

    pub(crate) fn error_at(&self, error: Error, message: &str, lexeme: &Lexeme) -> StaticError {
        StaticError {
            error,
            message: message.to_string(),
            line: lexeme.line,
            column: lexeme.column,
            span: lexeme.span.clone(),
        }
    }

    fn current_location(&mut self) -> Location {
        if let Some(lexeme) = self.tokens.peek() {
            Location {
                line: lexeme.line,
                column: lexeme.column,
                span: lexeme.span.clone(),
            }
        } else {
            let (line, column) = self.tokens.end_position();
            let end = self.tokens.source().len();
            Location {
                line,
                column,
                span: end..end,
            }
        }
    }

    /// Allocate the location of the current token.
    pub(crate) fn location(&mut self) -> LocationId {
        let location = self.current_location();
        self.unit.locations.allocate(location)
    }

    pub(crate) fn warn_at(&self, message: &str, lexeme: &Lexeme) {
        self.context.warn(message, lexeme.line, lexeme.column);
    }
}
