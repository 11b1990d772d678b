mod axis_node_test;
mod kind_test;
mod name;
mod operators;
mod parser_core;
mod pattern;
mod primary;
mod types;

use crate::binding::CompileUnit;
use crate::context::StaticContext;
use crate::error::StaticResult;
use crate::expr::Expr;
use crate::pattern::Pattern;
use crate::types::{Cardinality, ItemType};

pub(crate) use parser_core::{Grammar, Parser};

/// What must follow an expression for the parse to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// The expression runs to the end of the text.
    EndOfInput,
    /// The expression is closed by `}`, as inside a value template.
    RightBrace,
}

/// Parse the expression in `text` starting at byte offset `start`.
///
/// `line` is the line number of `start` in the enclosing document, so
/// reported positions line up with the host file. Range variables
/// declared on `unit` before the call are in scope; the unit's range stack
/// is left exactly as it was found, whether or not the parse succeeds.
pub fn parse(
    text: &str,
    start: usize,
    terminator: Terminator,
    line: usize,
    context: &StaticContext,
    unit: &mut CompileUnit,
) -> StaticResult<Expr> {
    let mark = unit.ranges.mark();
    let mut parser = Parser::new(text, start, line, context, unit, Grammar::Expression);
    let result = parser.parse_expr().and_then(|expr| {
        parser.expect_terminator(terminator)?;
        Ok(expr)
    });
    unit.ranges.restore(mark);
    result
}

/// Parse a standalone expression.
pub fn parse_expression(
    text: &str,
    context: &StaticContext,
    unit: &mut CompileUnit,
) -> StaticResult<Expr> {
    parse(text, 0, Terminator::EndOfInput, 1, context, unit)
}

/// Parse a match pattern.
pub fn parse_pattern(
    text: &str,
    context: &StaticContext,
    unit: &mut CompileUnit,
) -> StaticResult<Pattern> {
    let mark = unit.ranges.mark();
    let mut parser = Parser::new(text, 0, 1, context, unit, Grammar::Pattern);
    let result = parser.parse_pattern().and_then(|pattern| {
        parser.expect_terminator(Terminator::EndOfInput)?;
        Ok(pattern)
    });
    unit.ranges.restore(mark);
    result
}

/// Parse a sequence type such as `xs:integer*` or `element(a)?`.
pub fn parse_sequence_type(
    text: &str,
    context: &StaticContext,
) -> StaticResult<(ItemType, Cardinality)> {
    let mut unit = CompileUnit::new();
    let mut parser = Parser::new(text, 0, 1, context, &mut unit, Grammar::SequenceType);
    let sequence_type = parser.parse_sequence_type()?;
    parser.expect_terminator(Terminator::EndOfInput)?;
    Ok((sequence_type.item_type, sequence_type.cardinality))
}
