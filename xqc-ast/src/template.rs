use crate::binding::CompileUnit;
use crate::context::StaticContext;
use crate::error::{Error, StaticError, StaticResult};
use crate::expr::{Constant, Expr, ExprKind, FunctionRef};
use crate::function::BuiltinFunction;
use crate::location::{Location, LocationId};
use crate::parser::{parse, Terminator};
use crate::scanner::scan;

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

/// A value template such as `a{$x}b{{c}}`: fixed text with enclosed
/// expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTemplate {
    pub parts: Vec<TemplatePart>,
    pub location: LocationId,
}

/// Parse a value template.
///
/// Each enclosed expression is first scanned to find its closing brace and
/// then parsed for real. The range-variable stack is saved before and
/// restored after each enclosed expression.
pub fn parse_value_template(
    text: &str,
    line: usize,
    context: &StaticContext,
    unit: &mut CompileUnit,
) -> StaticResult<ValueTemplate> {
    let location = unit.locations.allocate(Location {
        line,
        column: 1,
        span: 0..text.len(),
    });
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut offset = 0;
    while let Some(c) = text[offset..].chars().next() {
        match c {
            '{' if text[offset + 1..].starts_with('{') => {
                literal.push('{');
                offset += 2;
            }
            '}' if text[offset + 1..].starts_with('}') => {
                literal.push('}');
                offset += 2;
            }
            '{' => {
                if !literal.is_empty() {
                    parts.push(TemplatePart::Text(std::mem::take(&mut literal)));
                }
                let start = offset + 1;
                let expr_line = line + text[..start].matches('\n').count();
                let end = scan(text, start, Terminator::RightBrace, expr_line)?;
                if !text[start..end].trim().is_empty() {
                    let mark = unit.ranges.mark();
                    let result = parse(
                        text,
                        start,
                        Terminator::RightBrace,
                        expr_line,
                        context,
                        unit,
                    );
                    unit.ranges.restore(mark);
                    parts.push(TemplatePart::Expr(result?));
                }
                offset = end + 1;
            }
            '}' => {
                let column = text[..offset]
                    .rsplit('\n')
                    .next()
                    .map_or(0, |l| l.chars().count())
                    + 1;
                return Err(StaticError {
                    error: Error::XPST0003,
                    message: "'}' must be written as '}}' in a value template".to_string(),
                    line: line + text[..offset].matches('\n').count(),
                    column,
                    span: offset..offset + 1,
                });
            }
            c => {
                literal.push(c);
                offset += c.len_utf8();
            }
        }
    }
    if !literal.is_empty() {
        parts.push(TemplatePart::Text(literal));
    }
    Ok(ValueTemplate { parts, location })
}

impl ValueTemplate {
    /// The template as a single string-valued expression. Each enclosed
    /// expression contributes its atomized values joined by spaces.
    pub fn into_expr(self) -> Expr {
        let location = self.location;
        let mut args: Vec<Expr> = self
            .parts
            .into_iter()
            .map(|part| match part {
                TemplatePart::Text(text) => Expr::constant(Constant::String(text), location),
                TemplatePart::Expr(expr) => {
                    let data = call(BuiltinFunction::Data, vec![expr], location);
                    let separator = Expr::constant(Constant::String(" ".to_string()), location);
                    call(BuiltinFunction::StringJoin, vec![data, separator], location)
                }
            })
            .collect();
        match args.len() {
            0 => Expr::constant(Constant::String(String::new()), location),
            1 => args.remove(0),
            _ => call(BuiltinFunction::Concat, args, location),
        }
    }
}

fn call(function: BuiltinFunction, args: Vec<Expr>, location: LocationId) -> Expr {
    Expr::new(
        ExprKind::FunctionCall {
            function: FunctionRef::Builtin(function),
            args,
        },
        location,
    )
}

#[cfg(test)]
mod tests {
    use xqc_name::Name;

    use super::*;
    use crate::context::StaticContextBuilder;
    use crate::expr::VarRef;

    #[test]
    fn test_text_and_escapes() {
        let context = StaticContextBuilder::default().build();
        let mut unit = CompileUnit::new();
        let template = parse_value_template("a{{b}}c", 1, &context, &mut unit).unwrap();
        assert_eq!(template.parts, vec![TemplatePart::Text("a{b}c".to_string())]);
    }

    #[test]
    fn test_enclosed_expressions_see_parameters() {
        let context = StaticContextBuilder::default().build();
        let mut unit = CompileUnit::new();
        let slot = unit.declare_parameter(Name::unprefixed("x"), None);
        let template = parse_value_template("v={$x}!", 1, &context, &mut unit).unwrap();
        assert_eq!(template.parts.len(), 3);
        let TemplatePart::Expr(expr) = &template.parts[1] else {
            panic!("expected an expression part");
        };
        assert_eq!(expr.kind, ExprKind::VarRef(VarRef::Range(slot)));
        // the stack is as it was
        assert_eq!(unit.ranges.depth(), 1);
    }

    #[test]
    fn test_bindings_do_not_leak_between_expressions() {
        let context = StaticContextBuilder::default().build();
        let mut unit = CompileUnit::new();
        let error = parse_value_template(
            "{for $i in 1 to 2 return $i}{$i}",
            1,
            &context,
            &mut unit,
        )
        .unwrap_err();
        assert_eq!(error.error, Error::XPST0008);
        assert_eq!(unit.ranges.depth(), 0);
    }

    #[test]
    fn test_lone_closing_brace() {
        let context = StaticContextBuilder::default().build();
        let error = parse_value_template("a}b", 1, &context, &mut CompileUnit::new()).unwrap_err();
        assert_eq!(error.error, Error::XPST0003);
        assert_eq!(error.column, 2);
    }

    #[test]
    fn test_into_expr() {
        let context = StaticContextBuilder::default().build();
        let mut unit = CompileUnit::new();
        let template = parse_value_template("a{1}", 1, &context, &mut unit).unwrap();
        assert!(template.into_expr().is_call_to(BuiltinFunction::Concat));
    }
}
