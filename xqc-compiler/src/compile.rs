use xqc_ast::{
    parse_expression, parse_pattern, parse_value_template, BindingKind, CompileUnit, Expr,
    Pattern, StaticContext, StaticResult, TemplatePart, ValueTemplate,
};
use xqc_interpreter::Program;

use crate::optimize::Optimizer;
use crate::simplify::simplify;
use crate::strategy::assign_modes;
use crate::typecheck::TypeChecker;

/// Parse and compile an expression into a program.
///
/// Host parameters must already be declared in `unit`; they become the
/// program's parameters.
pub fn compile(text: &str, context: &StaticContext, mut unit: CompileUnit) -> StaticResult<Program> {
    let expr = parse_expression(text, context, &mut unit)?;
    compile_program(expr, context, unit)
}

/// Compile an already parsed expression into a program.
pub fn compile_program(
    expr: Expr,
    context: &StaticContext,
    mut unit: CompileUnit,
) -> StaticResult<Program> {
    let expr = compile_expr(expr, context, &mut unit)?;
    let parameters = unit
        .bindings
        .iter()
        .filter(|(_, binding)| binding.kind == BindingKind::Parameter)
        .map(|(slot, binding)| (binding.name.clone(), slot))
        .collect();
    // optimization may have allocated slots, so size the frame last
    let frame_size = unit.frame_size();
    Ok(Program {
        parameters,
        ..Program::new(expr, frame_size, unit.locations)
    })
}

/// Run the passes over a parsed tree: simplify, type check, optimize and
/// choose evaluation modes.
pub fn compile_expr(
    expr: Expr,
    context: &StaticContext,
    unit: &mut CompileUnit,
) -> StaticResult<Expr> {
    let expr = simplify(expr);
    let expr = TypeChecker::new(context, unit).check(expr)?;
    let expr = Optimizer::new(context, unit).optimize(expr)?;
    Ok(assign_modes(expr, &unit.bindings))
}

/// Parse a match pattern and compile the expression of each alternative.
pub fn compile_pattern(
    text: &str,
    context: &StaticContext,
    unit: &mut CompileUnit,
) -> StaticResult<Pattern> {
    let pattern = parse_pattern(text, context, unit)?;
    let alternatives = pattern
        .alternatives
        .into_iter()
        .map(|mut alternative| {
            alternative.expr = compile_expr(alternative.expr, context, unit)?;
            Ok(alternative)
        })
        .collect::<StaticResult<_>>()?;
    Ok(Pattern { alternatives })
}

/// Parse a value template and compile its enclosed expressions.
pub fn compile_value_template(
    text: &str,
    line: usize,
    context: &StaticContext,
    unit: &mut CompileUnit,
) -> StaticResult<ValueTemplate> {
    let template = parse_value_template(text, line, context, unit)?;
    let parts = template
        .parts
        .into_iter()
        .map(|part| match part {
            TemplatePart::Expr(expr) => Ok(TemplatePart::Expr(compile_expr(expr, context, unit)?)),
            text => Ok(text),
        })
        .collect::<StaticResult<_>>()?;
    Ok(ValueTemplate { parts, ..template })
}
