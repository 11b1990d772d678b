mod analysis;
mod binding;
mod context;
mod display;
mod error;
mod expr;
mod function;
mod location;
mod parser;
mod pattern;
mod scanner;
mod template;
mod types;

pub use analysis::{Dependencies, EvaluationMode, Methods, Ordering, StaticInfo};
pub use binding::{
    Binding, BindingKind, BindingTable, CompileUnit, RangeMark, RangeVariables, Slot,
};
pub use context::{
    Diagnostic, DiagnosticSink, OptimizerConfig, StaticContext, StaticContextBuilder, TracingSink,
};
pub use error::{Error, StaticError, StaticResult};
pub use expr::{
    ArithmeticOp, Axis, ComparisonOp, Constant, Expr, ExprKind, FunctionRef, NameTest,
    NodeComparisonOp, NodeTest, Quantifier, SetOp, VarRef,
};
pub use function::{BuiltinFunction, Signature};
pub use location::{Location, LocationId, LocationMap};
pub use parser::{parse, parse_expression, parse_pattern, parse_sequence_type, Terminator};
pub use pattern::{Pattern, PatternAlternative, PatternShape};
pub use scanner::scan;
pub use template::{parse_value_template, TemplatePart, ValueTemplate};
pub use types::{Cardinality, ElementTest, ItemType, KindTest, SequenceType, FOREIGN_NAMESPACE};
