use std::fmt;

use crate::expr::{
    ArithmeticOp, ComparisonOp, Constant, Expr, ExprKind, FunctionRef, NameTest,
    NodeComparisonOp, NodeTest, Quantifier, SetOp,
};

// Compact prefix rendering of an expression tree, used in tests and by
// the command line `--explain` flag. Range variables show as their slot.

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Boolean(value) => write!(f, "{value}()"),
            Constant::Integer(value) => write!(f, "{value}"),
            Constant::Decimal(value) => write!(f, "{value}"),
            Constant::Double(value) => write!(f, "{}e0", value.0),
            Constant::String(value) => write!(f, "{value:?}"),
        }
    }
}

impl fmt::Display for NameTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameTest::Name(name) => write!(f, "{name}"),
            NameTest::Star => write!(f, "*"),
            NameTest::LocalName(local_name) => write!(f, "*:{local_name}"),
            NameTest::Namespace(uri) => write!(f, "Q{{{uri}}}*"),
        }
    }
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeTest::Name(name_test) => write!(f, "{name_test}"),
            NodeTest::Kind(kind_test) => write!(f, "{kind_test}"),
        }
    }
}

fn arithmetic_symbol(op: ArithmeticOp) -> &'static str {
    match op {
        ArithmeticOp::Add => "+",
        ArithmeticOp::Subtract => "-",
        ArithmeticOp::Multiply => "*",
        ArithmeticOp::Divide => "div",
        ArithmeticOp::IntegerDivide => "idiv",
        ArithmeticOp::Modulo => "mod",
    }
}

fn comparison_symbol(op: ComparisonOp, general: bool) -> &'static str {
    match (op, general) {
        (ComparisonOp::Eq, true) => "=",
        (ComparisonOp::Ne, true) => "!=",
        (ComparisonOp::Lt, true) => "<",
        (ComparisonOp::Le, true) => "<=",
        (ComparisonOp::Gt, true) => ">",
        (ComparisonOp::Ge, true) => ">=",
        (ComparisonOp::Eq, false) => "eq",
        (ComparisonOp::Ne, false) => "ne",
        (ComparisonOp::Lt, false) => "lt",
        (ComparisonOp::Le, false) => "le",
        (ComparisonOp::Gt, false) => "gt",
        (ComparisonOp::Ge, false) => "ge",
    }
}

fn node_comparison_symbol(op: NodeComparisonOp) -> &'static str {
    match op {
        NodeComparisonOp::Is => "is",
        NodeComparisonOp::Precedes => "<<",
        NodeComparisonOp::Follows => ">>",
    }
}

fn set_symbol(op: SetOp) -> &'static str {
    match op {
        SetOp::Union => "union",
        SetOp::Intersect => "intersect",
        SetOp::Except => "except",
    }
}

struct List<'e>(&'e [Expr]);

impl fmt::Display for List<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for expr in self.0 {
            write!(f, " {expr}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ExprKind::*;
        match &self.kind {
            Literal(constants) => match constants.as_slice() {
                [] => write!(f, "()"),
                [constant] => write!(f, "{constant}"),
                constants => {
                    write!(f, "(")?;
                    for (i, constant) in constants.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{constant}")?;
                    }
                    write!(f, ")")
                }
            },
            VarRef(crate::expr::VarRef::Range(slot)) => write!(f, "${}", slot.0),
            VarRef(crate::expr::VarRef::Global(name)) => write!(f, "${name}"),
            ContextItem => write!(f, "."),
            Root => write!(f, "/"),
            Arithmetic(op, a, b) => write!(f, "({} {a} {b})", arithmetic_symbol(*op)),
            Negate(a) => write!(f, "(- {a})"),
            Plus(a) => write!(f, "(+ {a})"),
            ValueComparison(op, a, b) => write!(f, "({} {a} {b})", comparison_symbol(*op, false)),
            GeneralComparison(op, a, b) => {
                write!(f, "({} {a} {b})", comparison_symbol(*op, true))
            }
            NodeComparison(op, a, b) => write!(f, "({} {a} {b})", node_comparison_symbol(*op)),
            And(a, b) => write!(f, "(and {a} {b})"),
            Or(a, b) => write!(f, "(or {a} {b})"),
            Range(a, b) => write!(f, "(to {a} {b})"),
            SetOperation(op, a, b) => write!(f, "({} {a} {b})", set_symbol(*op)),
            Block(items) => write!(f, "(,{})", List(items)),
            If {
                condition,
                then,
                otherwise,
            } => write!(f, "(if {condition} {then} {otherwise})"),
            For {
                slot,
                source,
                action,
            } => write!(f, "(for ${} {source} {action})", slot.0),
            Let {
                slot,
                value,
                action,
            } => write!(f, "(let ${} {value} {action})", slot.0),
            Quantified {
                quantifier,
                slot,
                source,
                satisfies,
            } => {
                let keyword = match quantifier {
                    Quantifier::Some => "some",
                    Quantifier::Every => "every",
                };
                write!(f, "({keyword} ${} {source} {satisfies})", slot.0)
            }
            Path(a, b) => write!(f, "(/ {a} {b})"),
            DocumentSort(a) => write!(f, "(sort {a})"),
            AxisStep(axis, node_test) => write!(f, "{}::{node_test}", axis.name()),
            Reverse(a) => write!(f, "(reverse {a})"),
            Filter {
                base, predicate, ..
            } => write!(f, "(filter {base} {predicate})"),
            FirstItem(a) => write!(f, "(first {a})"),
            LastItem(a) => write!(f, "(last {a})"),
            ItemAt { base, index } => write!(f, "(item-at {base} {index})"),
            Slice { base, min, max } => match max {
                Some(max) => write!(f, "(slice {base} {min} {max})"),
                None => write!(f, "(slice {base} {min} ..)"),
            },
            IndexedFilter {
                base,
                key_path,
                value,
            } => write!(f, "(index {base} {key_path} {value})"),
            Cast {
                operand,
                target,
                optional,
            } => write!(
                f,
                "(cast {operand} xs:{}{})",
                target.local_name(),
                if *optional { "?" } else { "" }
            ),
            Castable {
                operand,
                target,
                optional,
            } => write!(
                f,
                "(castable {operand} xs:{}{})",
                target.local_name(),
                if *optional { "?" } else { "" }
            ),
            Treat {
                operand,
                sequence_type,
            } => write!(f, "(treat {operand} {sequence_type})"),
            InstanceOf {
                operand,
                sequence_type,
            } => write!(f, "(instance-of {operand} {sequence_type})"),
            FunctionCall { function, args } => match function {
                FunctionRef::Builtin(builtin) => write!(f, "({}{})", builtin.name(), List(args)),
                FunctionRef::Unresolved(name) => write!(f, "({name}{})", List(args)),
            },
            ElementConstructor { name, content } => write!(f, "(element {name} {content})"),
            TextConstructor(content) => write!(f, "(text {content})"),
        }
    }
}
