use ibig::IBig;
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use xqc_name::Name;
use xqc_schema_type::Xs;

use crate::analysis::{EvaluationMode, StaticInfo};
use crate::binding::Slot;
use crate::function::BuiltinFunction;
use crate::location::LocationId;
use crate::types::{KindTest, SequenceType};

/// An expression node.
///
/// Nodes own their children. Every pipeline phase consumes a node and
/// returns the node to install in its place; nothing holds on to a node's
/// identity across a rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: LocationId,
    /// Cached static analysis. Filled in by type checking and refreshed
    /// whenever a rewrite replaces the node.
    pub info: StaticInfo,
    /// How the runtime should evaluate this node when its value is needed
    /// as a variable value or argument. Assigned at the end of
    /// optimization.
    pub mode: EvaluationMode,
}

impl Expr {
    pub fn new(kind: ExprKind, location: LocationId) -> Self {
        Expr {
            kind,
            location,
            info: StaticInfo::default(),
            mode: EvaluationMode::default(),
        }
    }

    pub fn boxed(self) -> Box<Expr> {
        Box::new(self)
    }

    pub fn empty(location: LocationId) -> Self {
        Expr::new(ExprKind::Literal(Vec::new()), location)
    }

    pub fn constant(constant: Constant, location: LocationId) -> Self {
        Expr::new(ExprKind::Literal(vec![constant]), location)
    }

    pub fn is_empty_literal(&self) -> bool {
        matches!(&self.kind, ExprKind::Literal(constants) if constants.is_empty())
    }

    /// A single literal constant, if that's what this is.
    pub fn as_constant(&self) -> Option<&Constant> {
        match &self.kind {
            ExprKind::Literal(constants) if constants.len() == 1 => constants.first(),
            _ => None,
        }
    }

    pub fn is_call_to(&self, function: BuiltinFunction) -> bool {
        matches!(
            &self.kind,
            ExprKind::FunctionCall { function: FunctionRef::Builtin(f), .. } if *f == function
        )
    }
}

/// An atomic constant in the expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Boolean(bool),
    Integer(IBig),
    Decimal(Decimal),
    Double(OrderedFloat<f64>),
    String(String),
}

impl Constant {
    pub fn schema_type(&self) -> Xs {
        match self {
            Constant::Boolean(_) => Xs::Boolean,
            Constant::Integer(_) => Xs::Integer,
            Constant::Decimal(_) => Xs::Decimal,
            Constant::Double(_) => Xs::Double,
            Constant::String(_) => Xs::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VarRef {
    /// A lexically scoped variable, resolved to its binding slot during
    /// parsing.
    Range(Slot),
    /// A variable supplied by the static context.
    Global(Name),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionRef {
    Builtin(BuiltinFunction),
    /// Unknown function accepted in backwards-compatible mode; calling it
    /// is a dynamic error.
    Unresolved(Name),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    IntegerDivide,
    Modulo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    /// `a op b` is the same as `b op.inverse() a`.
    pub fn inverse(self) -> ComparisonOp {
        match self {
            ComparisonOp::Eq => ComparisonOp::Eq,
            ComparisonOp::Ne => ComparisonOp::Ne,
            ComparisonOp::Lt => ComparisonOp::Gt,
            ComparisonOp::Le => ComparisonOp::Ge,
            ComparisonOp::Gt => ComparisonOp::Lt,
            ComparisonOp::Ge => ComparisonOp::Le,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeComparisonOp {
    Is,
    Precedes,
    Follows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOp {
    Union,
    Intersect,
    Except,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Some,
    Every,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Child,
    Descendant,
    Attribute,
    Self_,
    DescendantOrSelf,
    FollowingSibling,
    Following,
    Namespace,
    Parent,
    Ancestor,
    PrecedingSibling,
    Preceding,
    AncestorOrSelf,
}

impl Axis {
    pub fn by_name(name: &str) -> Option<Axis> {
        let axis = match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "attribute" => Axis::Attribute,
            "self" => Axis::Self_,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "following" => Axis::Following,
            "namespace" => Axis::Namespace,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "preceding-sibling" => Axis::PrecedingSibling,
            "preceding" => Axis::Preceding,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            _ => return None,
        };
        Some(axis)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::Attribute => "attribute",
            Axis::Self_ => "self",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::FollowingSibling => "following-sibling",
            Axis::Following => "following",
            Axis::Namespace => "namespace",
            Axis::Parent => "parent",
            Axis::Ancestor => "ancestor",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::Preceding => "preceding",
            Axis::AncestorOrSelf => "ancestor-or-self",
        }
    }

    /// Reverse axes deliver nodes nearest-first, against document order.
    pub fn is_reverse(&self) -> bool {
        matches!(
            self,
            Axis::Parent
                | Axis::Ancestor
                | Axis::PrecedingSibling
                | Axis::Preceding
                | Axis::AncestorOrSelf
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameTest {
    Name(Name),
    Star,
    /// `*:local`
    LocalName(String),
    /// `prefix:*` or `Q{uri}*`
    Namespace(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeTest {
    Name(NameTest),
    Kind(KindTest),
}

/// Expression node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A constant sequence; empty for `()`.
    Literal(Vec<Constant>),
    VarRef(VarRef),
    ContextItem,
    /// The root of the tree containing the context node, which must be a
    /// document node.
    Root,
    Arithmetic(ArithmeticOp, Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
    /// Unary plus: the operand atomized, which must be numeric.
    Plus(Box<Expr>),
    ValueComparison(ComparisonOp, Box<Expr>, Box<Expr>),
    GeneralComparison(ComparisonOp, Box<Expr>, Box<Expr>),
    NodeComparison(NodeComparisonOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Range(Box<Expr>, Box<Expr>),
    SetOperation(SetOp, Box<Expr>, Box<Expr>),
    /// The comma operator.
    Block(Vec<Expr>),
    If {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    For {
        slot: Slot,
        source: Box<Expr>,
        action: Box<Expr>,
    },
    Let {
        slot: Slot,
        value: Box<Expr>,
        action: Box<Expr>,
    },
    Quantified {
        quantifier: Quantifier,
        slot: Slot,
        source: Box<Expr>,
        satisfies: Box<Expr>,
    },
    /// `E1/E2` without the final document-order sort: evaluates E2 with
    /// each node of E1 as focus and concatenates.
    Path(Box<Expr>, Box<Expr>),
    /// Sort nodes into document order and remove duplicates.
    DocumentSort(Box<Expr>),
    AxisStep(Axis, NodeTest),
    /// Reverse the sequence; used once at the end of a reverse-axis step.
    Reverse(Box<Expr>),
    Filter {
        base: Box<Expr>,
        predicate: Box<Expr>,
        /// Whether the predicate might select by position.
        positional: bool,
    },
    FirstItem(Box<Expr>),
    LastItem(Box<Expr>),
    /// 1-based item selection with a focus-independent index.
    ItemAt {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// Items `min..=max` (1-based); unbounded when `max` is `None`.
    Slice {
        base: Box<Expr>,
        min: usize,
        max: Option<usize>,
    },
    /// `base[key_path = value]` answered through a string-keyed index on
    /// `base`.
    IndexedFilter {
        base: Box<Expr>,
        key_path: Box<Expr>,
        value: Box<Expr>,
    },
    Cast {
        operand: Box<Expr>,
        target: Xs,
        optional: bool,
    },
    Castable {
        operand: Box<Expr>,
        target: Xs,
        optional: bool,
    },
    Treat {
        operand: Box<Expr>,
        sequence_type: SequenceType,
    },
    InstanceOf {
        operand: Box<Expr>,
        sequence_type: SequenceType,
    },
    FunctionCall {
        function: FunctionRef,
        args: Vec<Expr>,
    },
    /// `element N { content }`: creates a new node every time it is
    /// evaluated.
    ElementConstructor {
        name: Name,
        content: Box<Expr>,
    },
    /// `text { content }`
    TextConstructor(Box<Expr>),
}

impl Expr {
    /// Direct children, in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        use ExprKind::*;
        match &self.kind {
            Literal(_) | VarRef(_) | ContextItem | Root | AxisStep(..) => Vec::new(),
            Negate(a) | Plus(a) | DocumentSort(a) | Reverse(a) | FirstItem(a) | LastItem(a)
            | TextConstructor(a) => vec![a],
            Arithmetic(_, a, b)
            | ValueComparison(_, a, b)
            | GeneralComparison(_, a, b)
            | NodeComparison(_, a, b)
            | And(a, b)
            | Or(a, b)
            | Range(a, b)
            | SetOperation(_, a, b)
            | Path(a, b) => vec![a, b],
            Block(items) => items.iter().collect(),
            If {
                condition,
                then,
                otherwise,
            } => vec![condition, then, otherwise],
            For { source, action, .. } => vec![source, action],
            Let { value, action, .. } => vec![value, action],
            Quantified {
                source, satisfies, ..
            } => vec![source, satisfies],
            Filter {
                base, predicate, ..
            } => vec![base, predicate],
            ItemAt { base, index } => vec![base, index],
            Slice { base, .. } => vec![base],
            IndexedFilter {
                base,
                key_path,
                value,
            } => vec![base, key_path, value],
            Cast { operand, .. }
            | Castable { operand, .. }
            | Treat { operand, .. }
            | InstanceOf { operand, .. } => vec![operand],
            FunctionCall { args, .. } => args.iter().collect(),
            ElementConstructor { content, .. } => vec![content],
        }
    }

    pub fn children_mut(&mut self) -> Vec<&mut Expr> {
        use ExprKind::*;
        match &mut self.kind {
            Literal(_) | VarRef(_) | ContextItem | Root | AxisStep(..) => Vec::new(),
            Negate(a) | Plus(a) | DocumentSort(a) | Reverse(a) | FirstItem(a) | LastItem(a)
            | TextConstructor(a) => vec![a],
            Arithmetic(_, a, b)
            | ValueComparison(_, a, b)
            | GeneralComparison(_, a, b)
            | NodeComparison(_, a, b)
            | And(a, b)
            | Or(a, b)
            | Range(a, b)
            | SetOperation(_, a, b)
            | Path(a, b) => vec![a, b],
            Block(items) => items.iter_mut().collect(),
            If {
                condition,
                then,
                otherwise,
            } => vec![condition, then, otherwise],
            For { source, action, .. } => vec![source, action],
            Let { value, action, .. } => vec![value, action],
            Quantified {
                source, satisfies, ..
            } => vec![source, satisfies],
            Filter {
                base, predicate, ..
            } => vec![base, predicate],
            ItemAt { base, index } => vec![base, index],
            Slice { base, .. } => vec![base],
            IndexedFilter {
                base,
                key_path,
                value,
            } => vec![base, key_path, value],
            Cast { operand, .. }
            | Castable { operand, .. }
            | Treat { operand, .. }
            | InstanceOf { operand, .. } => vec![operand],
            FunctionCall { args, .. } => args.iter_mut().collect(),
            ElementConstructor { content, .. } => vec![content],
        }
    }

    /// Rebuild this node with every child replaced by `f(child)`.
    ///
    /// This is the shape every pass uses for "recurse into children,
    /// unchanged shape".
    pub fn map_children<E>(
        self,
        f: &mut impl FnMut(Expr) -> Result<Expr, E>,
    ) -> Result<Expr, E> {
        let Expr {
            kind,
            location,
            info,
            mode,
        } = self;
        let mut m = |e: Box<Expr>| -> Result<Box<Expr>, E> { Ok(Box::new(f(*e)?)) };
        use ExprKind::*;
        let kind = match kind {
            k @ (Literal(_) | VarRef(_) | ContextItem | Root | AxisStep(..)) => k,
            Arithmetic(op, a, b) => Arithmetic(op, m(a)?, m(b)?),
            Negate(a) => Negate(m(a)?),
            Plus(a) => Plus(m(a)?),
            ValueComparison(op, a, b) => ValueComparison(op, m(a)?, m(b)?),
            GeneralComparison(op, a, b) => GeneralComparison(op, m(a)?, m(b)?),
            NodeComparison(op, a, b) => NodeComparison(op, m(a)?, m(b)?),
            And(a, b) => And(m(a)?, m(b)?),
            Or(a, b) => Or(m(a)?, m(b)?),
            Range(a, b) => Range(m(a)?, m(b)?),
            SetOperation(op, a, b) => SetOperation(op, m(a)?, m(b)?),
            Block(items) => Block(
                items
                    .into_iter()
                    .map(|e| f(e))
                    .collect::<Result<Vec<_>, E>>()?,
            ),
            If {
                condition,
                then,
                otherwise,
            } => If {
                condition: m(condition)?,
                then: m(then)?,
                otherwise: m(otherwise)?,
            },
            For {
                slot,
                source,
                action,
            } => For {
                slot,
                source: m(source)?,
                action: m(action)?,
            },
            Let {
                slot,
                value,
                action,
            } => Let {
                slot,
                value: m(value)?,
                action: m(action)?,
            },
            Quantified {
                quantifier,
                slot,
                source,
                satisfies,
            } => Quantified {
                quantifier,
                slot,
                source: m(source)?,
                satisfies: m(satisfies)?,
            },
            Path(a, b) => Path(m(a)?, m(b)?),
            DocumentSort(a) => DocumentSort(m(a)?),
            Reverse(a) => Reverse(m(a)?),
            Filter {
                base,
                predicate,
                positional,
            } => Filter {
                base: m(base)?,
                predicate: m(predicate)?,
                positional,
            },
            FirstItem(a) => FirstItem(m(a)?),
            LastItem(a) => LastItem(m(a)?),
            ItemAt { base, index } => ItemAt {
                base: m(base)?,
                index: m(index)?,
            },
            Slice { base, min, max } => Slice {
                base: m(base)?,
                min,
                max,
            },
            IndexedFilter {
                base,
                key_path,
                value,
            } => IndexedFilter {
                base: m(base)?,
                key_path: m(key_path)?,
                value: m(value)?,
            },
            Cast {
                operand,
                target,
                optional,
            } => Cast {
                operand: m(operand)?,
                target,
                optional,
            },
            Castable {
                operand,
                target,
                optional,
            } => Castable {
                operand: m(operand)?,
                target,
                optional,
            },
            Treat {
                operand,
                sequence_type,
            } => Treat {
                operand: m(operand)?,
                sequence_type,
            },
            InstanceOf {
                operand,
                sequence_type,
            } => InstanceOf {
                operand: m(operand)?,
                sequence_type,
            },
            FunctionCall { function, args } => FunctionCall {
                function,
                args: args
                    .into_iter()
                    .map(|e| f(e))
                    .collect::<Result<Vec<_>, E>>()?,
            },
            ElementConstructor { name, content } => ElementConstructor {
                name,
                content: m(content)?,
            },
            TextConstructor(a) => TextConstructor(m(a)?),
        };
        Ok(Expr {
            kind,
            location,
            info,
            mode,
        })
    }

    /// Visit every node of the tree, parents before children.
    pub fn walk<'e>(&'e self, f: &mut impl FnMut(&'e Expr)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }
}
