use xqc_ast::{
    ArithmeticOp, Axis, BuiltinFunction, Cardinality, CompileUnit, Dependencies, ElementTest,
    Error, Expr, ExprKind, FunctionRef, ItemType, KindTest, LocationId, NameTest, NodeTest,
    SequenceType, Slot, StaticContext, StaticError, StaticInfo, StaticResult,
};
use xqc_schema_type::Xs;

use crate::error::static_error;

/// Computes the static type, dependencies and node construction flag of
/// every node, bottom-up, and refines the inferred type of each binding
/// from the expression it is bound to.
///
/// Only a requirement that an operand can never satisfy is an error here;
/// anything that merely overlaps is left to the runtime. Checking an
/// already checked tree is a no-op apart from recomputing the same
/// information, which the optimizer relies on after each rewrite.
pub struct TypeChecker<'a> {
    context: &'a StaticContext,
    unit: &'a mut CompileUnit,
}

impl<'a> TypeChecker<'a> {
    pub fn new(context: &'a StaticContext, unit: &'a mut CompileUnit) -> Self {
        TypeChecker { context, unit }
    }

    pub fn check(&mut self, expr: Expr) -> StaticResult<Expr> {
        let Expr {
            kind,
            location,
            info,
            mode,
        } = expr;
        let kind = match kind {
            ExprKind::For {
                slot,
                source,
                action,
            } => {
                let source = self.check(*source)?;
                let source = self.bind(slot, source, true)?;
                let action = self.check(*action)?;
                ExprKind::For {
                    slot,
                    source: source.boxed(),
                    action: action.boxed(),
                }
            }
            ExprKind::Let {
                slot,
                value,
                action,
            } => {
                let value = self.check(*value)?;
                let value = self.bind(slot, value, false)?;
                let action = self.check(*action)?;
                ExprKind::Let {
                    slot,
                    value: value.boxed(),
                    action: action.boxed(),
                }
            }
            ExprKind::Quantified {
                quantifier,
                slot,
                source,
                satisfies,
            } => {
                let source = self.check(*source)?;
                let source = self.bind(slot, source, true)?;
                let satisfies = self.check(*satisfies)?;
                ExprKind::Quantified {
                    quantifier,
                    slot,
                    source: source.boxed(),
                    satisfies: satisfies.boxed(),
                }
            }
            kind => {
                let expr = Expr {
                    kind,
                    location,
                    info,
                    mode,
                }
                .map_children(&mut |child| self.check(child))?;
                return self.infer(expr);
            }
        };
        self.infer(Expr {
            kind,
            location,
            info,
            mode,
        })
    }

    /// Refine the binding at `slot` from its source. `per_item` is set for
    /// `for` and quantifiers, which bind one item at a time. A declared
    /// type the source only overlaps turns into a runtime check on the
    /// source.
    fn bind(&mut self, slot: Slot, source: Expr, per_item: bool) -> StaticResult<Expr> {
        let actual = if per_item {
            SequenceType::one(source.info.item_type.clone())
        } else {
            source.info.sequence_type()
        };
        let binding = self.unit.bindings.get(slot);
        let Some(declared) = binding.declared.clone() else {
            self.unit.bindings.get_mut(slot).inferred = actual;
            return Ok(source);
        };
        let required = if per_item {
            SequenceType::new(declared.item_type.clone(), Cardinality::ZeroOrMore)
        } else {
            declared.clone()
        };
        let found = source.info.sequence_type();
        if !found.overlaps(&required) {
            let message = format!(
                "${} is declared as {declared} but is bound to {found}",
                binding.name.local_name()
            );
            return Err(self.error(source.location, Error::XPTY0004, message));
        }
        self.unit.bindings.get_mut(slot).inferred = declared;
        if found.is_subtype_of(&required) {
            return Ok(source);
        }
        let location = source.location;
        self.infer(Expr::new(
            ExprKind::Treat {
                operand: source.boxed(),
                sequence_type: required,
            },
            location,
        ))
    }

    fn error(&self, location: LocationId, error: Error, message: String) -> StaticError {
        static_error(&self.unit.locations, location, error, message)
    }

    /// Compute the information of a node whose children are checked.
    fn infer(&mut self, mut expr: Expr) -> StaticResult<Expr> {
        use ExprKind::*;

        let mut dependencies = Dependencies::empty();
        let mut creates_nodes = false;
        let mut redundant = false;
        for child in expr.children() {
            dependencies |= child.info.dependencies;
            creates_nodes |= child.info.creates_nodes;
        }

        let (cardinality, item_type) = match &mut expr.kind {
            Literal(constants) => {
                let item_type = constants
                    .iter()
                    .map(|c| ItemType::Atomic(c.schema_type()))
                    .reduce(|a, b| a.common(&b))
                    .unwrap_or(ItemType::Item);
                (Cardinality::of_len(constants.len()), item_type)
            }
            VarRef(xqc_ast::VarRef::Range(slot)) => {
                let inferred = &self.unit.bindings.get(*slot).inferred;
                (inferred.cardinality, inferred.item_type.clone())
            }
            VarRef(xqc_ast::VarRef::Global(name)) => {
                let declared = self
                    .context
                    .variable_type(name)
                    .flatten()
                    .cloned()
                    .unwrap_or_else(SequenceType::any);
                (declared.cardinality, declared.item_type)
            }
            ContextItem => {
                dependencies |= Dependencies::CONTEXT_ITEM;
                (Cardinality::One, ItemType::Item)
            }
            Root => {
                dependencies |= Dependencies::CONTEXT_ITEM;
                (Cardinality::One, ItemType::Node(KindTest::Document(None)))
            }
            Arithmetic(op, a, b) => {
                self.require_numeric(a)?;
                self.require_numeric(b)?;
                let cardinality = if a.info.cardinality == Cardinality::Empty
                    || b.info.cardinality == Cardinality::Empty
                {
                    Cardinality::Empty
                } else if a.info.cardinality.is_exactly_one() && b.info.cardinality.is_exactly_one()
                {
                    Cardinality::One
                } else {
                    Cardinality::ZeroOrOne
                };
                (cardinality, arithmetic_type(*op, &a.info.item_type, &b.info.item_type))
            }
            Negate(a) | Plus(a) => {
                self.require_numeric(a)?;
                (a.info.cardinality.pick_one(), numeric_type(&a.info.item_type))
            }
            ValueComparison(_, a, b) => {
                let cardinality = if a.info.cardinality.is_exactly_one()
                    && b.info.cardinality.is_exactly_one()
                {
                    Cardinality::One
                } else {
                    Cardinality::ZeroOrOne
                };
                (cardinality, ItemType::Atomic(Xs::Boolean))
            }
            GeneralComparison(..) | And(..) | Or(..) | Quantified { .. } | Castable { .. }
            | InstanceOf { .. } => (Cardinality::One, ItemType::Atomic(Xs::Boolean)),
            NodeComparison(_, a, b) => {
                self.require_node(a, Error::XPTY0004)?;
                self.require_node(b, Error::XPTY0004)?;
                (Cardinality::ZeroOrOne, ItemType::Atomic(Xs::Boolean))
            }
            Range(a, b) => {
                self.require_atomizable(a, Xs::Integer)?;
                self.require_atomizable(b, Xs::Integer)?;
                (Cardinality::ZeroOrMore, ItemType::Atomic(Xs::Integer))
            }
            SetOperation(_, a, b) => {
                self.require_node(a, Error::XPTY0004)?;
                self.require_node(b, Error::XPTY0004)?;
                let item_type = node_common(&a.info.item_type, &b.info.item_type);
                (Cardinality::ZeroOrMore, item_type)
            }
            Block(items) => {
                let cardinality = items
                    .iter()
                    .map(|item| item.info.cardinality)
                    .fold(Cardinality::Empty, Cardinality::concat);
                let item_type = common_of(items.iter());
                (cardinality, item_type)
            }
            If {
                then, otherwise, ..
            } => (
                then.info.cardinality.join(otherwise.info.cardinality),
                common_of([&**then, &**otherwise].into_iter()),
            ),
            For { source, action, .. } => (
                source.info.cardinality.product(action.info.cardinality),
                action.info.item_type.clone(),
            ),
            Let { action, .. } => (action.info.cardinality, action.info.item_type.clone()),
            Path(a, b) => {
                self.require_node(a, Error::XPTY0019)?;
                dependencies = a.info.dependencies | outer(b);
                (
                    a.info.cardinality.product(b.info.cardinality),
                    b.info.item_type.clone(),
                )
            }
            DocumentSort(a) | Reverse(a) => (a.info.cardinality, a.info.item_type.clone()),
            AxisStep(axis, node_test) => {
                dependencies |= Dependencies::CONTEXT_ITEM;
                step_type(*axis, node_test)
            }
            Filter {
                base,
                predicate,
                positional,
            } => {
                *positional = predicate.info.item_type.may_be_numeric()
                    || predicate
                        .info
                        .dependencies
                        .intersects(Dependencies::POSITION | Dependencies::LAST);
                dependencies = base.info.dependencies | outer(predicate);
                let cardinality = if base.info.cardinality == Cardinality::Empty {
                    Cardinality::Empty
                } else if *positional && is_numeric(&predicate.info.item_type) {
                    Cardinality::ZeroOrOne
                } else {
                    base.info.cardinality.optional()
                };
                (cardinality, base.info.item_type.clone())
            }
            FirstItem(base) | LastItem(base) => (
                base.info.cardinality.pick_one(),
                base.info.item_type.clone(),
            ),
            ItemAt { base, .. } => (
                base.info.cardinality.pick_one().optional(),
                base.info.item_type.clone(),
            ),
            Slice { base, .. } | IndexedFilter { base, .. } => {
                (base.info.cardinality.optional(), base.info.item_type.clone())
            }
            Cast {
                operand,
                target,
                optional,
            } => {
                self.require_castable(operand, *target)?;
                let operand_cardinality = operand.info.cardinality;
                if operand_cardinality == Cardinality::Empty && !*optional {
                    return Err(self.error(
                        expr.location,
                        Error::XPTY0004,
                        format!("cast to xs:{} of an empty sequence", target.local_name()),
                    ));
                }
                let cardinality = if operand_cardinality.allows_empty() && *optional {
                    Cardinality::ZeroOrOne
                } else {
                    Cardinality::One
                };
                (cardinality, ItemType::Atomic(*target))
            }
            Treat {
                operand,
                sequence_type,
            } => {
                let found = operand.info.sequence_type();
                if !found.overlaps(sequence_type) {
                    return Err(self.error(
                        expr.location,
                        Error::XPTY0004,
                        format!("{found} can never be treated as {sequence_type}"),
                    ));
                }
                redundant = found.is_subtype_of(sequence_type);
                (sequence_type.cardinality, sequence_type.item_type.clone())
            }
            FunctionCall { function, args } => match function {
                FunctionRef::Builtin(function) => {
                    let signature = function.signature(args.len());
                    for (arg, param) in args.iter().zip(&signature.params) {
                        self.require_argument(*function, arg, param)?;
                    }
                    dependencies |= signature.dependencies;
                    let item_type = match args.first() {
                        Some(first) if signature.preserves_item_type => {
                            first.info.item_type.clone()
                        }
                        _ => signature.result.item_type.clone(),
                    };
                    (signature.result.cardinality, item_type)
                }
                FunctionRef::Unresolved(_) => (Cardinality::ZeroOrMore, ItemType::Item),
            },
            ElementConstructor { name, .. } => {
                creates_nodes = true;
                let test = ElementTest {
                    name: Some(name.clone()),
                    type_annotation: None,
                };
                (Cardinality::One, ItemType::Node(KindTest::Element(test)))
            }
            TextConstructor(_) => {
                creates_nodes = true;
                (Cardinality::ZeroOrOne, ItemType::Node(KindTest::Text))
            }
        };

        if redundant {
            if let ExprKind::Treat { operand, .. } = expr.kind {
                return Ok(*operand);
            }
        }
        expr.info = StaticInfo {
            cardinality,
            item_type,
            dependencies,
            creates_nodes,
        };
        Ok(expr)
    }

    fn require_numeric(&self, operand: &Expr) -> StaticResult<()> {
        if self.context.backwards_compatible() || may_atomize_to_numeric(&operand.info.item_type) {
            return Ok(());
        }
        Err(self.error(
            operand.location,
            Error::XPTY0004,
            format!("arithmetic on {}", operand.info.item_type),
        ))
    }

    fn require_atomizable(&self, operand: &Expr, target: Xs) -> StaticResult<()> {
        if may_atomize_to(&operand.info.item_type, target) {
            return Ok(());
        }
        Err(self.error(
            operand.location,
            Error::XPTY0004,
            format!(
                "{} can never become xs:{}",
                operand.info.item_type,
                target.local_name()
            ),
        ))
    }

    fn require_castable(&self, operand: &Expr, target: Xs) -> StaticResult<()> {
        if may_cast_to(&operand.info.item_type, target) {
            return Ok(());
        }
        Err(self.error(
            operand.location,
            Error::XPTY0004,
            format!(
                "{} can never be cast to xs:{}",
                operand.info.item_type,
                target.local_name()
            ),
        ))
    }

    fn require_node(&self, operand: &Expr, error: Error) -> StaticResult<()> {
        if operand.info.cardinality == Cardinality::Empty
            || operand.info.item_type.overlaps(&ItemType::any_node())
        {
            return Ok(());
        }
        Err(self.error(
            operand.location,
            error,
            format!("expected nodes, found {}", operand.info.item_type),
        ))
    }

    fn require_argument(
        &self,
        function: BuiltinFunction,
        arg: &Expr,
        param: &SequenceType,
    ) -> StaticResult<()> {
        let cardinality_ok = arg.info.cardinality.overlaps(param.cardinality);
        let item_ok = arg.info.cardinality == Cardinality::Empty
            || match &param.item_type {
                ItemType::Atomic(xs) => may_atomize_to(&arg.info.item_type, *xs),
                other => arg.info.item_type.overlaps(other),
            };
        if cardinality_ok && item_ok {
            return Ok(());
        }
        Err(self.error(
            arg.location,
            Error::XPTY0004,
            format!(
                "argument of {}() is {}, expected {param}",
                function.name(),
                arg.info.sequence_type()
            ),
        ))
    }
}

trait CardinalityExt {
    fn pick_one(self) -> Cardinality;
}

impl CardinalityExt for Cardinality {
    /// The cardinality of picking one item out of a sequence.
    fn pick_one(self) -> Cardinality {
        match self {
            Cardinality::Empty => Cardinality::Empty,
            Cardinality::One | Cardinality::OneOrMore => Cardinality::One,
            Cardinality::ZeroOrOne | Cardinality::ZeroOrMore => Cardinality::ZeroOrOne,
        }
    }
}

/// Dependencies that escape an operand evaluated under its own focus.
fn outer(expr: &Expr) -> Dependencies {
    expr.info.dependencies.difference(Dependencies::FOCUS)
}

fn is_numeric(item_type: &ItemType) -> bool {
    matches!(item_type, ItemType::Atomic(xs) if xs.is_numeric())
}

fn may_atomize_to_numeric(item_type: &ItemType) -> bool {
    match item_type {
        ItemType::Node(_) => true,
        ItemType::Atomic(Xs::UntypedAtomic) => true,
        other => other.may_be_numeric(),
    }
}

/// Could atomizing an item of this type produce a value usable where
/// `target` is required, after casting untyped data and numeric promotion?
fn may_atomize_to(item_type: &ItemType, target: Xs) -> bool {
    match item_type {
        ItemType::Item | ItemType::Imported(_) | ItemType::Node(_) => true,
        ItemType::Foreign(_) => false,
        ItemType::Atomic(xs) => {
            *xs == Xs::UntypedAtomic
                || xs.derives_from(target)
                || target.derives_from(*xs)
                || (xs.is_numeric() && target.is_numeric())
                || target == Xs::AnyAtomicType
        }
    }
}

/// Does the casting table allow some atomized value of this type to be cast
/// to `target`? Lexical failures are left to run time.
fn may_cast_to(item_type: &ItemType, target: Xs) -> bool {
    let supported = matches!(
        target,
        Xs::String | Xs::UntypedAtomic | Xs::Boolean | Xs::Float | Xs::Double
    ) || target.derives_from(Xs::Decimal);
    match item_type {
        ItemType::Foreign(_) => false,
        ItemType::Atomic(xs) if *xs == target => true,
        _ => supported,
    }
}

fn numeric_type(item_type: &ItemType) -> ItemType {
    match item_type {
        ItemType::Atomic(xs) if xs.is_numeric() => ItemType::Atomic(*xs),
        _ => ItemType::Atomic(Xs::AnyAtomicType),
    }
}

fn arithmetic_type(op: ArithmeticOp, a: &ItemType, b: &ItemType) -> ItemType {
    let (ItemType::Atomic(a), ItemType::Atomic(b)) = (numeric_type(a), numeric_type(b)) else {
        return ItemType::Atomic(Xs::AnyAtomicType);
    };
    if a == Xs::AnyAtomicType || b == Xs::AnyAtomicType {
        return ItemType::Atomic(Xs::AnyAtomicType);
    }
    let common = a.common_supertype(b);
    let integral = common.derives_from(Xs::Integer);
    ItemType::Atomic(match op {
        ArithmeticOp::IntegerDivide => Xs::Integer,
        ArithmeticOp::Divide if integral => Xs::Decimal,
        _ if integral => Xs::Integer,
        _ => common,
    })
}

fn node_common(a: &ItemType, b: &ItemType) -> ItemType {
    match a.common(b) {
        ItemType::Node(kind_test) => ItemType::Node(kind_test),
        _ => ItemType::any_node(),
    }
}

/// Common item type of the non-empty operands.
fn common_of<'e>(exprs: impl Iterator<Item = &'e Expr>) -> ItemType {
    exprs
        .filter(|expr| expr.info.cardinality != Cardinality::Empty)
        .map(|expr| expr.info.item_type.clone())
        .reduce(|a, b| a.common(&b))
        .unwrap_or(ItemType::Item)
}

fn step_type(axis: Axis, node_test: &NodeTest) -> (Cardinality, ItemType) {
    let cardinality = match (axis, node_test) {
        (Axis::Self_ | Axis::Parent, _) => Cardinality::ZeroOrOne,
        (Axis::Attribute, NodeTest::Name(NameTest::Name(_))) => Cardinality::ZeroOrOne,
        _ => Cardinality::ZeroOrMore,
    };
    let item_type = match node_test {
        NodeTest::Kind(kind_test) => ItemType::Node(kind_test.clone()),
        NodeTest::Name(name_test) => {
            let test = ElementTest {
                name: match name_test {
                    NameTest::Name(name) => Some(name.clone()),
                    _ => None,
                },
                type_annotation: None,
            };
            ItemType::Node(match axis {
                Axis::Attribute => KindTest::Attribute(test),
                Axis::Namespace => KindTest::NamespaceNode,
                _ => KindTest::Element(test),
            })
        }
    };
    (cardinality, item_type)
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use xqc_ast::{parse_expression, StaticContextBuilder};
    use xqc_name::Name;

    use super::*;

    fn check(text: &str) -> StaticResult<(Expr, CompileUnit)> {
        let context = StaticContextBuilder::default().build();
        let mut unit = CompileUnit::new();
        let expr = parse_expression(text, &context, &mut unit)?;
        let expr = TypeChecker::new(&context, &mut unit).check(expr)?;
        Ok((expr, unit))
    }

    fn info(text: &str) -> StaticInfo {
        check(text).unwrap().0.info
    }

    #[test]
    fn test_if_joins_branch_cardinalities() {
        let info = info("if (true()) then 1 else (1, 2)");
        assert_eq!(info.cardinality, Cardinality::ZeroOrMore);
        assert_eq!(info.item_type, ItemType::Atomic(Xs::Integer));
    }

    #[test]
    fn test_literal_and_arithmetic_types() {
        assert_eq!(info("1 + 2").sequence_type().to_string(), "xs:integer");
        assert_eq!(info("1 div 2").item_type, ItemType::Atomic(Xs::Decimal));
        assert_eq!(info("1.5 * 2").item_type, ItemType::Atomic(Xs::Decimal));
        assert_eq!(info("a + 1").cardinality, Cardinality::ZeroOrOne);
    }

    #[test]
    fn test_for_binding_refined_from_source() {
        let (expr, unit) = check("for $x in (1, 2, 3) return $x * 2").unwrap();
        let (_, binding) = unit.bindings.iter().next().unwrap();
        assert_eq!(binding.inferred, SequenceType::one(ItemType::Atomic(Xs::Integer)));
        assert_eq!(expr.info.cardinality, Cardinality::OneOrMore);
    }

    #[test]
    fn test_let_binding_takes_value_type() {
        let (expr, unit) = check("let $x := (a, b) return $x").unwrap();
        let (_, binding) = unit.bindings.iter().next().unwrap();
        assert_eq!(binding.inferred.cardinality, Cardinality::ZeroOrMore);
        assert!(binding.inferred.item_type.is_node());
        assert_eq!(expr.info.cardinality, Cardinality::ZeroOrMore);
    }

    #[test]
    fn test_focus_dependencies_stop_at_filters_and_paths() {
        let info_of = |text| info(text).dependencies;
        assert_eq!(info_of("a"), Dependencies::CONTEXT_ITEM);
        assert_eq!(info_of("position()"), Dependencies::POSITION);
        assert_eq!(info_of("/a[position() = last()]"), Dependencies::CONTEXT_ITEM);
        assert_eq!(info_of("(1, 2)[. = 2]"), Dependencies::empty());
    }

    #[test]
    fn test_positional_predicates() {
        let (expr, _) = check("(1, 2)[2]").unwrap();
        let ExprKind::Filter { positional, .. } = expr.kind else {
            panic!("expected a filter, got {expr}");
        };
        assert!(positional);
        assert_eq!(expr.info.cardinality, Cardinality::ZeroOrOne);

        let (expr, _) = check("(1, 2)[. = 2]").unwrap();
        let ExprKind::Filter { positional, .. } = expr.kind else {
            panic!("expected a filter, got {expr}");
        };
        assert!(!positional);
    }

    #[test]
    fn test_never_satisfiable_is_a_static_error() {
        assert_eq!(check("'a' + 1").unwrap_err().error, Error::XPTY0004);
        assert_eq!(check("1 / a").unwrap_err().error, Error::XPTY0019);
        assert_eq!(check("1 union a").unwrap_err().error, Error::XPTY0004);
        assert_eq!(check("contains(1, 'a')").unwrap_err().error, Error::XPTY0004);
        assert_eq!(check("'a' to 3").unwrap_err().error, Error::XPTY0004);
    }

    #[test]
    fn test_casts_follow_the_casting_table() {
        assert!(check("xs:integer('5')").is_ok());
        assert!(check("'1' cast as xs:double").is_ok());
        assert!(check("xs:boolean('true')").is_ok());
        assert!(check("xs:unsignedByte(1.5e0)").is_ok());
        assert!(check("xs:untypedAtomic(true())").is_ok());
        assert!(check("'x' castable as xs:decimal").is_ok());
        assert_eq!(
            info("xs:double('NaN')").item_type,
            ItemType::Atomic(Xs::Double)
        );
    }

    #[test]
    fn test_overlapping_is_deferred() {
        // nodes atomize to untyped data, which may well be numeric
        assert!(check("a + 1").is_ok());
        assert!(check("contains(a, 'x')").is_ok());
        assert!(check("(a, 1) treat as xs:integer+").is_ok());
    }

    #[test]
    fn test_declared_binding_types() {
        let error = check("let $x as xs:string := 1 return $x").unwrap_err();
        assert_eq!(error.error, Error::XPTY0004);

        let (expr, unit) = check("for $x as xs:integer in (a, 1) return $x").unwrap();
        assert_snapshot!(expr, @"(for $0 (treat (, child::a 1) xs:integer*) $0)");
        let (_, binding) = unit.bindings.iter().next().unwrap();
        assert_eq!(binding.inferred, SequenceType::one(ItemType::Atomic(Xs::Integer)));

        // an already matching source needs no check
        let (expr, _) = check("let $x as xs:integer* := (1, 2) return $x").unwrap();
        assert_snapshot!(expr, @"(let $0 (, 1 2) $0)");
    }

    #[test]
    fn test_treat_dropped_when_statically_satisfied() {
        let (expr, _) = check("1 treat as xs:integer").unwrap();
        assert_snapshot!(expr, @"1");
    }

    #[test]
    fn test_global_variable_types() {
        let context = StaticContextBuilder::default()
            .variable(
                Name::unprefixed("n"),
                Some(SequenceType::one(ItemType::Atomic(Xs::Integer))),
            )
            .build();
        let mut unit = CompileUnit::new();
        let expr = parse_expression("$n + 1", &context, &mut unit).unwrap();
        let expr = TypeChecker::new(&context, &mut unit).check(expr).unwrap();
        assert_eq!(expr.info.cardinality, Cardinality::One);
    }

    #[test]
    fn test_construction_is_flagged() {
        assert!(info("(1, element a { 2 })").creates_nodes);
        assert!(!info("(1, a)").creates_nodes);
    }

    #[test]
    fn test_checking_twice_is_stable() {
        let context = StaticContextBuilder::default().build();
        let mut unit = CompileUnit::new();
        let expr =
            parse_expression("for $x as xs:integer in (a, 1) return $x[1]", &context, &mut unit)
                .unwrap();
        let once = TypeChecker::new(&context, &mut unit).check(expr).unwrap();
        let twice = TypeChecker::new(&context, &mut unit).check(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
