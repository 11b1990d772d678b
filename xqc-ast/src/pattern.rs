use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::expr::{Axis, Expr, NameTest, NodeTest};
use crate::types::KindTest;

/// A compiled match pattern.
///
/// Union patterns are split into their alternatives up front; each
/// alternative has its own default priority.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub alternatives: Vec<PatternAlternative>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternAlternative {
    pub shape: PatternShape,
    /// For path alternatives, the selection whose result must contain the
    /// node, evaluated with the node as context item. For predicate
    /// alternatives, a filter on `.` that must be non-empty.
    pub expr: Expr,
}

/// The outline of a pattern alternative, as far as priority and fast
/// matching care.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternShape {
    /// `/`
    DocumentRoot,
    /// `.` with zero or more predicates.
    Predicate { predicates: usize },
    /// A relative pattern of one child or attribute step.
    Step {
        axis: Axis,
        node_test: NodeTest,
        predicates: usize,
    },
    /// Anything else: several steps, absolute paths, `id()`/`key()` roots.
    Path,
}

impl PatternShape {
    /// Whether a node can be matched by looking at the node alone, without
    /// evaluating anything.
    pub fn is_simple_step(&self) -> bool {
        matches!(
            self,
            PatternShape::Step {
                predicates: 0,
                axis: Axis::Child | Axis::Attribute,
                ..
            }
        )
    }
}

impl PatternAlternative {
    pub fn default_priority(&self) -> Decimal {
        match &self.shape {
            PatternShape::DocumentRoot => dec!(-0.5),
            PatternShape::Predicate { predicates: 0 } => dec!(-1),
            PatternShape::Predicate { .. } => dec!(1),
            PatternShape::Step {
                node_test,
                predicates: 0,
                ..
            } => node_test_priority(node_test),
            PatternShape::Step { .. } | PatternShape::Path => dec!(0.5),
        }
    }
}

impl Pattern {
    /// Highest default priority over all alternatives.
    pub fn default_priority(&self) -> Decimal {
        self.alternatives
            .iter()
            .map(|alternative| alternative.default_priority())
            .max()
            .unwrap_or(dec!(0.5))
    }
}

fn node_test_priority(node_test: &NodeTest) -> Decimal {
    match node_test {
        NodeTest::Name(NameTest::Name(_)) => dec!(0),
        NodeTest::Name(NameTest::LocalName(_) | NameTest::Namespace(_)) => dec!(-0.25),
        NodeTest::Name(NameTest::Star) => dec!(-0.5),
        NodeTest::Kind(kind_test) => kind_test_priority(kind_test),
    }
}

fn kind_test_priority(kind_test: &KindTest) -> Decimal {
    match kind_test {
        KindTest::Element(test) | KindTest::Attribute(test) => {
            match (&test.name, &test.type_annotation) {
                (Some(_), Some(_)) => dec!(0.25),
                (None, Some(_)) | (Some(_), None) => dec!(0),
                (None, None) => dec!(-0.5),
            }
        }
        KindTest::Document(Some(_)) => dec!(0),
        KindTest::ProcessingInstruction(Some(_)) => dec!(0),
        _ => dec!(-0.5),
    }
}

#[cfg(test)]
mod tests {
    use xqc_name::Name;

    use super::*;
    use crate::location::LocationId;
    use crate::types::ElementTest;

    fn step(node_test: NodeTest, predicates: usize) -> PatternAlternative {
        PatternAlternative {
            shape: PatternShape::Step {
                axis: Axis::Child,
                node_test,
                predicates,
            },
            expr: Expr::empty(LocationId::default()),
        }
    }

    #[test]
    fn test_name_priorities() {
        let name = NodeTest::Name(NameTest::Name(Name::unprefixed("a")));
        assert_eq!(step(name.clone(), 0).default_priority(), dec!(0));
        assert_eq!(step(name, 1).default_priority(), dec!(0.5));
        assert_eq!(
            step(NodeTest::Name(NameTest::LocalName("a".to_string())), 0).default_priority(),
            dec!(-0.25)
        );
        assert_eq!(
            step(NodeTest::Name(NameTest::Star), 0).default_priority(),
            dec!(-0.5)
        );
    }

    #[test]
    fn test_kind_priorities() {
        let typed = ElementTest {
            name: Some(Name::unprefixed("a")),
            type_annotation: Some(Name::unprefixed("t")),
        };
        assert_eq!(
            step(NodeTest::Kind(KindTest::Element(typed)), 0).default_priority(),
            dec!(0.25)
        );
        assert_eq!(
            step(NodeTest::Kind(KindTest::Text), 0).default_priority(),
            dec!(-0.5)
        );
        assert_eq!(
            step(
                NodeTest::Kind(KindTest::ProcessingInstruction(Some("x".to_string()))),
                0
            )
            .default_priority(),
            dec!(0)
        );
    }

    #[test]
    fn test_union_takes_maximum() {
        let pattern = Pattern {
            alternatives: vec![
                step(NodeTest::Name(NameTest::Star), 0),
                step(NodeTest::Name(NameTest::Name(Name::unprefixed("a"))), 0),
            ],
        };
        assert_eq!(pattern.default_priority(), dec!(0));
    }
}
