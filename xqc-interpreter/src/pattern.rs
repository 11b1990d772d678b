use xqc_ast::{Axis, Pattern, PatternAlternative, PatternShape};

use crate::error::SpannedResult;
use crate::frame::Frame;
use crate::interpreter::Interpreter;
use crate::sequence::Item;
use crate::xml::node_test;

impl<'e> Interpreter<'e, '_> {
    /// Whether `node` matches any alternative of a pattern. `frame` holds
    /// the pattern's parameters; its focus is replaced by the node.
    pub fn matches_pattern(
        &self,
        pattern: &'e Pattern,
        node: xot::Node,
        frame: &Frame<'e>,
    ) -> SpannedResult<bool> {
        for alternative in &pattern.alternatives {
            if self.matches_alternative(alternative, node, frame)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn matches_alternative(
        &self,
        alternative: &'e PatternAlternative,
        node: xot::Node,
        frame: &Frame<'e>,
    ) -> SpannedResult<bool> {
        match &alternative.shape {
            PatternShape::DocumentRoot => return Ok(self.xot().is_document(node)),
            PatternShape::Step {
                axis,
                node_test: test,
                predicates: 0,
            } if alternative.shape.is_simple_step() => {
                let xot = self.xot();
                let on_axis = match axis {
                    Axis::Attribute => xot.is_attribute_node(node),
                    _ => {
                        !xot.is_attribute_node(node)
                            && !xot.is_namespace_node(node)
                            && xot.parent(node).is_some()
                    }
                };
                return Ok(on_axis && node_test(test, *axis, &xot, node));
            }
            _ => {}
        }
        let inner = frame.with_focus(Item::Node(node), 1, Some(1));
        if let PatternShape::Predicate { .. } = alternative.shape {
            return Ok(self.iterate(&alternative.expr, &inner).next().transpose()?.is_some());
        }
        for item in self.iterate(&alternative.expr, &inner) {
            if item? == Item::Node(node) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
