use xot::{ValueType, Xot};
use xqc_ast::{Axis, NameTest, NodeTest};

use super::document_order::DocumentOrder;
use super::kind_test::kind_test;

fn convert_axis(axis: Axis) -> Option<xot::Axis> {
    Some(match axis {
        Axis::Child => xot::Axis::Child,
        Axis::Descendant => xot::Axis::Descendant,
        Axis::Parent => xot::Axis::Parent,
        Axis::Ancestor => xot::Axis::Ancestor,
        Axis::FollowingSibling => xot::Axis::FollowingSibling,
        Axis::PrecedingSibling => xot::Axis::PrecedingSibling,
        Axis::Following => xot::Axis::Following,
        Axis::Preceding => xot::Axis::Preceding,
        Axis::DescendantOrSelf => xot::Axis::DescendantOrSelf,
        Axis::AncestorOrSelf => xot::Axis::AncestorOrSelf,
        Axis::Self_ => xot::Axis::Self_,
        Axis::Attribute => xot::Axis::Attribute,
        // namespace nodes are not navigable
        Axis::Namespace => return None,
    })
}

/// The nodes on `axis` from `node` that pass `node_test`, in axis order:
/// document order for forward axes, nearest first for reverse axes.
pub(crate) fn axis_nodes(
    axis: Axis,
    node_test: &NodeTest,
    node: xot::Node,
    xot: &Xot,
    order: &DocumentOrder,
) -> Vec<xot::Node> {
    let Some(xot_axis) = convert_axis(axis) else {
        return Vec::new();
    };
    let mut nodes: Vec<xot::Node> = xot
        .axis(xot_axis, node)
        .filter(|n| self::node_test(node_test, axis, xot, *n))
        .collect();
    if axis.is_reverse() && nodes.len() > 1 {
        nodes.sort_by(|a, b| order.compare(*b, *a, xot));
    }
    nodes
}

pub(crate) fn node_test(node_test: &NodeTest, axis: Axis, xot: &Xot, node: xot::Node) -> bool {
    match node_test {
        NodeTest::Kind(kt) => kind_test(kt, xot, node),
        NodeTest::Name(name_test) => {
            if xot.value_type(node) != principal_node_kind(axis) {
                return false;
            }
            let Some(name_id) = xot.node_name(node) else {
                return false;
            };
            match name_test {
                // a name that isn't in the name table can't match anything
                NameTest::Name(name) => name.to_name_id(xot) == Some(name_id),
                NameTest::Star => true,
                NameTest::LocalName(local_name) => xot.name_ns_str(name_id).0 == local_name,
                NameTest::Namespace(uri) => xot.name_ns_str(name_id).1 == uri,
            }
        }
    }
}

fn principal_node_kind(axis: Axis) -> ValueType {
    match axis {
        Axis::Attribute => ValueType::Attribute,
        Axis::Namespace => ValueType::Namespace,
        _ => ValueType::Element,
    }
}
