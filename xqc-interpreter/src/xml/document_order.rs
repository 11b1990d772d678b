// Document order is computed on the fly, so nodes created during
// evaluation get an order too. A node's order is a (tree id, preorder
// position) pair.
//
// To annotate a node we walk in reverse preorder until we hit a node that
// already has an annotation, or the root of the tree. From there we walk
// forward again, numbering everything up to the node.

use std::cell::RefCell;
use std::cmp::Ordering;

use ahash::{HashMap, HashMapExt};
use xot::Xot;

#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
struct Position(usize, usize);

/// Lazily computed document order of nodes across all trees seen during
/// one evaluation.
#[derive(Debug, Default)]
pub struct DocumentOrder {
    // each tree gets a different id
    tree_id: RefCell<usize>,
    map: RefCell<HashMap<xot::Node, Position>>,
}

impl DocumentOrder {
    pub fn new() -> Self {
        Self {
            tree_id: RefCell::new(0),
            map: RefCell::new(HashMap::new()),
        }
    }

    fn position(&self, node: xot::Node, xot: &Xot) -> Position {
        if let Some(position) = self.map.borrow().get(&node).copied() {
            return position;
        }
        let (found, found_node) = find_annotated(&self.map.borrow(), node, xot);
        let mut map = self.map.borrow_mut();
        let start = match found {
            Some(position) => position,
            None => {
                // a new tree
                let mut tree_id = self.tree_id.borrow_mut();
                *tree_id += 1;
                let position = Position(*tree_id, 0);
                map.insert(found_node, position);
                position
            }
        };
        annotate(&mut map, start, found_node, node, xot)
    }

    /// Compare two nodes. Nodes of different trees are ordered by the order
    /// in which their trees were first seen.
    pub fn compare(&self, a: xot::Node, b: xot::Node, xot: &Xot) -> Ordering {
        self.position(a, xot).cmp(&self.position(b, xot))
    }

    /// Sort nodes into document order and remove duplicates.
    pub fn sort_nodes(&self, nodes: &mut Vec<xot::Node>, xot: &Xot) {
        nodes.sort_by_cached_key(|node| self.position(*node, xot));
        nodes.dedup();
    }
}

// the first node with an annotation, or else the root without one
fn find_annotated(
    map: &HashMap<xot::Node, Position>,
    node: xot::Node,
    xot: &Xot,
) -> (Option<Position>, xot::Node) {
    let mut last_node = node;
    for node in xot.all_reverse_preorder(node) {
        if let Some(position) = map.get(&node) {
            return (Some(*position), node);
        }
        last_node = node;
    }
    (None, last_node)
}

fn annotate(
    map: &mut HashMap<xot::Node, Position>,
    start: Position,
    start_node: xot::Node,
    node: xot::Node,
    xot: &Xot,
) -> Position {
    if start_node == node {
        return start;
    }
    let mut nodes = xot
        .all_descendants(start_node)
        .chain(xot.all_following(start_node));
    // skip the start node itself
    nodes.next();
    let mut last = start;
    for (i, following) in nodes.enumerate() {
        let position = Position(start.0, start.1 + 1 + i);
        map.insert(following, position);
        last = position;
        if following == node {
            return position;
        }
    }
    // the forward walk from an ancestor-or-preceding node always reaches
    // the node; fall back to the last number handed out
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_and_dedup() {
        let mut xot = Xot::new();
        let doc = xot.parse("<r><a/><b><c/></b><d/></r>").unwrap();
        let r = xot.document_element(doc).unwrap();
        let a = xot.first_child(r).unwrap();
        let b = xot.next_sibling(a).unwrap();
        let c = xot.first_child(b).unwrap();
        let d = xot.next_sibling(b).unwrap();
        let order = DocumentOrder::new();
        let mut nodes = vec![d, c, a, b, c, r];
        order.sort_nodes(&mut nodes, &xot);
        assert_eq!(nodes, vec![r, a, b, c, d]);
        assert_eq!(order.compare(d, a, &xot), Ordering::Greater);
    }

    #[test]
    fn test_trees_in_first_seen_order() {
        let mut xot = Xot::new();
        let first = xot.parse("<x/>").unwrap();
        let second = xot.parse("<y/>").unwrap();
        let order = DocumentOrder::new();
        assert_eq!(order.compare(second, first, &xot), Ordering::Less);
    }
}
