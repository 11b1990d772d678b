use xqc_ast::{Cardinality, ItemType, SequenceType};

use crate::sequence::{Item, Sequence};
use crate::xml::kind_test;

use super::Interpreter;

impl Interpreter<'_, '_> {
    pub(crate) fn matches_sequence_type(&self, sequence_type: &SequenceType, sequence: &Sequence) -> bool {
        if !sequence_type
            .cardinality
            .contains(Cardinality::of_len(sequence.len()))
        {
            return false;
        }
        sequence
            .iter()
            .all(|item| self.matches_item_type(&sequence_type.item_type, &item))
    }

    fn matches_item_type(&self, item_type: &ItemType, item: &Item) -> bool {
        match (item_type, item) {
            (ItemType::Item, _) => true,
            (ItemType::Atomic(xs), Item::Atomic(atomic)) => atomic.schema_type().derives_from(*xs),
            (ItemType::Node(test), Item::Node(node)) => kind_test(test, &self.xot.borrow(), *node),
            // no values of foreign or imported types exist at runtime
            _ => false,
        }
    }
}
