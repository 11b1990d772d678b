//! Navigation over `xot` trees.
mod document_order;
mod step;

pub use document_order::DocumentOrder;
pub(crate) use kind_test::kind_test;
pub(crate) use step::{axis_nodes, node_test};
