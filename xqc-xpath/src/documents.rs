use xot::Xot;
use xqc_interpreter::{Item, Sequence};

use crate::error::{Error, Result};

/// Identifies a document added to a [`Documents`] collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(usize);

/// The XML documents queries run against, along with the `Xot` arena
/// that owns their nodes and any nodes queries construct.
#[derive(Debug)]
pub struct Documents {
    pub(crate) xot: Xot,
    documents: Vec<xot::Node>,
}

impl Documents {
    pub fn new() -> Self {
        Self {
            xot: Xot::new(),
            documents: Vec::new(),
        }
    }

    /// Parse a string as an XML document.
    pub fn add_string(&mut self, xml: &str) -> Result<DocumentHandle> {
        let root = self.xot.parse(xml)?;
        self.documents.push(root);
        Ok(DocumentHandle(self.documents.len() - 1))
    }

    /// The document node of a document.
    pub fn document_node(&self, handle: DocumentHandle) -> Option<xot::Node> {
        self.documents.get(handle.0).copied()
    }

    pub fn xot(&self) -> &Xot {
        &self.xot
    }

    pub fn xot_mut(&mut self) -> &mut Xot {
        &mut self.xot
    }

    /// Render a result: atomic values by their string value, elements and
    /// documents as XML, other nodes by their string value. One item per
    /// line.
    pub fn display(&self, sequence: &Sequence) -> String {
        sequence
            .iter()
            .map(|item| match item {
                Item::Atomic(atomic) => atomic.to_string(),
                Item::Node(node) if self.xot.is_element(node) || self.xot.is_document(node) => self
                    .xot
                    .to_string(node)
                    .unwrap_or_else(|_| self.xot.string_value(node)),
                Item::Node(node) => self.xot.string_value(node),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Documents {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that can serve as the context item of a query.
pub trait Itemable {
    fn to_item(&self, documents: &Documents) -> Result<Item>;
}

impl Itemable for DocumentHandle {
    fn to_item(&self, documents: &Documents) -> Result<Item> {
        documents
            .document_node(*self)
            .map(Item::Node)
            .ok_or(Error::UnknownDocument)
    }
}

impl Itemable for xot::Node {
    fn to_item(&self, _documents: &Documents) -> Result<Item> {
        Ok(Item::Node(*self))
    }
}

impl Itemable for Item {
    fn to_item(&self, _documents: &Documents) -> Result<Item> {
        Ok(self.clone())
    }
}

impl<T: Itemable> Itemable for &T {
    fn to_item(&self, documents: &Documents) -> Result<Item> {
        (**self).to_item(documents)
    }
}
