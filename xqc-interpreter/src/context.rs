use std::fmt;

use ahash::{HashMap, HashMapExt};
use xot::Xot;
use xqc_name::Name;

use crate::error;
use crate::sequence::Sequence;

/// Looks up `key()` results. Key declarations belong to the
/// transformation engine hosting the expression.
pub trait KeyResolver: fmt::Debug {
    /// Nodes under `root` whose key `name` has the value `key`.
    fn resolve(
        &self,
        xot: &Xot,
        name: &Name,
        key: &str,
        root: xot::Node,
    ) -> error::Result<Vec<xot::Node>>;
}

/// The dynamic context: values of the context (global) variables, and the
/// key resolver if the host has one.
#[derive(Debug, Default)]
pub struct DynamicContext {
    variables: HashMap<Name, Sequence>,
    key_resolver: Option<Box<dyn KeyResolver>>,
}

impl DynamicContext {
    pub fn variable(&self, name: &Name) -> Option<&Sequence> {
        self.variables.get(name)
    }

    pub fn key_resolver(&self) -> Option<&dyn KeyResolver> {
        self.key_resolver.as_deref()
    }
}

#[derive(Debug, Default)]
pub struct DynamicContextBuilder {
    variables: HashMap<Name, Sequence>,
    key_resolver: Option<Box<dyn KeyResolver>>,
}

impl DynamicContextBuilder {
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
            key_resolver: None,
        }
    }

    pub fn variable(&mut self, name: Name, value: Sequence) -> &mut Self {
        self.variables.insert(name, value);
        self
    }

    pub fn variables(&mut self, variables: impl IntoIterator<Item = (Name, Sequence)>) -> &mut Self {
        self.variables.extend(variables);
        self
    }

    pub fn key_resolver(&mut self, resolver: Box<dyn KeyResolver>) -> &mut Self {
        self.key_resolver = Some(resolver);
        self
    }

    pub fn build(&mut self) -> DynamicContext {
        DynamicContext {
            variables: std::mem::take(&mut self.variables),
            key_resolver: self.key_resolver.take(),
        }
    }
}
