use std::fmt;
use std::sync::Arc;

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use xqc_name::{Name, Namespaces};
use xqc_schema_type::TypeProfile;

use crate::types::SequenceType;

/// A non-fatal compile-time message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Receives warnings. Warnings never change what gets compiled.
pub trait DiagnosticSink: Send + Sync + fmt::Debug {
    fn warning(&self, diagnostic: &Diagnostic);
}

/// The default sink: forwards warnings to `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warning(&self, diagnostic: &Diagnostic) {
        tracing::warn!(
            line = diagnostic.line,
            column = diagnostic.column,
            "{}",
            diagnostic.message
        );
    }
}

/// Switches for the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Run the optimize pass at all.
    pub optimize: bool,
    /// Hoist loop- and focus-invariant subexpressions.
    pub hoist: bool,
    /// Turn eligible equality filters into indexed lookups.
    pub index: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            hoist: true,
            index: true,
        }
    }
}

impl OptimizerConfig {
    pub fn disabled() -> Self {
        Self {
            optimize: false,
            hoist: false,
            index: false,
        }
    }
}

/// The compile-time environment: namespaces, known variables, the type
/// profile, and optimizer switches.
#[derive(Debug, Clone)]
pub struct StaticContext {
    namespaces: Namespaces,
    variables: HashMap<Name, Option<SequenceType>>,
    imported_schemas: HashSet<String>,
    profile: TypeProfile,
    backwards_compatible: bool,
    optimizer: OptimizerConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl StaticContext {
    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// `None` if the variable is unknown; `Some(None)` if it is known but
    /// has no declared type.
    pub fn variable_type(&self, name: &Name) -> Option<Option<&SequenceType>> {
        self.variables.get(name).map(|t| t.as_ref())
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &Name> {
        self.variables.keys()
    }

    pub fn is_schema_imported(&self, namespace: &str) -> bool {
        self.imported_schemas.contains(namespace)
    }

    pub fn profile(&self) -> TypeProfile {
        self.profile
    }

    pub fn backwards_compatible(&self) -> bool {
        self.backwards_compatible
    }

    pub fn optimizer(&self) -> OptimizerConfig {
        self.optimizer
    }

    pub fn warn(&self, message: impl Into<String>, line: usize, column: usize) {
        self.sink.warning(&Diagnostic {
            message: message.into(),
            line,
            column,
        })
    }
}

impl Default for StaticContext {
    fn default() -> Self {
        StaticContextBuilder::default().build()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticContextBuilder {
    namespaces: Vec<(String, String)>,
    default_element_namespace: Option<String>,
    default_function_namespace: Option<String>,
    variables: Vec<(Name, Option<SequenceType>)>,
    imported_schemas: Vec<String>,
    profile: TypeProfile,
    backwards_compatible: bool,
    optimizer: Option<OptimizerConfig>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl StaticContextBuilder {
    /// Set the namespace prefixes that the expression can use.
    ///
    /// If a prefix is empty, it sets the default element namespace.
    pub fn namespaces<'a>(
        &mut self,
        namespaces: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> &mut Self {
        for (prefix, uri) in namespaces {
            if prefix.is_empty() {
                self.default_element_namespace = Some(uri.to_string());
            } else {
                self.namespaces.push((prefix.to_string(), uri.to_string()));
            }
        }
        self
    }

    pub fn default_element_namespace(&mut self, uri: &str) -> &mut Self {
        self.default_element_namespace = Some(uri.to_string());
        self
    }

    pub fn default_function_namespace(&mut self, uri: &str) -> &mut Self {
        self.default_function_namespace = Some(uri.to_string());
        self
    }

    /// Declare a context variable, optionally with a type.
    pub fn variable(&mut self, name: Name, declared: Option<SequenceType>) -> &mut Self {
        self.variables.push((name, declared));
        self
    }

    /// Declare untyped context variables.
    pub fn variable_names(&mut self, names: impl IntoIterator<Item = Name>) -> &mut Self {
        self.variables
            .extend(names.into_iter().map(|name| (name, None)));
        self
    }

    /// Make the types of a schema namespace available by name.
    pub fn import_schema(&mut self, namespace: &str) -> &mut Self {
        self.imported_schemas.push(namespace.to_string());
        self
    }

    pub fn profile(&mut self, profile: TypeProfile) -> &mut Self {
        self.profile = profile;
        self
    }

    /// In backwards-compatible mode, calls to unknown functions compile
    /// and fail only if they are evaluated.
    pub fn backwards_compatible(&mut self, backwards_compatible: bool) -> &mut Self {
        self.backwards_compatible = backwards_compatible;
        self
    }

    pub fn optimizer(&mut self, optimizer: OptimizerConfig) -> &mut Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn diagnostic_sink(&mut self, sink: Arc<dyn DiagnosticSink>) -> &mut Self {
        self.sink = Some(sink);
        self
    }

    /// Build the static context.
    ///
    /// The predeclared prefixes (`xml`, `xs`, `fn`, `math`, `err`) are always
    /// present, and the default function namespace is `fn` unless set.
    pub fn build(&self) -> StaticContext {
        let mut namespaces = Namespaces::default();
        for (prefix, uri) in &self.namespaces {
            namespaces.add(&[(prefix.as_str(), uri.as_str())]);
        }
        if let Some(uri) = &self.default_element_namespace {
            namespaces.default_element_namespace = Some(uri.clone());
        }
        if let Some(uri) = &self.default_function_namespace {
            namespaces.default_function_namespace = Some(uri.clone());
        }
        let mut variables = HashMap::new();
        for (name, declared) in &self.variables {
            variables.insert(name.clone(), declared.clone());
        }
        let mut imported_schemas = HashSet::new();
        imported_schemas.extend(self.imported_schemas.iter().cloned());
        StaticContext {
            namespaces,
            variables,
            imported_schemas,
            profile: self.profile,
            backwards_compatible: self.backwards_compatible,
            optimizer: self.optimizer.unwrap_or_default(),
            sink: self
                .sink
                .clone()
                .unwrap_or_else(|| Arc::new(TracingSink)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_behavior() {
        let context = StaticContextBuilder::default().build();
        assert_eq!(context.namespaces().default_element_namespace(), None);
        assert_eq!(
            context.namespaces().default_function_namespace(),
            Some(xqc_name::FN_NAMESPACE)
        );
        assert_eq!(context.namespaces().by_prefix("xs"), Some(xqc_name::XS_NAMESPACE));
        assert!(context.optimizer().optimize);
    }

    #[test]
    fn test_empty_prefix_sets_default_namespace() {
        let mut builder = StaticContextBuilder::default();
        builder.namespaces([("", "urn:d"), ("p", "urn:p")]);
        let context = builder.build();
        assert_eq!(context.namespaces().default_element_namespace(), Some("urn:d"));
        assert_eq!(context.namespaces().by_prefix("p"), Some("urn:p"));
    }

    #[test]
    fn test_variables() {
        let mut builder = StaticContextBuilder::default();
        builder.variable_names([Name::unprefixed("foo")]);
        let context = builder.build();
        assert_eq!(context.variable_type(&Name::unprefixed("foo")), Some(None));
        assert_eq!(context.variable_type(&Name::unprefixed("bar")), None);
    }
}
