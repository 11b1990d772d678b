use std::fmt;

use xot::Xot;

use crate::namespaces::NamespaceLookup;

/// An expanded name: a local name with an optional namespace URI.
///
/// The prefix is retained for display only; two names with the same
/// namespace and local name are equal whatever prefix they were written
/// with.
#[derive(Debug, Clone, Eq)]
pub struct Name {
    name: String,
    prefix: Option<String>,
    namespace: Option<String>,
}

// a custom hasher that ignores the prefix
impl std::hash::Hash for Name {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.namespace.hash(state);
    }
}

// and partial eq that ignores the prefix
impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.namespace == other.namespace
    }
}

impl Name {
    pub fn new(name: String, namespace: Option<String>, prefix: Option<String>) -> Self {
        Name {
            name,
            namespace,
            prefix,
        }
    }

    pub fn from_xot(name: xot::NameId, xot: &Xot) -> Self {
        let (name, namespace) = xot.name_ns_str(name);
        let namespace = if !namespace.is_empty() {
            Some(namespace.to_string())
        } else {
            None
        };
        Name {
            name: name.to_string(),
            namespace,
            prefix: None,
        }
    }

    /// Resolve `prefix:name` through a namespace lookup. Returns `None`
    /// when the prefix is not declared.
    pub fn prefixed(prefix: &str, name: &str, namespaces: impl NamespaceLookup) -> Option<Self> {
        let namespace = namespaces.by_prefix(prefix)?;
        Some(Name {
            name: name.to_string(),
            namespace: Some(namespace.to_string()),
            prefix: Some(prefix.to_string()),
        })
    }

    pub fn unprefixed(name: &str) -> Self {
        Name {
            name: name.to_string(),
            namespace: None,
            prefix: None,
        }
    }

    pub fn uri_qualified(uri: &str, name: &str) -> Self {
        let namespace = if uri.is_empty() {
            None
        } else {
            Some(uri.to_string())
        };
        Name {
            name: name.to_string(),
            namespace,
            prefix: None,
        }
    }

    pub fn with_default_namespace(self, uri: Option<&str>) -> Self {
        if let Some(uri) = uri {
            if self.namespace.is_none() && self.prefix.is_none() {
                return Name {
                    name: self.name,
                    namespace: Some(uri.to_string()),
                    prefix: None,
                };
            }
        }
        self
    }

    #[inline]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        &self.name
    }

    pub fn to_full_name(&self) -> String {
        match &self.prefix {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, self.name),
            _ => self.name.clone(),
        }
    }

    pub fn add_name_id(&self, xot: &mut Xot) -> xot::NameId {
        if let Some(namespace) = &self.namespace {
            let ns = xot.add_namespace(namespace);
            xot.add_name_ns(&self.name, ns)
        } else {
            xot.add_name(&self.name)
        }
    }

    /// Look up the name in the xot name table without adding it. If it
    /// isn't known to xot, no node in any document can carry it.
    pub fn to_name_id(&self, xot: &Xot) -> Option<xot::NameId> {
        if let Some(namespace) = &self.namespace {
            let namespace_id = xot.namespace(namespace)?;
            xot.name_ns(&self.name, namespace_id)
        } else {
            xot.name(&self.name)
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.prefix, &self.namespace) {
            (Some(prefix), _) if !prefix.is_empty() => write!(f, "{}:{}", prefix, self.name),
            (_, Some(namespace)) => write!(f, "Q{{{}}}{}", namespace, self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Name::unprefixed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Namespaces;

    #[test]
    fn test_prefix_ignored_in_equality() {
        let namespaces = Namespaces::default();
        let a = Name::prefixed("fn", "count", &namespaces).unwrap();
        let b = Name::uri_qualified(crate::FN_NAMESPACE, "count");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "fn:count");
        assert_eq!(b.to_string(), "Q{http://www.w3.org/2005/xpath-functions}count");
    }

    #[test]
    fn test_undeclared_prefix() {
        let namespaces = Namespaces::default();
        assert!(Name::prefixed("nope", "x", &namespaces).is_none());
    }

    #[test]
    fn test_default_namespace_only_for_unprefixed() {
        let name = Name::unprefixed("a").with_default_namespace(Some("urn:x"));
        assert_eq!(name.namespace(), Some("urn:x"));
    }
}
