use ahash::{HashMap, HashMapExt};

pub const FN_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions";
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
pub const MATH_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions/math";
pub const ERR_NAMESPACE: &str = "http://www.w3.org/2005/xqt-errors";

const STATIC_NAMESPACES: [(&str, &str); 5] = [
    ("xml", XML_NAMESPACE),
    ("xs", XS_NAMESPACE),
    ("fn", FN_NAMESPACE),
    ("math", MATH_NAMESPACE),
    ("err", ERR_NAMESPACE),
];

/// In-scope namespace declarations.
///
/// Owns its strings so that a compiled query holding these can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct Namespaces {
    namespaces: HashMap<String, String>,
    pub default_element_namespace: Option<String>,
    pub default_function_namespace: Option<String>,
}

impl Namespaces {
    pub fn new(
        namespaces: HashMap<String, String>,
        default_element_namespace: Option<String>,
        default_function_namespace: Option<String>,
    ) -> Self {
        Self {
            namespaces,
            default_element_namespace,
            default_function_namespace,
        }
    }

    pub fn default_namespaces() -> HashMap<String, String> {
        let mut namespaces = HashMap::new();
        for (prefix, uri) in STATIC_NAMESPACES.into_iter() {
            namespaces.insert(prefix.to_string(), uri.to_string());
        }
        namespaces
    }

    /// Add prefix/uri pairs. An empty prefix sets the default element
    /// namespace.
    pub fn add(&mut self, namespace_pairs: &[(&str, &str)]) {
        for (prefix, uri) in namespace_pairs {
            if prefix.is_empty() {
                self.default_element_namespace = Some(uri.to_string());
            } else {
                self.namespaces.insert(prefix.to_string(), uri.to_string());
            }
        }
    }

    pub fn by_prefix(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(|s| s.as_str())
    }

    pub fn default_element_namespace(&self) -> Option<&str> {
        self.default_element_namespace.as_deref()
    }

    pub fn default_function_namespace(&self) -> Option<&str> {
        self.default_function_namespace.as_deref()
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        Self::new(
            Self::default_namespaces(),
            None,
            Some(FN_NAMESPACE.to_string()),
        )
    }
}

pub trait NamespaceLookup {
    fn by_prefix(&self, prefix: &str) -> Option<&str>;
}

impl NamespaceLookup for Namespaces {
    fn by_prefix(&self, prefix: &str) -> Option<&str> {
        Namespaces::by_prefix(self, prefix)
    }
}

impl<T: NamespaceLookup> NamespaceLookup for &T {
    fn by_prefix(&self, prefix: &str) -> Option<&str> {
        (**self).by_prefix(prefix)
    }
}
