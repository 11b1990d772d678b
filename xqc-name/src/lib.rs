mod name;
mod namespaces;

pub use name::Name;
pub use namespaces::{
    NamespaceLookup, Namespaces, ERR_NAMESPACE, FN_NAMESPACE, MATH_NAMESPACE, XML_NAMESPACE,
    XS_NAMESPACE,
};
