use xot::Xot;

use crate::atomic::Atomic;
use crate::error::{Error, SpannedResult};

/// An item: an atomic value or a node in an `xot` tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Atomic(Atomic),
    Node(xot::Node),
}

impl Item {
    pub fn to_node(&self) -> Option<xot::Node> {
        match self {
            Item::Node(node) => Some(*node),
            Item::Atomic(_) => None,
        }
    }

    pub fn to_atomic(&self) -> Option<&Atomic> {
        match self {
            Item::Atomic(atomic) => Some(atomic),
            Item::Node(_) => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Item::Node(_))
    }

    /// The typed value of the item. Nodes carry no schema type, so their
    /// typed value is their string value as untyped atomic, except for
    /// comments and processing instructions which are strings.
    pub fn atomized(&self, xot: &Xot) -> Atomic {
        match self {
            Item::Atomic(atomic) => atomic.clone(),
            Item::Node(node) => {
                let value = xot.string_value(*node);
                match xot.value(*node) {
                    xot::Value::Comment(_) | xot::Value::ProcessingInstruction(_) => {
                        Atomic::String(value.into())
                    }
                    _ => Atomic::Untyped(value.into()),
                }
            }
        }
    }

    pub fn string_value(&self, xot: &Xot) -> String {
        match self {
            Item::Atomic(atomic) => atomic.string_value(),
            Item::Node(node) => xot.string_value(*node),
        }
    }
}

impl<T> From<T> for Item
where
    T: Into<Atomic>,
{
    fn from(a: T) -> Self {
        Self::Atomic(a.into())
    }
}

/// Effective boolean value of a sequence, pulling at most two items.
///
/// Empty is false and a leading node is true whatever follows. A single
/// atomic value has its own truthiness; an atomic value followed by
/// anything else has no effective boolean value.
pub fn effective_boolean_value<I>(items: I) -> SpannedResult<bool>
where
    I: IntoIterator<Item = SpannedResult<Item>>,
{
    let mut items = items.into_iter();
    match items.next().transpose()? {
        None => Ok(false),
        Some(Item::Node(_)) => Ok(true),
        Some(Item::Atomic(atomic)) => {
            if items.next().transpose()?.is_some() {
                return Err(Error::FORG0006.into());
            }
            Ok(atomic.effective_boolean_value()?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ebv(items: Vec<Item>) -> SpannedResult<bool> {
        effective_boolean_value(items.into_iter().map(Ok))
    }

    #[test]
    fn test_ebv_table() {
        let mut xot = Xot::new();
        let doc = xot.parse("<a/>").unwrap();
        assert_eq!(ebv(vec![]), Ok(false));
        assert_eq!(ebv(vec![Item::Node(doc), Item::from(false)]), Ok(true));
        assert_eq!(ebv(vec![Item::from(false)]), Ok(false));
        assert_eq!(ebv(vec![Item::from("")]), Ok(false));
        assert_eq!(ebv(vec![Item::from("a")]), Ok(true));
        assert_eq!(ebv(vec![Item::from(0i64)]), Ok(false));
        assert_eq!(ebv(vec![Item::from(f64::NAN)]), Ok(false));
        assert_eq!(ebv(vec![Item::from(5i64)]), Ok(true));
        assert_eq!(
            ebv(vec![Item::from(true), Item::from(1i64)]).unwrap_err().error,
            Error::FORG0006
        );
    }

    #[test]
    fn test_ebv_stops_after_leading_node() {
        let mut xot = Xot::new();
        let doc = xot.parse("<a/>").unwrap();
        let items = vec![Ok(Item::Node(doc)), Err(Error::FOER0000.into())];
        assert_eq!(effective_boolean_value(items), Ok(true));
    }

    #[test]
    fn test_atomized_node_is_untyped() {
        let mut xot = Xot::new();
        let doc = xot.parse("<a>x<b>y</b></a>").unwrap();
        assert_eq!(
            Item::Node(doc).atomized(&xot),
            Atomic::Untyped("xy".into())
        );
    }
}
