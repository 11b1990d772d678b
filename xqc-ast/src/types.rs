use std::fmt;

use xqc_name::Name;
use xqc_schema_type::Xs;

/// Namespace under which implementation-defined (foreign object) types are
/// named.
pub const FOREIGN_NAMESPACE: &str = "http://xqc.dev/ns/foreign";

/// Statically inferred multiplicity of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Empty,
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Cardinality {
    fn bounds(self) -> (usize, Option<usize>) {
        match self {
            Cardinality::Empty => (0, Some(0)),
            Cardinality::One => (1, Some(1)),
            Cardinality::ZeroOrOne => (0, Some(1)),
            Cardinality::ZeroOrMore => (0, None),
            Cardinality::OneOrMore => (1, None),
        }
    }

    fn from_bounds(min: usize, max: Option<usize>) -> Self {
        match max {
            Some(0) => Cardinality::Empty,
            Some(1) if min >= 1 => Cardinality::One,
            Some(1) => Cardinality::ZeroOrOne,
            _ if min >= 1 => Cardinality::OneOrMore,
            _ => Cardinality::ZeroOrMore,
        }
    }

    /// The cardinality of a sequence literal with `len` items.
    pub fn of_len(len: usize) -> Self {
        Self::from_bounds(len, Some(len))
    }

    pub fn allows_empty(self) -> bool {
        self.bounds().0 == 0
    }

    pub fn allows_many(self) -> bool {
        !matches!(self.bounds().1, Some(0) | Some(1))
    }

    pub fn is_exactly_one(self) -> bool {
        self == Cardinality::One
    }

    pub fn at_most_one(self) -> bool {
        !self.allows_many()
    }

    /// Does every multiplicity allowed by `other` also fit `self`?
    pub fn contains(self, other: Cardinality) -> bool {
        let (min, max) = self.bounds();
        let (other_min, other_max) = other.bounds();
        let max_ok = match (max, other_max) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(max), Some(other_max)) => other_max <= max,
        };
        other_min >= min && max_ok
    }

    /// Could a sequence of cardinality `other` ever fit `self`?
    pub fn overlaps(self, other: Cardinality) -> bool {
        let (min, max) = self.bounds();
        let (other_min, other_max) = other.bounds();
        let lower = min.max(other_min);
        let upper = match (max, other_max) {
            (None, None) => None,
            (Some(m), None) | (None, Some(m)) => Some(m),
            (Some(a), Some(b)) => Some(a.min(b)),
        };
        upper.map(|upper| lower <= upper).unwrap_or(true)
    }

    /// Cardinality of `(a, b)`.
    pub fn concat(self, other: Cardinality) -> Cardinality {
        let (min, max) = self.bounds();
        let (other_min, other_max) = other.bounds();
        let max = match (max, other_max) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        };
        Self::from_bounds(min + other_min, max)
    }

    /// Cardinality of evaluating something of cardinality `other` once for
    /// every item of a sequence of cardinality `self`.
    pub fn product(self, other: Cardinality) -> Cardinality {
        let (min, max) = self.bounds();
        let (other_min, other_max) = other.bounds();
        let max = match (max, other_max) {
            (Some(0), _) | (_, Some(0)) => Some(0),
            (Some(a), Some(b)) => Some(a * b),
            _ => None,
        };
        Self::from_bounds(min * other_min, max)
    }

    pub fn optional(self) -> Cardinality {
        let (_, max) = self.bounds();
        Self::from_bounds(0, max)
    }

    /// Cardinality of an expression that yields one of two alternatives.
    ///
    /// Only `Empty` and the optional forms are combined precisely; any
    /// other mixture widens to `ZeroOrMore`.
    pub fn join(self, other: Cardinality) -> Cardinality {
        use Cardinality::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Empty, x) | (x, Empty) => x.optional(),
            (One | ZeroOrOne, One | ZeroOrOne) => ZeroOrOne,
            _ => ZeroOrMore,
        }
    }

    pub fn occurrence_indicator(self) -> &'static str {
        match self {
            Cardinality::Empty | Cardinality::One => "",
            Cardinality::ZeroOrOne => "?",
            Cardinality::ZeroOrMore => "*",
            Cardinality::OneOrMore => "+",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cardinality::Empty => "empty",
            Cardinality::One => "exactly-one",
            Cardinality::ZeroOrOne => "zero-or-one",
            Cardinality::ZeroOrMore => "zero-or-more",
            Cardinality::OneOrMore => "one-or-more",
        };
        write!(f, "{}", s)
    }
}

/// `element(N, T)` / `attribute(N, T)`; `None` for a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ElementTest {
    pub name: Option<Name>,
    pub type_annotation: Option<Name>,
}

impl ElementTest {
    fn is_subtype_of(&self, other: &ElementTest) -> bool {
        let name_ok = other.name.is_none() || self.name == other.name;
        let type_ok = other.type_annotation.is_none() || self.type_annotation == other.type_annotation;
        name_ok && type_ok
    }

    fn overlaps(&self, other: &ElementTest) -> bool {
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KindTest {
    AnyNode,
    Document(Option<ElementTest>),
    Element(ElementTest),
    Attribute(ElementTest),
    Text,
    Comment,
    ProcessingInstruction(Option<String>),
    NamespaceNode,
}

impl KindTest {
    pub fn is_subtype_of(&self, other: &KindTest) -> bool {
        use KindTest::*;
        match (self, other) {
            (_, AnyNode) => true,
            (Document(a), Document(b)) => match (a, b) {
                (_, None) => true,
                (Some(a), Some(b)) => a.is_subtype_of(b),
                (None, Some(_)) => false,
            },
            (Element(a), Element(b)) | (Attribute(a), Attribute(b)) => a.is_subtype_of(b),
            (ProcessingInstruction(a), ProcessingInstruction(b)) => b.is_none() || a == b,
            (Text, Text) | (Comment, Comment) | (NamespaceNode, NamespaceNode) => true,
            _ => false,
        }
    }

    pub fn overlaps(&self, other: &KindTest) -> bool {
        use KindTest::*;
        match (self, other) {
            (AnyNode, _) | (_, AnyNode) => true,
            (Document(a), Document(b)) => match (a, b) {
                (Some(a), Some(b)) => a.overlaps(b),
                _ => true,
            },
            (Element(a), Element(b)) | (Attribute(a), Attribute(b)) => a.overlaps(b),
            (ProcessingInstruction(a), ProcessingInstruction(b)) => {
                a.is_none() || b.is_none() || a == b
            }
            (Text, Text) | (Comment, Comment) | (NamespaceNode, NamespaceNode) => true,
            _ => false,
        }
    }

    fn common(&self, other: &KindTest) -> KindTest {
        if self.is_subtype_of(other) {
            other.clone()
        } else if other.is_subtype_of(self) {
            self.clone()
        } else {
            match (self, other) {
                (KindTest::Element(_), KindTest::Element(_)) => {
                    KindTest::Element(ElementTest::default())
                }
                (KindTest::Attribute(_), KindTest::Attribute(_)) => {
                    KindTest::Attribute(ElementTest::default())
                }
                _ => KindTest::AnyNode,
            }
        }
    }
}

/// Statically known item type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemType {
    Item,
    Atomic(Xs),
    /// An implementation-defined object type, by local name in
    /// [`FOREIGN_NAMESPACE`].
    Foreign(String),
    /// A type from an imported schema. Opaque: all we know is that it is
    /// an atomic type.
    Imported(Name),
    Node(KindTest),
}

impl ItemType {
    pub fn any_node() -> Self {
        ItemType::Node(KindTest::AnyNode)
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, ItemType::Atomic(_) | ItemType::Imported(_))
    }

    pub fn is_node(&self) -> bool {
        matches!(self, ItemType::Node(_))
    }

    /// Could an item of this type be numeric?
    pub fn may_be_numeric(&self) -> bool {
        match self {
            ItemType::Item | ItemType::Imported(_) => true,
            ItemType::Atomic(xs) => xs.is_numeric() || xs.is_abstract(),
            ItemType::Foreign(_) | ItemType::Node(_) => false,
        }
    }

    pub fn is_subtype_of(&self, other: &ItemType) -> bool {
        match (self, other) {
            (_, ItemType::Item) => true,
            (ItemType::Atomic(a), ItemType::Atomic(b)) => a.derives_from(*b),
            (ItemType::Imported(_), ItemType::Atomic(Xs::AnyAtomicType)) => true,
            (ItemType::Imported(a), ItemType::Imported(b)) => a == b,
            (ItemType::Foreign(a), ItemType::Foreign(b)) => a == b,
            (ItemType::Node(a), ItemType::Node(b)) => a.is_subtype_of(b),
            _ => false,
        }
    }

    /// Could some item be an instance of both types?
    pub fn overlaps(&self, other: &ItemType) -> bool {
        match (self, other) {
            (ItemType::Item, _) | (_, ItemType::Item) => true,
            (ItemType::Atomic(a), ItemType::Atomic(b)) => a.derives_from(*b) || b.derives_from(*a),
            (ItemType::Imported(_), ItemType::Atomic(_) | ItemType::Imported(_))
            | (ItemType::Atomic(_), ItemType::Imported(_)) => true,
            (ItemType::Foreign(a), ItemType::Foreign(b)) => a == b,
            (ItemType::Node(a), ItemType::Node(b)) => a.overlaps(b),
            _ => false,
        }
    }

    /// Least common supertype, approximately.
    pub fn common(&self, other: &ItemType) -> ItemType {
        if self.is_subtype_of(other) {
            return other.clone();
        }
        if other.is_subtype_of(self) {
            return self.clone();
        }
        match (self, other) {
            (ItemType::Atomic(a), ItemType::Atomic(b)) => ItemType::Atomic(a.common_supertype(*b)),
            (ItemType::Node(a), ItemType::Node(b)) => ItemType::Node(a.common(b)),
            (a, b) if a.is_atomic() && b.is_atomic() => ItemType::Atomic(Xs::AnyAtomicType),
            _ => ItemType::Item,
        }
    }
}

/// An item type plus an occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceType {
    pub item_type: ItemType,
    pub cardinality: Cardinality,
}

impl SequenceType {
    pub fn new(item_type: ItemType, cardinality: Cardinality) -> Self {
        Self {
            item_type,
            cardinality,
        }
    }

    pub fn empty() -> Self {
        Self::new(ItemType::Item, Cardinality::Empty)
    }

    pub fn any() -> Self {
        Self::new(ItemType::Item, Cardinality::ZeroOrMore)
    }

    pub fn one(item_type: ItemType) -> Self {
        Self::new(item_type, Cardinality::One)
    }

    pub fn atomic(xs: Xs, cardinality: Cardinality) -> Self {
        Self::new(ItemType::Atomic(xs), cardinality)
    }

    /// Every value of type `self` is also of type `other`.
    pub fn is_subtype_of(&self, other: &SequenceType) -> bool {
        if !other.cardinality.contains(self.cardinality) {
            return false;
        }
        self.cardinality == Cardinality::Empty || self.item_type.is_subtype_of(&other.item_type)
    }

    /// Some value could be of both types.
    pub fn overlaps(&self, other: &SequenceType) -> bool {
        if !self.cardinality.overlaps(other.cardinality) {
            return false;
        }
        // the empty sequence is an instance of any type allowing it
        (self.cardinality.allows_empty() && other.cardinality.allows_empty())
            || self.item_type.overlaps(&other.item_type)
    }
}

fn write_element_test(f: &mut fmt::Formatter<'_>, kind: &str, test: &ElementTest) -> fmt::Result {
    write!(f, "{}(", kind)?;
    match (&test.name, &test.type_annotation) {
        (None, None) => {}
        (Some(name), None) => write!(f, "{}", name)?,
        (name, Some(annotation)) => {
            match name {
                Some(name) => write!(f, "{}", name)?,
                None => write!(f, "*")?,
            }
            write!(f, ", {}", annotation)?
        }
    }
    write!(f, ")")
}

impl fmt::Display for KindTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindTest::AnyNode => write!(f, "node()"),
            KindTest::Document(None) => write!(f, "document-node()"),
            KindTest::Document(Some(test)) => {
                write!(f, "document-node(")?;
                write_element_test(f, "element", test)?;
                write!(f, ")")
            }
            KindTest::Element(test) => write_element_test(f, "element", test),
            KindTest::Attribute(test) => write_element_test(f, "attribute", test),
            KindTest::Text => write!(f, "text()"),
            KindTest::Comment => write!(f, "comment()"),
            KindTest::ProcessingInstruction(None) => write!(f, "processing-instruction()"),
            KindTest::ProcessingInstruction(Some(target)) => {
                write!(f, "processing-instruction({})", target)
            }
            KindTest::NamespaceNode => write!(f, "namespace-node()"),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Item => write!(f, "item()"),
            ItemType::Atomic(xs) => write!(f, "xs:{}", xs.local_name()),
            ItemType::Foreign(name) => write!(f, "Q{{{}}}{}", FOREIGN_NAMESPACE, name),
            ItemType::Imported(name) => write!(f, "{}", name),
            ItemType::Node(kind) => write!(f, "{}", kind),
        }
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cardinality == Cardinality::Empty {
            return write!(f, "empty-sequence()");
        }
        write!(f, "{}{}", self.item_type, self.cardinality.occurrence_indicator())
    }
}
