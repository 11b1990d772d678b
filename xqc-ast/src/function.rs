use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use xqc_schema_type::Xs;

use crate::analysis::Dependencies;
use crate::types::{Cardinality, ElementTest, ItemType, KindTest, SequenceType};

/// Functions in the `fn` namespace known to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum BuiltinFunction {
    True,
    False,
    Not,
    Boolean,
    Position,
    Last,
    Count,
    Empty,
    Exists,
    String,
    Data,
    Number,
    Sum,
    Avg,
    Min,
    Max,
    Concat,
    StringLength,
    Contains,
    StartsWith,
    EndsWith,
    StringJoin,
    Substring,
    UpperCase,
    LowerCase,
    NormalizeSpace,
    Name,
    LocalName,
    Root,
    Subsequence,
    Reverse,
    DistinctValues,
    Head,
    Tail,
    ExactlyOne,
    ZeroOrOne,
    Id,
    Key,
    CurrentGroup,
    RegexGroup,
    Error,
}

/// Static signature of one arity of a built-in function.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<SequenceType>,
    pub result: SequenceType,
    pub dependencies: Dependencies,
    /// The result has the item type of the first argument.
    pub preserves_item_type: bool,
}

fn any() -> SequenceType {
    SequenceType::any()
}

fn atomic(xs: Xs, cardinality: Cardinality) -> SequenceType {
    SequenceType::atomic(xs, cardinality)
}

fn optional_string() -> SequenceType {
    atomic(Xs::String, Cardinality::ZeroOrOne)
}

fn optional_node() -> SequenceType {
    SequenceType::new(ItemType::any_node(), Cardinality::ZeroOrOne)
}

impl BuiltinFunction {
    pub fn name(&self) -> &'static str {
        use BuiltinFunction::*;
        match self {
            True => "true",
            False => "false",
            Not => "not",
            Boolean => "boolean",
            Position => "position",
            Last => "last",
            Count => "count",
            Empty => "empty",
            Exists => "exists",
            String => "string",
            Data => "data",
            Number => "number",
            Sum => "sum",
            Avg => "avg",
            Min => "min",
            Max => "max",
            Concat => "concat",
            StringLength => "string-length",
            Contains => "contains",
            StartsWith => "starts-with",
            EndsWith => "ends-with",
            StringJoin => "string-join",
            Substring => "substring",
            UpperCase => "upper-case",
            LowerCase => "lower-case",
            NormalizeSpace => "normalize-space",
            Name => "name",
            LocalName => "local-name",
            Root => "root",
            Subsequence => "subsequence",
            Reverse => "reverse",
            DistinctValues => "distinct-values",
            Head => "head",
            Tail => "tail",
            ExactlyOne => "exactly-one",
            ZeroOrOne => "zero-or-one",
            Id => "id",
            Key => "key",
            CurrentGroup => "current-group",
            RegexGroup => "regex-group",
            Error => "error",
        }
    }

    /// Smallest and largest accepted arity; `None` for variadic.
    pub fn arity(&self) -> (usize, Option<usize>) {
        use BuiltinFunction::*;
        match self {
            True | False | Position | Last | CurrentGroup => (0, Some(0)),
            Not | Boolean | Count | Empty | Exists | Avg | Min | Max | UpperCase | LowerCase
            | Reverse | DistinctValues | Head | Tail | ExactlyOne | ZeroOrOne | RegexGroup => {
                (1, Some(1))
            }
            String | Data | Number | StringLength | NormalizeSpace | Name | LocalName | Root => {
                (0, Some(1))
            }
            Sum | StringJoin => (1, Some(2)),
            Contains | StartsWith | EndsWith => (2, Some(2)),
            Substring | Subsequence => (2, Some(3)),
            Id => (1, Some(2)),
            Key => (2, Some(3)),
            Concat => (2, None),
            Error => (0, Some(2)),
        }
    }

    pub fn accepts_arity(&self, arity: usize) -> bool {
        let (min, max) = self.arity();
        arity >= min && max.map(|max| arity <= max).unwrap_or(true)
    }

    pub fn lookup(local_name: &str, arity: usize) -> Option<BuiltinFunction> {
        BuiltinFunction::iter().find(|f| f.name() == local_name && f.accepts_arity(arity))
    }

    /// When called without its optional last argument, the function reads
    /// the context item instead.
    pub fn uses_context_when_omitted(&self, arity: usize) -> bool {
        use BuiltinFunction::*;
        match self {
            String | Data | Number | StringLength | NormalizeSpace | Name | LocalName | Root => {
                arity == 0
            }
            Id => arity == 1,
            Key => arity == 2,
            _ => false,
        }
    }

    pub fn signature(&self, arity: usize) -> Signature {
        use BuiltinFunction::*;
        let boolean = || atomic(Xs::Boolean, Cardinality::One);
        let string = || atomic(Xs::String, Cardinality::One);
        let integer = || atomic(Xs::Integer, Cardinality::One);
        let double = || atomic(Xs::Double, Cardinality::One);
        let atomics = || atomic(Xs::AnyAtomicType, Cardinality::ZeroOrMore);
        let optional_atomic = || atomic(Xs::AnyAtomicType, Cardinality::ZeroOrOne);

        let (params, result) = match self {
            True | False => (vec![], boolean()),
            Not | Boolean | Empty | Exists => (vec![any()], boolean()),
            Position | Last => (vec![], integer()),
            Count => (vec![any()], integer()),
            String => (
                vec![SequenceType::new(ItemType::Item, Cardinality::ZeroOrOne)],
                string(),
            ),
            Data => (vec![any()], atomics()),
            Number => (vec![optional_atomic()], double()),
            Sum => (
                vec![atomics(), optional_atomic()],
                if arity == 1 {
                    atomic(Xs::AnyAtomicType, Cardinality::One)
                } else {
                    optional_atomic()
                },
            ),
            Avg | Min | Max => (vec![atomics()], optional_atomic()),
            Concat => (vec![optional_atomic(); arity.max(2)], string()),
            StringLength => (vec![optional_string()], integer()),
            Contains | StartsWith | EndsWith => {
                (vec![optional_string(), optional_string()], boolean())
            }
            StringJoin => (vec![atomics(), string()], string()),
            Substring => (vec![optional_string(), double(), double()], string()),
            UpperCase | LowerCase | NormalizeSpace => (vec![optional_string()], string()),
            Name | LocalName => (vec![optional_node()], string()),
            Root => (vec![optional_node()], optional_node()),
            Subsequence => (vec![any(), double(), double()], any()),
            Reverse | Tail => (vec![any()], any()),
            Head => (
                vec![any()],
                SequenceType::new(ItemType::Item, Cardinality::ZeroOrOne),
            ),
            ExactlyOne => (vec![any()], SequenceType::one(ItemType::Item)),
            ZeroOrOne => (
                vec![any()],
                SequenceType::new(ItemType::Item, Cardinality::ZeroOrOne),
            ),
            DistinctValues => (vec![atomics()], atomics()),
            Id => (
                vec![
                    atomic(Xs::String, Cardinality::ZeroOrMore),
                    SequenceType::one(ItemType::any_node()),
                ],
                SequenceType::new(
                    ItemType::Node(KindTest::Element(ElementTest::default())),
                    Cardinality::ZeroOrMore,
                ),
            ),
            Key => (
                vec![
                    string(),
                    atomics(),
                    SequenceType::one(ItemType::any_node()),
                ],
                SequenceType::new(ItemType::any_node(), Cardinality::ZeroOrMore),
            ),
            CurrentGroup => (vec![], any()),
            RegexGroup => (vec![integer()], string()),
            Error => (vec![optional_atomic(), optional_string()], any()),
        };
        let params = params.into_iter().take(arity).collect();

        let mut dependencies = match self {
            Position => Dependencies::POSITION,
            Last => Dependencies::LAST,
            CurrentGroup => Dependencies::CURRENT_GROUP,
            RegexGroup => Dependencies::MATCHED_GROUP,
            _ => Dependencies::empty(),
        };
        if self.uses_context_when_omitted(arity) {
            dependencies |= Dependencies::CONTEXT_ITEM;
        }
        Signature {
            params,
            result,
            dependencies,
            preserves_item_type: matches!(
                self,
                Subsequence | Reverse | Head | Tail | ExactlyOne | ZeroOrOne
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_arity() {
        assert_eq!(
            BuiltinFunction::lookup("string", 0),
            Some(BuiltinFunction::String)
        );
        assert_eq!(
            BuiltinFunction::lookup("string", 1),
            Some(BuiltinFunction::String)
        );
        assert_eq!(BuiltinFunction::lookup("string", 2), None);
        assert_eq!(
            BuiltinFunction::lookup("concat", 5),
            Some(BuiltinFunction::Concat)
        );
        assert_eq!(BuiltinFunction::lookup("concat", 1), None);
    }

    #[test]
    fn test_context_dependency() {
        let sig = BuiltinFunction::String.signature(0);
        assert!(sig.dependencies.contains(Dependencies::CONTEXT_ITEM));
        assert!(sig.params.is_empty());
        let sig = BuiltinFunction::String.signature(1);
        assert!(sig.dependencies.is_empty());
        assert_eq!(sig.params.len(), 1);
        let sig = BuiltinFunction::Last.signature(0);
        assert_eq!(sig.dependencies, Dependencies::LAST);
    }

    #[test]
    fn test_concat_params() {
        assert_eq!(BuiltinFunction::Concat.signature(4).params.len(), 4);
    }
}
