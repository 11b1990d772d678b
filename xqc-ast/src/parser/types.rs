use xqc_lexer::Token;
use xqc_schema_type::Xs;

use crate::error::{Error, StaticResult};
use crate::types::{Cardinality, ItemType, SequenceType};

use super::name::NameDefault;
use super::Parser;

impl<'a, 'c> Parser<'a, 'c> {
    pub(crate) fn parse_sequence_type(&mut self) -> StaticResult<SequenceType> {
        if self.check_name("empty-sequence") && self.check_nth(1, &Token::LeftParen) {
            self.advance();
            self.advance();
            self.expect(&Token::RightParen, ")")?;
            return Ok(SequenceType::empty());
        }
        let item_type = self.parse_item_type()?;
        // an occurrence indicator directly after the item type always
        // belongs to it
        let cardinality = match self.peek() {
            Some(Token::QuestionMark) => Cardinality::ZeroOrOne,
            Some(Token::Asterisk) => Cardinality::ZeroOrMore,
            Some(Token::Plus) => Cardinality::OneOrMore,
            _ => Cardinality::One,
        };
        if cardinality != Cardinality::One {
            self.advance();
        }
        Ok(SequenceType::new(item_type, cardinality))
    }

    fn parse_item_type(&mut self) -> StaticResult<ItemType> {
        if self.check_kind_test() {
            return Ok(ItemType::Node(self.parse_kind_test()?));
        }
        if self.check_name("item") && self.check_nth(1, &Token::LeftParen) {
            self.advance();
            self.advance();
            self.expect(&Token::RightParen, ")")?;
            return Ok(ItemType::Item);
        }
        if !self.check_eqname() {
            return Err(self.expected("a sequence type"));
        }
        if self.check_nth(1, &Token::LeftParen) {
            return Err(self.error(
                Error::Unsupported,
                "function, map and array types are not supported",
            ));
        }
        let (name, lexeme) = self.parse_eqname(NameDefault::Element)?;
        self.resolve_atomic_type(&name, &lexeme)
    }

    /// `SingleType`: an atomic type name with an optional `?`.
    pub(crate) fn parse_single_type(&mut self) -> StaticResult<(Xs, bool)> {
        let (name, lexeme) = self.parse_eqname(NameDefault::Element)?;
        let xs = self.resolve_cast_target(&name, &lexeme)?;
        let optional = self.eat(&Token::QuestionMark);
        Ok((xs, optional))
    }
}

#[cfg(test)]
mod tests {
    use xqc_name::Name;
    use xqc_schema_type::TypeProfile;

    use crate::context::StaticContextBuilder;
    use crate::parser::parse_sequence_type;
    use crate::types::{ElementTest, KindTest, FOREIGN_NAMESPACE};

    use super::*;

    fn parse(text: &str) -> (ItemType, Cardinality) {
        parse_sequence_type(text, &StaticContextBuilder::default().build()).unwrap()
    }

    #[test]
    fn test_atomic_with_occurrence() {
        assert_eq!(
            parse("xs:integer+"),
            (ItemType::Atomic(Xs::Integer), Cardinality::OneOrMore)
        );
        assert_eq!(
            parse("xs:string"),
            (ItemType::Atomic(Xs::String), Cardinality::One)
        );
    }

    #[test]
    fn test_kind_tests() {
        assert_eq!(
            parse("element(a)?"),
            (
                ItemType::Node(KindTest::Element(ElementTest {
                    name: Some(Name::unprefixed("a")),
                    type_annotation: None,
                })),
                Cardinality::ZeroOrOne
            )
        );
        assert_eq!(
            parse("document-node(element(*))"),
            (
                ItemType::Node(KindTest::Document(Some(ElementTest::default()))),
                Cardinality::One
            )
        );
        assert_eq!(parse("node()*"), (ItemType::any_node(), Cardinality::ZeroOrMore));
        assert_eq!(parse("empty-sequence()").1, Cardinality::Empty);
    }

    #[test]
    fn test_syntax_error_code() {
        let context = StaticContextBuilder::default().build();
        let error = parse_sequence_type("xs:integer)", &context).unwrap_err();
        assert_eq!(error.error, Error::XTSE0020);
        let error = parse_sequence_type("element(", &context).unwrap_err();
        assert_eq!(error.error, Error::XTSE0020);
    }

    #[test]
    fn test_type_resolution_tiers() {
        let context = StaticContextBuilder::default()
            .namespaces([("f", FOREIGN_NAMESPACE), ("s", "http://example.com/s")])
            .import_schema("http://example.com/s")
            .build();
        assert_eq!(
            parse_sequence_type("f:widget", &context).unwrap().0,
            ItemType::Foreign("widget".to_string())
        );
        assert!(matches!(
            parse_sequence_type("s:code", &context).unwrap().0,
            ItemType::Imported(_)
        ));
        let context = StaticContextBuilder::default()
            .namespaces([("s", "http://example.com/s")])
            .build();
        assert_eq!(
            parse_sequence_type("s:code", &context).unwrap_err().error,
            Error::XPST0051
        );
    }

    #[test]
    fn test_basic_profile_rejects_derived_types() {
        let context = StaticContextBuilder::default()
            .profile(TypeProfile::Basic)
            .build();
        assert_eq!(
            parse_sequence_type("xs:short", &context).unwrap_err().error,
            Error::XPST0051
        );
        assert!(parse_sequence_type("xs:integer", &context).is_ok());
    }

    #[test]
    fn test_undeclared_prefix() {
        let context = StaticContextBuilder::default().build();
        assert_eq!(
            parse_sequence_type("nope:t", &context).unwrap_err().error,
            Error::XPST0081
        );
    }
}
