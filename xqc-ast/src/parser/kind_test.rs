use xqc_lexer::Token;

use crate::error::{Error, StaticResult};
use crate::types::{ElementTest, KindTest};

use super::name::NameDefault;
use super::Parser;

const KIND_TEST_NAMES: [&str; 10] = [
    "document-node",
    "element",
    "attribute",
    "schema-element",
    "schema-attribute",
    "processing-instruction",
    "comment",
    "text",
    "namespace-node",
    "node",
];

impl<'a, 'c> Parser<'a, 'c> {
    /// A kind test starts with one of the reserved kind names followed
    /// directly by `(`.
    pub(crate) fn check_kind_test(&mut self) -> bool {
        let is_kind_name = matches!(
            self.peek(),
            Some(Token::NCName(name)) if KIND_TEST_NAMES.contains(name)
        );
        is_kind_name && self.check_nth(1, &Token::LeftParen)
    }

    pub(crate) fn parse_kind_test(&mut self) -> StaticResult<KindTest> {
        let lexeme = self.advance_required("a kind test")?;
        let Token::NCName(kind) = lexeme.token else {
            return Err(self.error_at(self.syntax_code(), "expected a kind test", &lexeme));
        };
        self.expect(&Token::LeftParen, "(")?;
        let kind_test = match kind {
            "node" => KindTest::AnyNode,
            "text" => KindTest::Text,
            "comment" => KindTest::Comment,
            "namespace-node" => KindTest::NamespaceNode,
            "element" => KindTest::Element(self.parse_element_test(NameDefault::Element)?),
            "attribute" => KindTest::Attribute(self.parse_element_test(NameDefault::None)?),
            "document-node" => {
                if self.check_name("element") {
                    self.advance();
                    self.expect(&Token::LeftParen, "(")?;
                    let element_test = self.parse_element_test(NameDefault::Element)?;
                    self.expect(&Token::RightParen, ")")?;
                    KindTest::Document(Some(element_test))
                } else {
                    KindTest::Document(None)
                }
            }
            "processing-instruction" => {
                let target = match self.peek() {
                    Some(Token::NCName(name)) => Some(name.to_string()),
                    Some(Token::StringLiteral(value)) => Some(value.trim().to_string()),
                    _ => None,
                };
                if target.is_some() {
                    self.advance();
                }
                KindTest::ProcessingInstruction(target)
            }
            _ => {
                return Err(self.error_at(
                    Error::Unsupported,
                    &format!("{kind}() tests need schema awareness"),
                    &lexeme,
                ))
            }
        };
        self.expect(&Token::RightParen, ")")?;
        Ok(kind_test)
    }

    // the opening paren has been consumed; the closing one is left alone
    fn parse_element_test(&mut self, default: NameDefault) -> StaticResult<ElementTest> {
        if self.check(&Token::RightParen) {
            return Ok(ElementTest::default());
        }
        let name = if self.eat(&Token::Asterisk) {
            None
        } else {
            Some(self.parse_eqname(default)?.0)
        };
        let type_annotation = if self.eat(&Token::Comma) {
            let (type_name, _) = self.parse_eqname(NameDefault::Element)?;
            // nillable marker
            self.eat(&Token::QuestionMark);
            Some(type_name)
        } else {
            None
        };
        Ok(ElementTest {
            name,
            type_annotation,
        })
    }
}
