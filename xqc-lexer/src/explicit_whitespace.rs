use itertools::{Itertools, MultiPeek};
use logos::{Logos, Span, SpannedIter};

use crate::lexer::{
    BracedURILiteralWildcard, LocalNameWildcard, PrefixWildcard, PrefixedQName, Token,
    URIQualifiedName,
};

// Merges adjacent raw tokens into the composite name tokens (`p:l`,
// `p:*`, `*:l`, `Q{u}l`, `Q{u}*`). None of these may contain whitespace,
// which is only visible at this stage. Lexer errors become `Token::Error`.
pub(crate) struct ExplicitWhitespace<'a> {
    base: MultiPeek<SpannedIter<'a, Token<'a>>>,
}

impl<'a> ExplicitWhitespace<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            base: Token::lexer(input).spanned().multipeek(),
        }
    }

    fn qname_prefix(&mut self, prefix: &'a str, span: &Span) -> Option<(Token<'a>, Span, usize)> {
        let (next_token, next_span) = self.base.peek()?;
        match next_token {
            Ok(Token::Colon) => {
                if let Some((Ok(Token::NCName(local_name)), local_name_span)) = self.base.peek() {
                    let span = span.start..local_name_span.end;
                    return Some((
                        Token::PrefixedQName(PrefixedQName {
                            prefix,
                            local_name,
                        }),
                        span,
                        2,
                    ));
                }
                None
            }
            Ok(Token::ColonAsterisk) => {
                let span = span.start..next_span.end;
                Some((
                    Token::LocalNameWildcard(LocalNameWildcard { prefix }),
                    span,
                    1,
                ))
            }
            _ => None,
        }
    }

    fn braced_uri_literal_prefix(
        &mut self,
        uri: &'a str,
        span: &Span,
    ) -> Option<(Token<'a>, Span)> {
        let (next_token, next_span) = self.base.peek()?;
        match next_token {
            Ok(Token::NCName(local_name)) => Some((
                Token::URIQualifiedName(URIQualifiedName { uri, local_name }),
                span.start..next_span.end,
            )),
            Ok(Token::Asterisk) => Some((
                Token::BracedURILiteralWildcard(BracedURILiteralWildcard { uri }),
                span.start..next_span.end,
            )),
            _ => None,
        }
    }

    fn prefix_wildcard(&mut self, span: &Span) -> Option<(Token<'a>, Span)> {
        match self.base.peek()? {
            (Ok(Token::NCName(local_name)), next_span) => Some((
                Token::PrefixWildcard(PrefixWildcard { local_name }),
                span.start..next_span.end,
            )),
            _ => None,
        }
    }
}

impl<'a> Iterator for ExplicitWhitespace<'a> {
    type Item = (Token<'a>, Span);

    fn next(&mut self) -> Option<Self::Item> {
        let (token, span) = self.base.next()?;
        let token = match token {
            Ok(token) => token,
            Err(()) => return Some((Token::Error, span)),
        };
        if let Some(name) = token.ncname() {
            let merged = self.qname_prefix(name, &span);
            self.base.reset_peek();
            if let Some((token, span, consumed)) = merged {
                for _ in 0..consumed {
                    self.base.next();
                }
                return Some((token, span));
            }
            return Some((token, span));
        }
        let merged = match token {
            Token::AsteriskColon => self.prefix_wildcard(&span),
            Token::BracedURILiteral(uri) => self.braced_uri_literal_prefix(uri, &span),
            _ => None,
        };
        self.base.reset_peek();
        if let Some(merged) = merged {
            self.base.next();
            return Some(merged);
        }
        Some((token, span))
    }
}

#[cfg(test)]
mod tests {
    use ibig::ibig;

    use super::*;

    #[test]
    fn test_no_prefixed_qname() {
        let mut iter = ExplicitWhitespace::new("foo + 1");
        assert_eq!(iter.next(), Some((Token::NCName("foo"), 0..3)));
        assert_eq!(iter.next(), Some((Token::Whitespace, 3..4)));
        assert_eq!(iter.next(), Some((Token::Plus, 4..5)));
        assert_eq!(iter.next(), Some((Token::Whitespace, 5..6)));
        assert_eq!(iter.next(), Some((Token::IntegerLiteral(ibig!(1)), 6..7)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_prefixed_qname() {
        let mut iter = ExplicitWhitespace::new("fn:count");
        assert_eq!(
            iter.next(),
            Some((
                Token::PrefixedQName(PrefixedQName {
                    prefix: "fn",
                    local_name: "count"
                }),
                0..8
            ))
        );
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_whitespace_breaks_prefixed_qname() {
        let mut iter = ExplicitWhitespace::new("fn :count");
        assert_eq!(iter.next(), Some((Token::NCName("fn"), 0..2)));
        assert_eq!(iter.next(), Some((Token::Whitespace, 2..3)));
        assert_eq!(iter.next(), Some((Token::Colon, 3..4)));
    }

    #[test]
    fn test_axis_is_not_prefixed_qname() {
        let mut iter = ExplicitWhitespace::new("child::a");
        assert_eq!(iter.next(), Some((Token::NCName("child"), 0..5)));
        assert_eq!(iter.next(), Some((Token::DoubleColon, 5..7)));
        assert_eq!(iter.next(), Some((Token::NCName("a"), 7..8)));
    }

    #[test]
    fn test_wildcards() {
        let mut iter = ExplicitWhitespace::new("p:*");
        assert_eq!(
            iter.next(),
            Some((Token::LocalNameWildcard(LocalNameWildcard { prefix: "p" }), 0..3))
        );
        let mut iter = ExplicitWhitespace::new("*:l");
        assert_eq!(
            iter.next(),
            Some((Token::PrefixWildcard(PrefixWildcard { local_name: "l" }), 0..3))
        );
        let mut iter = ExplicitWhitespace::new("Q{urn:x}*");
        assert_eq!(
            iter.next(),
            Some((
                Token::BracedURILiteralWildcard(BracedURILiteralWildcard { uri: "urn:x" }),
                0..9
            ))
        );
    }
}
