use std::iter::Peekable;

use logos::Span;

use crate::explicit_whitespace::ExplicitWhitespace;
use crate::symbol_type::SymbolType;
use crate::Token;

// Enforces terminal delimitation (two non-delimiting terminals need a
// separator between them), drops whitespace and skips nested comments.
pub(crate) struct DeliminationIterator<'a> {
    base: Peekable<ExplicitWhitespace<'a>>,
}

impl<'a> DeliminationIterator<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            base: ExplicitWhitespace::new(input).peekable(),
        }
    }
}

impl<'a> Iterator for DeliminationIterator<'a> {
    type Item = (Token<'a>, Span);

    fn next(&mut self) -> Option<Self::Item> {
        let (token, span) = self.base.next()?;

        // IntegerLiteral won't be found with a dot behind it, as it would
        // become a decimal literal
        if matches!(&token, Token::DecimalLiteral(_) | Token::DoubleLiteral(_)) {
            if let Some((Token::Dot, _)) = self.base.peek() {
                return Some((Token::Error, span));
            }
        }

        match token.symbol_type() {
            SymbolType::NonDelimiting => match self.base.peek() {
                Some((next_token, _)) => match next_token.symbol_type() {
                    SymbolType::NonDelimiting => Some((Token::Error, span)),
                    _ => Some((token, span)),
                },
                None => Some((token, span)),
            },
            SymbolType::Delimiting | SymbolType::Error => Some((token, span)),
            SymbolType::Whitespace => self.next(),
            SymbolType::CommentStart => {
                let mut depth = 1;
                let start = span.start;
                let mut end = span.end;
                while depth > 0 {
                    match self.base.next() {
                        Some((Token::CommentStart, span)) => {
                            end = span.end;
                            depth += 1
                        }
                        Some((Token::CommentEnd, span)) => {
                            end = span.end;
                            depth -= 1;
                        }
                        Some((_, span)) => {
                            end = span.end;
                        }
                        None => {
                            return Some((Token::Error, start..end));
                        }
                    }
                }
                self.next()
            }
            // a comment end without a start
            SymbolType::CommentEnd => Some((Token::Error, span)),
        }
    }
}

#[cfg(test)]
mod tests {
    use ibig::ibig;

    use super::*;

    #[test]
    fn test_whitespace_suppressed() {
        let mut iter = DeliminationIterator::new("a  and b");
        assert_eq!(iter.next(), Some((Token::NCName("a"), 0..1)));
        assert_eq!(iter.next(), Some((Token::NCName("and"), 3..6)));
        assert_eq!(iter.next(), Some((Token::NCName("b"), 7..8)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_undelimited_terminals() {
        let mut iter = DeliminationIterator::new("1and");
        assert_eq!(iter.next(), Some((Token::Error, 0..1)));
    }

    #[test]
    fn test_nested_comment() {
        let mut iter = DeliminationIterator::new("1 (: a (: b :) c :) + 2");
        assert_eq!(iter.next(), Some((Token::IntegerLiteral(ibig!(1)), 0..1)));
        assert_eq!(iter.next(), Some((Token::Plus, 20..21)));
        assert_eq!(iter.next(), Some((Token::IntegerLiteral(ibig!(2)), 22..23)));
    }

    #[test]
    fn test_unclosed_comment() {
        let mut iter = DeliminationIterator::new("(: a");
        assert_eq!(iter.next(), Some((Token::Error, 0..4)));
    }
}
