use xqc_lexer::{Token, TokenStream};

use crate::error::{Error, StaticError, StaticResult};
use crate::parser::Terminator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Paren,
    Square,
    Brace,
}

/// Find the end of an embedded expression without parsing it.
///
/// Only brackets are balanced; names are not resolved and no bindings are
/// declared, so this can run before the namespaces in scope are known.
/// Returns the byte offset of the terminator, or of the end of the text
/// for [`Terminator::EndOfInput`].
pub fn scan(text: &str, start: usize, terminator: Terminator, line: usize) -> StaticResult<usize> {
    let mut tokens = TokenStream::new(text, start, line);
    let mut open: Vec<Bracket> = Vec::new();
    while let Some(lexeme) = tokens.next_lexeme() {
        let error = |message: &str| StaticError {
            error: Error::XPST0003,
            message: message.to_string(),
            line: lexeme.line,
            column: lexeme.column,
            span: lexeme.span.clone(),
        };
        let closing = match lexeme.token {
            Token::Error => return Err(error(&format!("invalid token '{}'", lexeme.text))),
            Token::LeftParen => {
                open.push(Bracket::Paren);
                continue;
            }
            Token::LeftBracket => {
                open.push(Bracket::Square);
                continue;
            }
            Token::LeftBrace => {
                open.push(Bracket::Brace);
                continue;
            }
            Token::RightParen => Bracket::Paren,
            Token::RightBracket => Bracket::Square,
            Token::RightBrace => Bracket::Brace,
            _ => continue,
        };
        match open.pop() {
            Some(bracket) if bracket == closing => {}
            None if closing == Bracket::Brace && terminator == Terminator::RightBrace => {
                return Ok(lexeme.span.start);
            }
            _ => return Err(error(&format!("unbalanced '{}'", lexeme.text))),
        }
    }
    if open.is_empty() && terminator == Terminator::EndOfInput {
        return Ok(text.len());
    }
    let (line, column) = tokens.end_position();
    let expected = if terminator == Terminator::RightBrace && open.is_empty() {
        "expected '}', found end of input"
    } else {
        "unclosed bracket at end of input"
    };
    Err(StaticError {
        error: Error::XPST0003,
        message: expected.to_string(),
        line,
        column,
        span: text.len()..text.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_to_brace() {
        let text = "{$a[f(1)] + 2}tail";
        assert_eq!(scan(text, 1, Terminator::RightBrace, 1), Ok(13));
    }

    #[test]
    fn test_braces_in_strings_do_not_count() {
        let text = "{'}' || \"{\"}";
        assert_eq!(scan(text, 1, Terminator::RightBrace, 1), Ok(11));
    }

    #[test]
    fn test_nested_braces() {
        let text = "{text { 1 } }x";
        assert_eq!(scan(text, 1, Terminator::RightBrace, 1), Ok(12));
    }

    #[test]
    fn test_missing_terminator() {
        let error = scan("{1 + 2", 1, Terminator::RightBrace, 1).unwrap_err();
        assert_eq!(error.error, Error::XPST0003);
        assert!(error.message.contains("'}'"));
    }

    #[test]
    fn test_unbalanced() {
        assert!(scan("(1]", 0, Terminator::EndOfInput, 1).is_err());
        assert_eq!(scan("(1)", 0, Terminator::EndOfInput, 1), Ok(3));
    }
}
