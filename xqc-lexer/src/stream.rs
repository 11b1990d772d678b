use std::collections::VecDeque;
use std::ops::Range;

use crate::delimination::DeliminationIterator;
use crate::Token;

/// A token together with where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme<'a> {
    pub token: Token<'a>,
    /// Byte range in the full source text.
    pub span: Range<usize>,
    /// The exact source text of the token.
    pub text: &'a str,
    /// 1-based line, counted from the starting line given to the stream.
    pub line: usize,
    /// 1-based column in characters.
    pub column: usize,
}

/// A lazily pulled token stream over `source[start..]`.
///
/// Tokens are only lexed when the parser asks for them, so text following
/// an embedded expression's terminator is never looked at.
pub struct TokenStream<'a> {
    source: &'a str,
    start: usize,
    tokens: DeliminationIterator<'a>,
    lookahead: VecDeque<Lexeme<'a>>,
    // incremental line tracking
    line: usize,
    line_start: usize,
    scanned: usize,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str, start: usize, line: usize) -> Self {
        Self {
            source,
            start,
            tokens: DeliminationIterator::new(&source[start..]),
            lookahead: VecDeque::new(),
            line,
            line_start: line_start_before(source, start),
            scanned: start,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Look `n` tokens ahead (0 is the next token).
    pub fn peek_nth(&mut self, n: usize) -> Option<&Lexeme<'a>> {
        while self.lookahead.len() <= n {
            let lexeme = self.pull()?;
            self.lookahead.push_back(lexeme);
        }
        self.lookahead.get(n)
    }

    pub fn peek(&mut self) -> Option<&Lexeme<'a>> {
        self.peek_nth(0)
    }

    pub fn next_lexeme(&mut self) -> Option<Lexeme<'a>> {
        if let Some(lexeme) = self.lookahead.pop_front() {
            return Some(lexeme);
        }
        self.pull()
    }

    /// Line and column just past the end of the source.
    pub fn end_position(&mut self) -> (usize, usize) {
        self.position(self.source.len())
    }

    // only valid for offsets at or after the last token pulled
    fn position(&mut self, offset: usize) -> (usize, usize) {
        self.advance_lines(offset);
        let column = self.source[self.line_start..offset].chars().count() + 1;
        (self.line, column)
    }

    fn pull(&mut self) -> Option<Lexeme<'a>> {
        let (token, span) = self.tokens.next()?;
        let span = (span.start + self.start)..(span.end + self.start);
        let (line, column) = self.position(span.start);
        Some(Lexeme {
            token,
            text: &self.source[span.clone()],
            span,
            line,
            column,
        })
    }

    fn advance_lines(&mut self, offset: usize) {
        if offset <= self.scanned {
            return;
        }
        for (i, c) in self.source[self.scanned..offset].char_indices() {
            if c == '\n' {
                self.line += 1;
                self.line_start = self.scanned + i + 1;
            }
        }
        self.scanned = offset;
    }
}

fn line_start_before(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions() {
        let mut stream = TokenStream::new("1 +\n  foo", 0, 1);
        let one = stream.next_lexeme().unwrap();
        assert_eq!((one.line, one.column), (1, 1));
        let plus = stream.next_lexeme().unwrap();
        assert_eq!((plus.line, plus.column), (1, 3));
        let foo = stream.next_lexeme().unwrap();
        assert_eq!(foo.token, Token::NCName("foo"));
        assert_eq!((foo.line, foo.column), (2, 3));
        assert_eq!(foo.span, 6..9);
        assert!(stream.next_lexeme().is_none());
    }

    #[test]
    fn test_start_offset_and_line() {
        let mut stream = TokenStream::new("abc{$x}", 4, 7);
        let dollar = stream.next_lexeme().unwrap();
        assert_eq!(dollar.token, Token::Dollar);
        assert_eq!(dollar.span, 4..5);
        assert_eq!((dollar.line, dollar.column), (7, 5));
    }

    #[test]
    fn test_lookahead() {
        let mut stream = TokenStream::new("a / b", 0, 1);
        assert_eq!(stream.peek_nth(1).unwrap().token, Token::Slash);
        assert_eq!(stream.next_lexeme().unwrap().text, "a");
        assert_eq!(stream.next_lexeme().unwrap().text, "/");
    }
}
