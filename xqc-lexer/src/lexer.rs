use std::borrow::Cow;

use ibig::IBig;
use logos::{Lexer, Logos};
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq)]
pub struct PrefixedQName<'a> {
    pub prefix: &'a str,
    pub local_name: &'a str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct URIQualifiedName<'a> {
    pub uri: &'a str,
    pub local_name: &'a str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocalNameWildcard<'a> {
    pub prefix: &'a str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrefixWildcard<'a> {
    pub local_name: &'a str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BracedURILiteralWildcard<'a> {
    pub uri: &'a str,
}

/// Raw tokens.
///
/// There are no keyword tokens: `if`, `div`, `child` and friends all lex as
/// `NCName`, and the parser decides from its own state whether a name is an
/// operator, a keyword or an element name test. Likewise `*` is a single
/// token whose meaning (wildcard, multiplication, occurrence indicator)
/// depends on where the parser is.
#[derive(Logos, Clone, Debug, PartialEq)]
#[logos(subpattern name_start_char_without_colon = r"[A-Za-z_\u{c0}-\u{d6}\u{d8}-\u{f6}\u{f8}-\u{2ff}\u{370}-\u{37d}\u{37f}-\u{1fff}\u{200c}-\u{200d}\u{2070}-\u{218f}\u{2c00}-\u{2fef}\u{3001}-\u{d7ff}\u{f900}-\u{fdfc}\u{fdf0}-\u{fffd}\u{10000}-\u{effff}]")]
#[logos(subpattern name_char_without_colon = r"(?&name_start_char_without_colon)|[\-\.0-9\u{b7}\u{300}-\u{36F}\u{203f}-\u{2040}]")]
#[logos(subpattern ncname = r"(?&name_start_char_without_colon)(?&name_char_without_colon)*")]
pub enum Token<'a> {
    Error,
    #[regex(r"[0-9]+", integer_literal, priority = 3)]
    IntegerLiteral(IBig),
    #[regex(r"(\.[0-9]+)|([0-9]+\.[0-9]*)", decimal_literal, priority = 2)]
    DecimalLiteral(Decimal),
    #[regex(
        r"(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][+-]?[0-9]+)",
        double_literal,
        priority = 2
    )]
    DoubleLiteral(f64),
    #[regex(r#""(?:""|[^"])*"|'(?:''|[^'])*'"#, string_literal, priority = 1)]
    StringLiteral(Cow<'a, str>),
    // composite names are built after lexing, where whitespace is still
    // visible
    PrefixedQName(PrefixedQName<'a>),
    URIQualifiedName(URIQualifiedName<'a>),
    LocalNameWildcard(LocalNameWildcard<'a>),
    PrefixWildcard(PrefixWildcard<'a>),
    BracedURILiteralWildcard(BracedURILiteralWildcard<'a>),

    #[regex(r"(?&ncname)", priority = 2)]
    NCName(&'a str),

    #[regex(r#"Q\{[^\{\}]*\}"#, braced_uri_literal, priority = 4)]
    BracedURILiteral(&'a str),

    #[token("!")]
    ExclamationMark,
    #[token("!=")]
    NotEqual,
    #[token("$")]
    Dollar,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("*")]
    Asterisk,
    #[token("*:")]
    AsteriskColon,
    #[token("+")]
    Plus,
    #[token(",")]
    Comma,
    #[token("-")]
    Minus,
    #[token(".")]
    Dot,
    #[token("..")]
    DotDot,
    #[token("/")]
    Slash,
    #[token("//")]
    DoubleSlash,
    #[token(":")]
    Colon,
    #[token(":*")]
    ColonAsterisk,
    #[token("::")]
    DoubleColon,
    #[token(":=")]
    ColonEqual,
    #[token("<")]
    LessThan,
    #[token("<<")]
    Precedes,
    #[token("<=")]
    LessThanEqual,
    #[token("=")]
    Equal,
    #[token(">")]
    GreaterThan,
    #[token(">=")]
    GreaterThanEqual,
    #[token(">>")]
    Follows,
    #[token("?")]
    QuestionMark,
    #[token("@")]
    At,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("{")]
    LeftBrace,
    #[token("|")]
    Pipe,
    #[token("||")]
    DoublePipe,
    #[token("}")]
    RightBrace,

    #[regex(r"[\u{20}\u{9}\u{d}\u{a}]+", priority = 4)]
    Whitespace,
    #[regex(r"\(:")]
    CommentStart,
    #[regex(r":\)")]
    CommentEnd,
}

impl<'a> Token<'a> {
    pub(crate) fn ncname(&self) -> Option<&'a str> {
        match self {
            Token::NCName(name) => Some(name),
            _ => None,
        }
    }

    /// Is this the bare name `name`? Keywords are checked this way.
    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, Token::NCName(n) if *n == name)
    }
}

fn integer_literal<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Result<IBig, ()> {
    IBig::from_str_radix(lex.slice(), 10).map_err(|_| ())
}

fn decimal_literal<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Result<Decimal, ()> {
    let d: Result<Decimal, ()> = lex.slice().try_into().map_err(|_| ());
    d
}

fn double_literal<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Result<f64, ()> {
    lex.slice().parse().map_err(|_| ())
}

fn string_literal<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Cow<'a, str> {
    let slice = lex.slice();
    let s = &slice[1..slice.len() - 1];
    if slice.starts_with('\"') {
        if s.contains("\"\"") {
            Cow::Owned(s.replace("\"\"", "\""))
        } else {
            Cow::Borrowed(s)
        }
    } else if s.contains("''") {
        Cow::Owned(s.replace("''", "'"))
    } else {
        Cow::Borrowed(s)
    }
}

fn braced_uri_literal<'a>(lex: &mut Lexer<'a, Token<'a>>) -> &'a str {
    let slice = lex.slice();
    &slice[2..slice.len() - 1]
}
