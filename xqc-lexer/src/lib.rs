mod delimination;
mod explicit_whitespace;
mod lexer;
mod stream;
mod symbol_type;

pub use lexer::{
    BracedURILiteralWildcard, LocalNameWildcard, PrefixWildcard, PrefixedQName, Token,
    URIQualifiedName,
};
pub use stream::{Lexeme, TokenStream};
