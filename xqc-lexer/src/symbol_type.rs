use crate::lexer::Token;

pub(crate) enum SymbolType {
    Delimiting,
    NonDelimiting,
    Whitespace,
    CommentStart,
    CommentEnd,
    Error,
}

impl Token<'_> {
    pub(crate) fn symbol_type(&self) -> SymbolType {
        use crate::lexer::Token::*;
        match self {
            // A.2.2 terminal delimitation
            ExclamationMark | NotEqual | StringLiteral(_) | Dollar | LeftParen | RightParen
            | Asterisk | AsteriskColon | Plus | Comma | Minus | Dot | DotDot | Slash
            | DoubleSlash | Colon | ColonAsterisk | DoubleColon | ColonEqual | LessThan
            | Precedes | LessThanEqual | Equal | GreaterThan | GreaterThanEqual | Follows
            | QuestionMark | At | BracedURILiteral(_) | LeftBracket | RightBracket
            | LeftBrace | Pipe | DoublePipe | RightBrace
            // starts with *: so is delimiting
            | PrefixWildcard(_)
            // starts with a braced uri literal so is delimiting
            | BracedURILiteralWildcard(_) => SymbolType::Delimiting,

            IntegerLiteral(_)
            | DecimalLiteral(_)
            | DoubleLiteral(_)
            | NCName(_)
            | PrefixedQName(_)
            | URIQualifiedName(_)
            // starts with an ncname, so is non-delimiting
            | LocalNameWildcard(_) => SymbolType::NonDelimiting,

            Whitespace => SymbolType::Whitespace,
            CommentStart => SymbolType::CommentStart,
            CommentEnd => SymbolType::CommentEnd,
            Error => SymbolType::Error,
        }
    }
}
