use std::ops::Range;

use strum::EnumMessage;
use strum_macros::{Display, EnumMessage};

/// XPath/XSLT error code.
///
/// The doc comment of each variant is its message, optionally followed by a
/// blank line and a longer note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumMessage)]
pub enum Error {
    /// Unsupported feature.
    ///
    /// The expression uses a feature this implementation does not support.
    Unsupported,
    /// Component absent in static context.
    XPST0001,
    /// Component absent in dynamic context.
    ///
    /// It is a dynamic error if evaluation of an expression relies on some
    /// part of the dynamic context that is absent.
    XPDY0002,
    /// Parse error.
    ///
    /// It is a static error if an expression is not a valid instance of the
    /// grammar.
    XPST0003,
    /// Type error.
    ///
    /// An expression has a static or dynamic type that is not appropriate
    /// for the context in which it occurs.
    XPTY0004,
    /// Name not defined.
    ///
    /// The expression refers to a variable name, schema type name or
    /// namespace prefix that is not defined in the static context.
    XPST0008,
    /// Unknown function.
    ///
    /// The expanded QName and number of arguments in a function call do not
    /// match the name and arity of any function in the static context.
    XPST0017,
    /// Inconsistent path result.
    ///
    /// The result of a path operator contains both nodes and non-nodes.
    XPTY0018,
    /// Path operator applied to non-nodes.
    ///
    /// E1 in a path expression E1/E2 does not evaluate to a sequence of
    /// nodes.
    XPTY0019,
    /// Context item is not a node in an axis step.
    XPTY0020,
    /// Treat type does not match.
    ///
    /// The dynamic type of the operand of a treat expression does not match
    /// the sequence type.
    XPDY0050,
    /// Undefined type reference.
    ///
    /// The type named is not an in-scope atomic type, or the active type
    /// profile does not allow it.
    XPST0051,
    /// Cast to an abstract type.
    ///
    /// The target type of a cast or castable expression is
    /// xs:anyAtomicType, xs:anySimpleType or xs:NOTATION.
    XPST0080,
    /// Undeclared namespace prefix.
    XPST0081,
    /// Division by zero.
    FOAR0001,
    /// Numeric operation overflow or underflow.
    FOAR0002,
    /// Input value too large for decimal.
    FOCA0001,
    /// Invalid lexical value.
    FOCA0002,
    /// Invalid value for cast or constructor.
    FORG0001,
    /// fn:zero-or-one called with a sequence containing more than one item.
    FORG0003,
    /// fn:exactly-one called with a sequence containing zero or more than one
    /// item.
    FORG0005,
    /// Invalid argument type.
    ///
    /// Also raised when the effective boolean value of a sequence is not
    /// defined.
    FORG0006,
    /// No context document.
    FODC0001,
    /// Unidentified error.
    ///
    /// Raised by fn:error.
    FOER0000,
    /// Invalid syntax in a pattern.
    XTSE0340,
    /// Invalid attribute value.
    ///
    /// Raised for a malformed sequence type.
    XTSE0020,
    /// Unknown key.
    ///
    /// The key name is not declared, or no key resolver is available.
    XTDE1260,
}

impl Error {
    pub fn code(&self) -> String {
        self.to_string()
    }

    pub fn message(&self) -> &str {
        self.documentation_pieces().0
    }

    pub fn note(&self) -> &str {
        self.documentation_pieces().1
    }

    fn documentation_pieces(&self) -> (&str, &str) {
        if let Some(documentation) = self.get_documentation() {
            let mut pieces = documentation.splitn(2, "\n\n");
            let first = pieces.next().unwrap_or("");
            let second = pieces.next().unwrap_or("");
            (first, second)
        } else {
            ("", "")
        }
    }
}

impl std::error::Error for Error {}

/// A static error: a syntax error, an unresolvable name, or a type that
/// can never satisfy what is required of it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}: {message} (line {line}, column {column})")]
pub struct StaticError {
    pub error: Error,
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// Byte range in the source text.
    pub span: Range<usize>,
}

impl StaticError {
    pub fn code(&self) -> String {
        self.error.code()
    }
}

pub type StaticResult<T> = std::result::Result<T, StaticError>;
