use std::ops::Range;

use xqc_ast::{Error as ErrorCode, Location, StaticError};
use xqc_interpreter::SpannedError;

/// Anything that can go wrong compiling or running a query.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Static(#[from] StaticError),
    /// A dynamic error, with the location of the expression that raised
    /// it when known.
    #[error("{error}")]
    Dynamic {
        error: SpannedError,
        location: Option<Location>,
    },
    #[error(transparent)]
    Parse(#[from] xot::ParseError),
    /// A document handle from another [`Documents`](crate::Documents).
    #[error("unknown document")]
    UnknownDocument,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The error code, for static and dynamic errors.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Static(error) => Some(error.error),
            Error::Dynamic { error, .. } => Some(error.error),
            Error::Parse(_) | Error::UnknownDocument => None,
        }
    }

    /// Byte range in the expression text the error points at.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            Error::Static(error) => Some(error.span.clone()),
            Error::Dynamic { location, .. } => location.as_ref().map(|l| l.span.clone()),
            Error::Parse(_) | Error::UnknownDocument => None,
        }
    }
}
