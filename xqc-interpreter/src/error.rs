use std::fmt;

use xqc_ast::LocationId;

pub use xqc_ast::Error;

/// A dynamic error with the location of the innermost expression that
/// raised it, if known.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedError {
    pub error: Error,
    pub location: Option<LocationId>,
}

impl SpannedError {
    pub fn new(error: Error, location: LocationId) -> Self {
        SpannedError {
            error,
            location: Some(location),
        }
    }

    /// Attach a location unless a more precise one is already known.
    pub(crate) fn or_at(mut self, location: LocationId) -> Self {
        if self.location.is_none() {
            self.location = Some(location);
        }
        self
    }
}

impl From<Error> for SpannedError {
    fn from(error: Error) -> Self {
        SpannedError {
            error,
            location: None,
        }
    }
}

impl From<xot::Error> for SpannedError {
    fn from(e: xot::Error) -> Self {
        let error = match e {
            xot::Error::MissingPrefix(_) => Error::XPST0081,
            _ => Error::XPTY0004,
        };
        error.into()
    }
}

impl fmt::Display for SpannedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.error.message())
    }
}

impl std::error::Error for SpannedError {}

pub type Result<T> = std::result::Result<T, Error>;
/// The result type for errors with an optional source location.
pub type SpannedResult<T> = std::result::Result<T, SpannedError>;
