use xqc_ast::{Error, LocationId, LocationMap, StaticError};

/// A static error positioned at the source location of a node.
pub(crate) fn static_error(
    locations: &LocationMap,
    location: LocationId,
    error: Error,
    message: impl Into<String>,
) -> StaticError {
    let (line, column, span) = match locations.get(location) {
        Some(location) => (location.line, location.column, location.span.clone()),
        None => (0, 0, 0..0),
    };
    StaticError {
        error,
        message: message.into(),
        line,
        column,
        span,
    }
}
