//! Error types for data parsing in rockwatch-types.

use thiserror::Error;

/// Errors that can occur when decoding inbound sensor events.
///
/// Missing numeric fields are never an error (they default to zero);
/// only payloads that cannot be interpreted as an event at all are rejected.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The payload is not valid JSON.
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(String),

    /// The payload is valid JSON but not an object.
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A timestamp could not be interpreted as epoch milliseconds or RFC 3339.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A risk factor description did not match any known rule.
    #[error("Unknown risk factor: {0}")]
    UnknownFactor(String),
}

/// Result type alias using rockwatch-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
