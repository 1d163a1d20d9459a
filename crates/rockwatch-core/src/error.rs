//! Error types for rockwatch-core.
//!
//! The classifier and the aggregator are total: neither [`crate::assess`] nor
//! [`crate::StreamingAggregator::ingest`] can fail. Errors only arise when
//! building components from configuration or when decoding inbound events.
//!
//! | Error Type | Raised by | Recovery |
//! |------------|-----------|----------|
//! | [`Error::InvalidConfig`] | `validate()` on options and configs | Fix configuration and restart |
//! | [`Error::Parse`] | Event decoding | Skip the event; the feed keeps flowing |
//! | [`Error::ChannelClosed`] | Pushing into a closed channel | Open a new session |
//! | [`Error::NoRuntime`] | Starting a stream channel outside tokio | Start from within a runtime |

use thiserror::Error;

use rockwatch_types::ParseError;

/// Errors that can occur in rockwatch-core.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An inbound event could not be decoded.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An inbound event envelope was not valid JSON for any known shape.
    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    /// The channel has been closed and no longer delivers events.
    #[error("Channel closed")]
    ChannelClosed,

    /// A stream channel was started outside a tokio runtime.
    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

impl Error {
    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Result type alias using rockwatch-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
