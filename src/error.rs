//! Error types for cassette recording and replay.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for cassette operations.
pub type Result<T> = std::result::Result<T, CassetteError>;

/// Errors raised while recording, persisting or replaying interactions.
#[derive(Debug, Error)]
pub enum CassetteError {
    /// A store was read or written before a context was bound.
    #[error("Cassette context not set: call set_context before reading or writing")]
    ContextNotSet,

    /// The context was empty once sanitized.
    #[error("Invalid cassette context: {0:?}")]
    InvalidContext(String),

    /// A replay call found no recorded interaction left.
    #[error(
        "No response available: playback queue exhausted at {url} ({description}). \
         Replay made more calls than were recorded"
    )]
    QueueExhausted {
        /// URL of the request that could not be served.
        url: String,
        /// Caller-provided description of the request.
        description: String,
    },

    /// A response status was outside the caller's accepted set.
    #[error("Unexpected status {status} for {description}: expected one of {expected:?}")]
    UnexpectedStatus {
        /// Status actually received or replayed.
        status: u16,
        /// Statuses the caller accepts.
        expected: Vec<u16>,
        /// Caller-provided description of the request.
        description: String,
        /// Request body, for diagnostics.
        request_body: Option<String>,
        /// Response body, for diagnostics.
        response_body: Option<String>,
    },

    /// A persisted cassette file could not be parsed.
    #[error("Malformed cassette {}: {source}", path.display())]
    MalformedCassette {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// A cassette file that should exist was not found.
    #[error("Cassette not found: {}", path.display())]
    MissingCassette {
        /// Expected file location.
        path: PathBuf,
    },

    /// A body declared as JSON failed to parse.
    #[error("Body declared as JSON is not valid JSON: {0}")]
    InvalidJsonBody(#[source] serde_json::Error),

    /// Filesystem failure.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An entry could not be serialized.
    #[error("Failed to serialize cassette: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The live transport failed to reach the service.
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        /// Target URL.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },

    /// A request could not be built (e.g. an invalid method name).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration value or file was invalid.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

impl CassetteError {
    /// Wrap an I/O error, mapping `NotFound` to [`CassetteError::MissingCassette`].
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::MissingCassette { path }
        } else {
            Self::Io { path, source }
        }
    }
}
