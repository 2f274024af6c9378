//! Error types for the chat relay

use thiserror::Error;

/// Substrings the messaging platform uses to signal flood control
const RATE_LIMIT_SIGNALS: &[&str] = &["Flood control exceeded", "Too Many Requests"];

/// Main error type for the chat relay
#[derive(Error, Debug)]
pub enum RelayError {
    /// Messaging platform rejected a request
    #[error("Platform error: {0}")]
    Platform(String),

    /// Completion service rejected a request
    #[error("Completion error: {0}")]
    Completion(String),

    /// Transcription service rejected a request
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Token stream broke mid-generation
    #[error("Stream error: {0}")]
    Stream(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decode error
    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A rate-limited operation kept failing until the attempt budget ran out
    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// Number of attempts made
        attempts: u32,
        /// Message of the final failure
        last_error: String,
    },
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Create a platform error
    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform(msg.into())
    }

    /// Create a completion error
    pub fn completion(msg: impl Into<String>) -> Self {
        Self::Completion(msg.into())
    }

    /// Create a transcription error
    pub fn transcription(msg: impl Into<String>) -> Self {
        Self::Transcription(msg.into())
    }

    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a max retries error from the last observed failure
    #[must_use]
    pub fn max_retries(attempts: u32, last: &RelayError) -> Self {
        Self::MaxRetriesExceeded {
            attempts,
            last_error: last.to_string(),
        }
    }

    /// Whether this error is a flood-control signal worth retrying
    ///
    /// An exhausted retry budget is terminal even though its message still
    /// carries the original flood-control text.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        if matches!(self, Self::MaxRetriesExceeded { .. }) {
            return false;
        }
        let message = self.to_string();
        RATE_LIMIT_SIGNALS
            .iter()
            .any(|signal| message.contains(signal))
    }
}

impl From<config::ConfigError> for RelayError {
    fn from(err: config::ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
