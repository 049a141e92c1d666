//! Error types for Haven

use std::time::Duration;

use thiserror::Error;

/// Result type alias for Haven operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Haven
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing or rejected API credential (fatal at startup)
    #[error("credential error: {0}")]
    Credential(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Emotion classification error
    #[error("emotion error: {0}")]
    Emotion(String),

    /// Dialogue service error
    #[error("dialogue error: {0}")]
    Dialogue(String),

    /// Remote service temporarily refused the request (rate limit, 5xx)
    #[error("{service} unavailable: {message}")]
    ServiceUnavailable {
        /// Which external service answered
        service: &'static str,
        /// Body or reason reported by the service
        message: String,
        /// Server-provided wait before retrying
        retry_after: Option<Duration>,
    },

    /// A bounded call ran past its deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Name of the operation that was cut off
        operation: &'static str,
        /// The deadline that elapsed
        after: Duration,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error came from a deadline rather than the service itself
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether retrying the same request may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ServiceUnavailable { .. } | Self::Timeout { .. } => true,
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// Server-requested delay before the next attempt, if any
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::ServiceUnavailable { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
