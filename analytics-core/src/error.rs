//! Error types for the analytics client

use thiserror::Error;

/// Core error type for analytics client operations
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Configuration-related errors (malformed file, wrong-typed option)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors while reading the configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection, TLS, DNS or URL failures during a request
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Response body is not a JSON object
    #[error("Parse error: {0}")]
    Parse(String),
}

impl AnalyticsError {
    /// Whether this error was raised by the transport rather than by
    /// configuration or response decoding.
    pub fn is_network(&self) -> bool {
        matches!(self, AnalyticsError::Network(_) | AnalyticsError::Timeout(_))
    }
}

/// Result type alias for analytics client operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        AnalyticsError::Parse(err.to_string())
    }
}
