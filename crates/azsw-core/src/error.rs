//! Error types for the cache engine.
//!
//! Network failures are the only errors the strategies recover from locally;
//! everything else surfaces to the caller unchanged.

use thiserror::Error;

/// Main error type for the cache engine.
#[derive(Debug, Error)]
pub enum SwError {
    // Network errors
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    // Storage errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Invalid URL {input}: {message}")]
    InvalidUrl { input: String, message: String },

    // Lifecycle errors
    #[error("Install failed on {path}: {message}")]
    InstallFailed { path: String, message: String },

    #[error("Invalid lifecycle state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, SwError>;

impl From<serde_json::Error> for SwError {
    fn from(err: serde_json::Error) -> Self {
        SwError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for SwError {
    fn from(err: rusqlite::Error) -> Self {
        SwError::Storage {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for SwError {
    fn from(err: reqwest::Error) -> Self {
        SwError::Network {
            url: err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown>".to_string()),
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for SwError {
    fn from(err: url::ParseError) -> Self {
        SwError::InvalidUrl {
            input: String::new(),
            message: err.to_string(),
        }
    }
}

impl SwError {
    /// Create a network error for a URL.
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        SwError::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a storage error without an underlying database error.
    pub fn storage(message: impl Into<String>) -> Self {
        SwError::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error is a network failure the strategies may fall back from.
    pub fn is_network(&self) -> bool {
        matches!(self, SwError::Network { .. })
    }
}
