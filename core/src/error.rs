//! Error types for diagnostic operations

use thiserror::Error;

/// Main error type for diagnostic operations
///
/// Only resource access and configuration problems are errors. Lookup misses
/// are empty results and malformed documents are reported as data.
#[derive(Error, Debug)]
pub enum DiagnosticsError {
    /// IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A document or schema location that is not a usable URL
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending location
        url: String,
        /// Reason for failure
        reason: String,
    },

    /// A URL whose scheme cannot be read
    #[error("Unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    /// Schema resource errors
    #[error("Failed to read schema '{url}': {message}")]
    SchemaError {
        /// Schema location
        url: String,
        /// Error message
        message: String,
    },

    /// Pattern compilation errors
    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic errors with context
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for diagnostic operations
pub type Result<T> = std::result::Result<T, DiagnosticsError>;

impl DiagnosticsError {
    /// Create a new invalid URL error
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a new schema error
    #[must_use]
    pub fn schema(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaError {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a generic error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            source: None,
        }
    }

    /// Create a generic error with source
    #[must_use]
    pub fn other_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<serde_json::Error> for DiagnosticsError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for DiagnosticsError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
