// src/error.rs

//! Unified error handling for the aggregator.

use std::fmt;

use thiserror::Error;

/// Result type alias for aggregator operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A document store could not serve the request
    #[error("Storage error: {0}")]
    Storage(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The friend roster could not be fetched or parsed
    #[error("Roster error for {location}: {message}")]
    Roster { location: String, message: String },

    /// A feed document could not be fetched or parsed
    #[error("Feed error for {url}: {message}")]
    Feed { url: String, message: String },
}

impl AppError {
    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a roster error with its location.
    pub fn roster(location: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Roster {
            location: location.into(),
            message: message.to_string(),
        }
    }

    /// Create a feed error with the offending URL.
    pub fn feed(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Feed {
            url: url.into(),
            message: message.to_string(),
        }
    }
}
