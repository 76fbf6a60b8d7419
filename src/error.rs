// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for clearcast
//!
//! Provides detailed error context for diagnosing browser-automation runs.
//! The workflow engine classifies these into the failure taxonomy; anything
//! it cannot classify surfaces as a generic failure with the message intact.

use thiserror::Error;

/// Result type alias for clearcast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for clearcast
#[derive(Error, Debug)]
pub enum Error {
    /// Browser/CDP layer failed
    #[error("Browser error: {0}")]
    Browser(String),

    /// Navigation failed
    #[error("Navigation failed to {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// Bounded operation exceeded its deadline
    #[error("Operation timed out after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// Session snapshot could not be read or parsed
    #[error("Session error: {0}")]
    Session(String),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a browser-layer error
    pub fn browser<S: Into<String>>(msg: S) -> Self {
        Error::Browser(msg.into())
    }

    /// Create a navigation error
    pub fn navigation(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Navigation {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }

    /// Create a session error
    pub fn session<S: Into<String>>(msg: S) -> Self {
        Error::Session(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
