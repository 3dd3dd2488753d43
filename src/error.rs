//! Error handling module for Voicekeeper.
//!
//! This module provides a unified error type using the `thiserror` crate,
//! consolidating all error types from various operations into a single enum.

use std::io;
use thiserror::Error;

/// Unified error type for the Voicekeeper library.
///
/// This enum represents all possible errors that can occur in the library,
/// providing automatic conversions from underlying error types.
#[derive(Error, Debug)]
pub enum VoicekeeperError {
    /// I/O operation errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Durable store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Lock acquisition errors
    #[error("Failed to acquire lock: {0}")]
    LockFailed(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Gateway operation errors (connect, disconnect, lookups)
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Generic operation errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Voicekeeper operations
pub type Result<T> = std::result::Result<T, VoicekeeperError>;

// Helper implementations for common conversions
impl VoicekeeperError {
    /// Create a durable store error
    pub fn store(msg: impl Into<String>) -> Self {
        VoicekeeperError::Store(msg.into())
    }

    /// Create a lock failure error
    pub fn lock(msg: impl Into<String>) -> Self {
        VoicekeeperError::LockFailed(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        VoicekeeperError::Config(msg.into())
    }

    /// Create a gateway error
    pub fn gateway(msg: impl Into<String>) -> Self {
        VoicekeeperError::Gateway(msg.into())
    }

    /// Create a generic other error
    pub fn other(msg: impl Into<String>) -> Self {
        VoicekeeperError::Other(msg.into())
    }
}

// Allow conversion from string for convenience
impl From<String> for VoicekeeperError {
    fn from(s: String) -> Self {
        VoicekeeperError::Other(s)
    }
}

impl From<&str> for VoicekeeperError {
    fn from(s: &str) -> Self {
        VoicekeeperError::Other(s.to_string())
    }
}
