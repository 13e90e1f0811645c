//! Common error types for status-relay.
//!
//! This module provides shared error types that are used across multiple crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the relay.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A raw status could not be decoded.
    #[error("malformed status: {0}")]
    MalformedStatus(#[from] serde_json::Error),
}

impl CoreError {
    /// Shorthand for building an [`CoreError::InvalidConfig`].
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
