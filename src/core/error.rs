//! Error types and handling for the bridge.
//!
//! This module defines a unified error type spanning all domains. The
//! propagation policy: anything affecting a single tool call is contained in
//! that call's response envelope and never reaches this type; anything that
//! would prevent the bridge from being usable at all aborts startup through
//! it.

use thiserror::Error;

/// A specialized Result type for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the bridge.
#[derive(Debug, Error)]
pub enum Error {
    /// The upstream connection failed. Fatal at startup, surfaced to the
    /// caller rather than retried.
    #[error("Upstream error: {0}")]
    Upstream(#[from] crate::domains::upstream::UpstreamError),

    /// The outward transport refused a registration or failed to start.
    /// Fatal at startup.
    #[error("Registration error: {0}")]
    Registration(String),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors from file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal errors that should not occur under normal operation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new registration error.
    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
