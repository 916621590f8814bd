//! Upstream-connection error types.

use thiserror::Error;

/// Errors from the upstream connection capability.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The connection or handshake failed. Fatal at startup.
    #[error("Failed to connect to upstream server: {0}")]
    Connect(String),

    /// The catalog could not be listed over an open connection.
    #[error("Failed to list upstream tools: {0}")]
    ListTools(String),

    /// A tool invocation failed at the transport or protocol level.
    #[error("Upstream call failed: {0}")]
    Call(String),

    /// Closing the connection failed. Logged, never fatal.
    #[error("Failed to close upstream connection: {0}")]
    Close(String),
}
