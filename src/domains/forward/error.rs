//! Forwarding error types.
//!
//! These never cross the forwarder boundary: every variant is rendered into
//! a failure envelope whose text is the `Display` form below. The exact
//! message shapes are part of the outward contract.

use thiserror::Error;

/// Internal failure while transmitting a forwarded call.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The origin answered outside the 2xx range.
    #[error("HTTP error! status: {status}, Response: {body}")]
    Status { status: u16, body: String },

    /// Transport-level failure: connection refused, timeout, DNS.
    #[error("Error forwarding request: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ForwardError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
