//! Forward domain module.
//!
//! The call forwarder behind every proxy tool: one strategy object selected
//! at construction time, one envelope per invocation, nothing thrown past
//! the boundary.
//!
//! - `envelope.rs` - the uniform response envelope and its helpers
//! - `direct.rs` - Mode A, pass-through over the upstream connection
//! - `http.rs` - Mode B, re-dispatch to an HTTP origin
//! - `error.rs` - internal errors rendered into failure envelopes

mod direct;
mod envelope;
mod error;
mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domains::upstream::UpstreamConnection;

pub use direct::DirectForwarder;
pub use envelope::{ContentItem, ResponseEnvelope};
pub use error::ForwardError;
pub use http::{HttpForwarder, WireFormat};

/// The forwarding capability every proxy handler delegates to.
///
/// Infallible at the boundary: every outcome is an envelope. Stateless with
/// respect to concurrent calls.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, tool_name: &str, arguments: Map<String, Value>) -> ResponseEnvelope;
}

/// Which forwarding strategy the bridge runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardMode {
    /// Mode A: reuse the upstream connection.
    #[default]
    Direct,
    /// Mode B: POST to a separate HTTP origin.
    Http,
}

/// Construct the configured strategy. Called once at startup.
pub fn build_forwarder(
    mode: ForwardMode,
    origin: &str,
    format: WireFormat,
    upstream: Arc<dyn UpstreamConnection>,
) -> Arc<dyn Forwarder> {
    match mode {
        ForwardMode::Direct => Arc::new(DirectForwarder::new(upstream)),
        ForwardMode::Http => Arc::new(HttpForwarder::new(origin, format)),
    }
}
