//! The upstream connection capability.
//!
//! The bridge consumes the upstream as a capability: list tools, invoke a
//! tool by name, close. The trait keeps the catalog bridge and the direct
//! forwarder independent of the concrete transport, and lets tests stand in
//! a scripted upstream.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::error::UpstreamError;

/// One tool advertised by the upstream catalog.
///
/// Immutable once retrieved; held for the process lifetime.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    /// Unique within the catalog.
    pub name: String,
    pub description: String,
    /// The tool's full input schema as the upstream declared it.
    pub parameter_schema: Value,
}

/// Capability interface over an open upstream connection.
#[async_trait]
pub trait UpstreamConnection: Send + Sync {
    /// Fetch the advertised tool catalog. An empty catalog is valid.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, UpstreamError>;

    /// Invoke a tool by name, returning the upstream's native
    /// envelope-shaped result (`{content, isError}`).
    async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, UpstreamError>;

    /// Close the connection. Best-effort; callers log failures and move on.
    async fn close(&self) -> Result<(), UpstreamError>;
}
