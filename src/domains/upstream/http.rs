//! Streamable HTTP upstream connection.
//!
//! Concrete [`UpstreamConnection`] backed by an rmcp client session over the
//! streamable HTTP transport. The session is opened once at startup; the
//! peer handle is cheap to clone and shared with every concurrent forward.

use std::borrow::Cow;

use async_trait::async_trait;
use rmcp::ServiceExt;
use rmcp::model::CallToolRequestParams;
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::info;

use super::connection::{ToolDescriptor, UpstreamConnection};
use super::error::UpstreamError;

/// An open rmcp client session against the upstream server.
pub struct HttpUpstream {
    peer: rmcp::service::Peer<RoleClient>,
    /// Taken on close; the peer stays usable for in-flight calls until the
    /// session actually cancels.
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
}

impl HttpUpstream {
    /// Connect and complete the MCP handshake.
    pub async fn connect(url: &str) -> Result<Self, UpstreamError> {
        let config = StreamableHttpClientTransportConfig::with_uri(url.to_string());
        let transport = StreamableHttpClientTransport::from_config(config);

        let service: RunningService<RoleClient, ()> = ()
            .serve(transport)
            .await
            .map_err(|e| UpstreamError::Connect(e.to_string()))?;

        if let Some(init) = service.peer_info() {
            info!(
                server = %init.server_info.name,
                version = %init.server_info.version,
                "Connected to upstream MCP server"
            );
        }

        let peer = service.peer().clone();
        Ok(Self {
            peer,
            service: Mutex::new(Some(service)),
        })
    }
}

#[async_trait]
impl UpstreamConnection for HttpUpstream {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, UpstreamError> {
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| UpstreamError::ListTools(e.to_string()))?;

        Ok(tools
            .into_iter()
            .map(|t| ToolDescriptor {
                name: t.name.to_string(),
                description: t.description.as_deref().unwrap_or("").to_string(),
                parameter_schema: Value::Object(t.input_schema.as_ref().clone()),
            })
            .collect())
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, UpstreamError> {
        let params = CallToolRequestParams {
            meta: None,
            name: Cow::Owned(name.to_string()),
            arguments: Some(arguments),
            task: None,
        };

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| UpstreamError::Call(e.to_string()))?;

        serde_json::to_value(&result).map_err(|e| UpstreamError::Call(e.to_string()))
    }

    async fn close(&self) -> Result<(), UpstreamError> {
        let service = self.service.lock().await.take();
        match service {
            Some(service) => {
                service
                    .cancel()
                    .await
                    .map_err(|e| UpstreamError::Close(e.to_string()))?;
                info!("Upstream connection closed");
                Ok(())
            }
            // Already closed; nothing left to attempt.
            None => Ok(()),
        }
    }
}
