//! Tool catalog bridge: lifecycle and the outward MCP handler.
//!
//! The bridge walks a fixed lifecycle: `Idle → Connecting → Connected →
//! Serving → Closing → Closed`. Connection and registration failures are
//! fatal at startup; after that, every tool-call outcome is an envelope and
//! the only remaining transitions are the shutdown ones.
//!
//! The outward handler is hand-written rather than macro-routed: the catalog
//! only exists at runtime, one proxy tool per upstream descriptor, each
//! carrying its prebuilt validation model.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, Implementation, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
    },
    service::{RequestContext, RunningService},
};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use super::config::{Config, ServerConfig};
use super::error::{Error, Result};
use crate::domains::forward::{Forwarder, ResponseEnvelope, build_forwarder};
use crate::domains::schema::{ValidationModel, translate_input_schema};
use crate::domains::upstream::{HttpUpstream, UpstreamConnection};

/// Lifecycle states of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    Connecting,
    Connected,
    Serving,
    Closing,
    Closed,
}

/// One outward tool backed by an upstream descriptor.
#[derive(Clone)]
pub struct ProxyTool {
    pub name: String,
    pub description: String,
    model: Arc<ValidationModel>,
}

impl ProxyTool {
    fn to_tool(&self) -> Tool {
        Tool::new(
            self.name.clone(),
            self.description.clone(),
            Arc::new(self.model.to_input_schema()),
        )
    }
}

/// The outward MCP handler: a dynamic catalog of proxy tools, each call
/// validated against its model and delegated to the configured forwarder.
#[derive(Clone)]
pub struct BridgeHandler {
    server: ServerConfig,
    tools: Arc<Vec<ProxyTool>>,
    forwarder: Arc<dyn Forwarder>,
}

impl BridgeHandler {
    /// Build the handler from upstream descriptors.
    ///
    /// Fails on a duplicate tool name; the catalog must be unambiguous
    /// before anything is exposed outward.
    pub fn new(
        server: ServerConfig,
        descriptors: Vec<crate::domains::upstream::ToolDescriptor>,
        forwarder: Arc<dyn Forwarder>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut tools = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            if !seen.insert(descriptor.name.clone()) {
                return Err(Error::registration(format!(
                    "duplicate tool name '{}' in upstream catalog",
                    descriptor.name
                )));
            }
            let model = translate_input_schema(&descriptor.parameter_schema);
            debug!(
                tool = %descriptor.name,
                fields = model.fields().len(),
                "Registered proxy tool"
            );
            tools.push(ProxyTool {
                name: descriptor.name,
                description: descriptor.description,
                model: Arc::new(model),
            });
        }

        if tools.is_empty() {
            warn!("Upstream catalog is empty; serving zero tools");
        } else {
            info!(count = tools.len(), "Proxy tool catalog built");
        }

        Ok(Self {
            server,
            tools: Arc::new(tools),
            forwarder,
        })
    }

    /// The outward catalog in upstream order.
    pub fn catalog(&self) -> Vec<Tool> {
        self.tools.iter().map(ProxyTool::to_tool).collect()
    }

    /// Validate and forward one call.
    ///
    /// Unknown tools are a protocol error; everything past the name lookup
    /// is an envelope, never an Err.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let Some(tool) = self.tools.iter().find(|t| t.name == name) else {
            return Err(McpError::invalid_params(
                format!("Unknown tool '{name}'"),
                None,
            ));
        };

        let resolved = match tool.model.validate(&arguments) {
            Ok(resolved) => resolved,
            Err(violations) => {
                let detail = violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(tool = name, "Rejected arguments: {detail}");
                return Ok(ResponseEnvelope::error(format!(
                    "Invalid arguments for tool '{name}': {detail}"
                ))
                .into_call_tool_result());
            }
        };

        debug!(tool = name, "Forwarding call");
        let envelope = self.forwarder.forward(name, resolved).await;
        Ok(envelope.into_call_tool_result())
    }
}

impl ServerHandler for BridgeHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Exposes the tool catalog of an upstream MCP server. Every call is \
                 forwarded and its outcome returned as a uniform content envelope."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.server.name.clone(),
                version: self.server.version.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!(count = self.tools.len(), "Listing tools");
        Ok(ListToolsResult {
            tools: self.catalog(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!(tool = %request.name, "Tool call received");
        self.dispatch(&request.name, request.arguments.unwrap_or_default())
            .await
    }
}

/// The bridge itself: upstream connection, handler, lifecycle.
pub struct ToolBridge {
    state: BridgeState,
    upstream: Arc<dyn UpstreamConnection>,
    handler: BridgeHandler,
}

impl ToolBridge {
    /// Connect to the configured upstream and build the outward catalog.
    ///
    /// Fatal on failure; the caller exits rather than retrying.
    pub async fn connect(config: &Config) -> Result<Self> {
        info!(url = %config.upstream.url, "Connecting to upstream");
        let upstream = Arc::new(HttpUpstream::connect(&config.upstream.url).await?);
        Self::connect_with(config, upstream).await
    }

    /// Build the bridge over an already-open upstream connection.
    pub async fn connect_with(
        config: &Config,
        upstream: Arc<dyn UpstreamConnection>,
    ) -> Result<Self> {
        let descriptors = upstream.list_tools().await?;
        info!(count = descriptors.len(), "Upstream catalog fetched");

        let forwarder = build_forwarder(
            config.forwarding.mode,
            &config.forwarding.origin,
            config.forwarding.wire_format,
            upstream.clone(),
        );
        let handler = BridgeHandler::new(config.server.clone(), descriptors, forwarder)?;

        Ok(Self {
            state: BridgeState::Connected,
            upstream,
            handler,
        })
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn handler(&self) -> BridgeHandler {
        self.handler.clone()
    }

    /// Publish the catalog on stdio.
    pub async fn serve_stdio(&mut self) -> Result<RunningService<RoleServer, BridgeHandler>> {
        if self.state != BridgeState::Connected {
            return Err(Error::internal(format!(
                "cannot serve from state {:?}",
                self.state
            )));
        }

        let service = self
            .handler
            .clone()
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| Error::registration(format!("failed to start stdio transport: {e}")))?;

        self.state = BridgeState::Serving;
        info!("Serving tool catalog on stdio");
        Ok(service)
    }

    /// Drive the outward service until it ends or shutdown is requested,
    /// then tear everything down: outward side first, upstream second.
    pub async fn run_until_shutdown<F>(
        &mut self,
        service: RunningService<RoleServer, BridgeHandler>,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let token = service.cancellation_token();
        let mut waiting = std::pin::pin!(service.waiting());
        tokio::pin!(shutdown);

        tokio::select! {
            reason = &mut waiting => {
                info!("Outward transport ended: {reason:?}");
            }
            _ = &mut shutdown => {
                info!("Shutdown requested");
                token.cancel();
                if let Err(e) = waiting.await {
                    warn!("Outward transport did not stop cleanly: {e}");
                }
            }
        }

        self.close().await;
        Ok(())
    }

    /// Close the upstream side. Best-effort; terminal once done.
    pub async fn close(&mut self) {
        if self.state == BridgeState::Closed {
            return;
        }
        self.state = BridgeState::Closing;

        if let Err(e) = self.upstream.close().await {
            error!("Failed to close upstream connection: {e}");
        }

        self.state = BridgeState::Closed;
        info!("Bridge closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::upstream::{ToolDescriptor, UpstreamError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedUpstream {
        descriptors: Vec<ToolDescriptor>,
        calls: AtomicUsize,
    }

    impl ScriptedUpstream {
        fn new(descriptors: Vec<ToolDescriptor>) -> Arc<Self> {
            Arc::new(Self {
                descriptors,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl UpstreamConnection for ScriptedUpstream {
        async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, UpstreamError> {
            Ok(self.descriptors.clone())
        }

        async fn invoke(
            &self,
            name: &str,
            arguments: Map<String, Value>,
        ) -> std::result::Result<Value, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({
                "content": [{"type": "text", "text": format!("{name}:{}", Value::Object(arguments))}],
                "isError": false
            }))
        }

        async fn close(&self) -> std::result::Result<(), UpstreamError> {
            Ok(())
        }
    }

    fn descriptor(name: &str, schema: Value) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: format!("{name} tool"),
            parameter_schema: schema,
        }
    }

    fn counted_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "count": {"type": "integer", "minimum": 1, "default": 5}
            }
        })
    }

    fn result_text(result: &CallToolResult) -> String {
        serde_json::to_value(result).unwrap()["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_empty_catalog_serves_zero_tools() {
        let upstream = ScriptedUpstream::new(vec![]);
        let bridge = ToolBridge::connect_with(&Config::default(), upstream)
            .await
            .unwrap();
        assert_eq!(bridge.state(), BridgeState::Connected);
        assert!(bridge.handler().catalog().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_tool_name_is_fatal() {
        let upstream = ScriptedUpstream::new(vec![
            descriptor("exec", json!({"type": "object", "properties": {}})),
            descriptor("exec", json!({"type": "object", "properties": {}})),
        ]);
        let result = ToolBridge::connect_with(&Config::default(), upstream).await;
        assert!(matches!(result, Err(Error::Registration(_))));
    }

    #[tokio::test]
    async fn test_catalog_regenerates_schemas_in_order() {
        let upstream = ScriptedUpstream::new(vec![descriptor(
            "exec",
            json!({
                "type": "object",
                "properties": {
                    "command": {"type": "string", "description": "shell command"},
                    "count": {"type": "integer", "minimum": 1, "default": 5}
                }
            }),
        )]);
        let bridge = ToolBridge::connect_with(&Config::default(), upstream)
            .await
            .unwrap();

        let catalog = bridge.handler().catalog();
        assert_eq!(catalog.len(), 1);
        let schema = serde_json::to_value(catalog[0].input_schema.as_ref()).unwrap();
        let keys: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["command", "count"]);
        assert_eq!(schema["properties"]["count"]["minimum"], json!(1.0));
    }

    #[tokio::test]
    async fn test_dispatch_rejects_invalid_arguments_without_forwarding() {
        let upstream = ScriptedUpstream::new(vec![descriptor("exec", counted_schema())]);
        let bridge = ToolBridge::connect_with(&Config::default(), upstream.clone())
            .await
            .unwrap();
        let handler = bridge.handler();

        let args = json!({"count": 0}).as_object().unwrap().clone();
        let result = handler.dispatch("exec", args).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).contains("below minimum"));
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_fills_default_and_forwards() {
        let upstream = ScriptedUpstream::new(vec![descriptor("exec", counted_schema())]);
        let bridge = ToolBridge::connect_with(&Config::default(), upstream.clone())
            .await
            .unwrap();
        let handler = bridge.handler();

        let result = handler.dispatch("exec", Map::new()).await.unwrap();
        assert_eq!(result.is_error, Some(false));
        assert!(result_text(&result).contains("\"count\":5"));
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_a_protocol_error() {
        let upstream = ScriptedUpstream::new(vec![]);
        let bridge = ToolBridge::connect_with(&Config::default(), upstream)
            .await
            .unwrap();
        assert!(bridge.handler().dispatch("ghost", Map::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_are_independent() {
        let upstream = ScriptedUpstream::new(vec![descriptor("exec", counted_schema())]);
        let bridge = ToolBridge::connect_with(&Config::default(), upstream.clone())
            .await
            .unwrap();
        let handler = bridge.handler();

        let barrier = Arc::new(tokio::sync::Barrier::new(8));
        let mut handles = Vec::new();
        for i in 1..=8 {
            let handler = handler.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                let args = json!({"count": i}).as_object().unwrap().clone();
                handler.dispatch("exec", args).await.unwrap()
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.await.unwrap();
            assert_eq!(result.is_error, Some(false));
            assert!(result_text(&result).contains(&format!("\"count\":{}", i + 1)));
        }
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_close_is_terminal() {
        let upstream = ScriptedUpstream::new(vec![]);
        let mut bridge = ToolBridge::connect_with(&Config::default(), upstream)
            .await
            .unwrap();
        bridge.close().await;
        assert_eq!(bridge.state(), BridgeState::Closed);
        // A second close is a no-op.
        bridge.close().await;
        assert_eq!(bridge.state(), BridgeState::Closed);

        assert!(matches!(
            bridge.serve_stdio().await,
            Err(Error::Internal(_))
        ));
    }
}
