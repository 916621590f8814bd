//! Mode A - direct pass-through forwarding.
//!
//! Reuses the already-open upstream connection to invoke the tool. The
//! upstream's result is already in envelope shape, so it passes through
//! unmodified; anything else is wrapped as a JSON payload.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::domains::upstream::UpstreamConnection;

use super::Forwarder;
use super::envelope::ResponseEnvelope;

/// Forwards calls back through the upstream connection.
pub struct DirectForwarder {
    upstream: Arc<dyn UpstreamConnection>,
}

impl DirectForwarder {
    pub fn new(upstream: Arc<dyn UpstreamConnection>) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl Forwarder for DirectForwarder {
    async fn forward(&self, tool_name: &str, arguments: Map<String, Value>) -> ResponseEnvelope {
        debug!(tool = tool_name, "Forwarding through upstream connection");

        match self.upstream.invoke(tool_name, arguments).await {
            Ok(reply) => match ResponseEnvelope::from_wire(&reply) {
                Some(envelope) => envelope,
                None => ResponseEnvelope::json(&reply),
            },
            Err(e) => {
                error!(tool = tool_name, "Upstream invocation failed: {e}");
                ResponseEnvelope::error(format!("Error forwarding request: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::upstream::{ToolDescriptor, UpstreamError};
    use serde_json::json;

    /// Upstream double that returns a scripted reply.
    struct ScriptedUpstream {
        reply: Result<Value, String>,
    }

    #[async_trait]
    impl UpstreamConnection for ScriptedUpstream {
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, UpstreamError> {
            Ok(vec![])
        }

        async fn invoke(
            &self,
            _name: &str,
            _arguments: Map<String, Value>,
        ) -> Result<Value, UpstreamError> {
            self.reply
                .clone()
                .map_err(UpstreamError::Call)
        }

        async fn close(&self) -> Result<(), UpstreamError> {
            Ok(())
        }
    }

    fn forwarder(reply: Result<Value, String>) -> DirectForwarder {
        DirectForwarder::new(Arc::new(ScriptedUpstream { reply }))
    }

    #[tokio::test]
    async fn test_envelope_passes_through_unmodified() {
        let wire = json!({"content": [{"type": "text", "text": "ok"}], "isError": false});
        let envelope = forwarder(Ok(wire.clone()))
            .forward("exec_command", Map::new())
            .await;
        assert_eq!(serde_json::to_value(&envelope).unwrap(), wire);
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_failure_envelope() {
        let envelope = forwarder(Err("connection reset".to_string()))
            .forward("exec_command", Map::new())
            .await;
        assert!(envelope.is_error);
        match &envelope.content[0] {
            super::super::envelope::ContentItem::Text { text } => {
                assert!(text.starts_with("Error forwarding request: "));
                assert!(text.contains("connection reset"));
            }
            other => panic!("expected text, got {other:?}"),
        }
    }
}
