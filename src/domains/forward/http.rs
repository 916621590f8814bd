//! Mode B - HTTP re-dispatch forwarding.
//!
//! Issues a POST to `{origin}/api/tool/{name}` and decodes the reply
//! according to the wire format fixed at construction time: the arguments
//! directly as the request body, or a JSON-RPC 2.0 envelope. A single
//! attempt per invocation, transport-default timeout, no retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, error};

use super::Forwarder;
use super::envelope::ResponseEnvelope;
use super::error::ForwardError;

/// Request/response encoding used against the origin.
///
/// Chosen per deployment, never per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WireFormat {
    /// Arguments are the request body; replies are an envelope or a bare
    /// payload.
    #[default]
    DirectBody,
    /// JSON-RPC 2.0 envelope with a time-derived id; replies carry `result`
    /// or `error`.
    JsonRpc,
}

/// Forwards calls to a separate HTTP origin.
pub struct HttpForwarder {
    client: reqwest::Client,
    origin: String,
    format: WireFormat,
}

impl HttpForwarder {
    pub fn new(origin: impl Into<String>, format: WireFormat) -> Self {
        Self {
            client: reqwest::Client::new(),
            origin: origin.into(),
            format,
        }
    }

    fn tool_url(&self, tool_name: &str) -> String {
        format!("{}/api/tool/{tool_name}", self.origin.trim_end_matches('/'))
    }

    /// Transmit the call and return the raw reply body.
    async fn dispatch(&self, tool_name: &str, body: Value) -> Result<String, ForwardError> {
        let response = self
            .client
            .post(self.tool_url(tool_name))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ForwardError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, tool_name: &str, arguments: Map<String, Value>) -> ResponseEnvelope {
        debug!(tool = tool_name, format = ?self.format, "Forwarding to HTTP origin");

        let body = match self.format {
            WireFormat::DirectBody => Value::Object(arguments),
            WireFormat::JsonRpc => json!({
                "jsonrpc": "2.0",
                "method": tool_name,
                "params": arguments,
                "id": chrono::Utc::now().timestamp_millis(),
            }),
        };

        let text = match self.dispatch(tool_name, body).await {
            Ok(text) => text,
            Err(e) => {
                error!(tool = tool_name, "Forwarding failed: {e}");
                return ResponseEnvelope::error(e.to_string());
            }
        };

        // Opaque text is a legitimate tool result, never a fault.
        let Ok(reply) = serde_json::from_str::<Value>(&text) else {
            return ResponseEnvelope::text(text);
        };

        match self.format {
            WireFormat::DirectBody => decode_direct_body(reply),
            WireFormat::JsonRpc => decode_json_rpc(reply),
        }
    }
}

/// Decode a direct-body reply: envelope shape passes through, an explicit
/// error indicator without content becomes a failure, anything else is a
/// bare payload wrapped as JSON.
fn decode_direct_body(reply: Value) -> ResponseEnvelope {
    if let Some(envelope) = ResponseEnvelope::from_wire(&reply) {
        return envelope;
    }
    if reply.get("isError").and_then(Value::as_bool) == Some(true) {
        return ResponseEnvelope::error(reply.to_string());
    }
    ResponseEnvelope::json(&reply)
}

/// Decode a JSON-RPC reply: unwrap `result` (objects through the JSON
/// wrapper, scalars through the text wrapper) or stringify `error`.
fn decode_json_rpc(reply: Value) -> ResponseEnvelope {
    if let Some(err) = reply.get("error") {
        return ResponseEnvelope::error(err.to_string());
    }

    match reply.get("result") {
        Some(result @ (Value::Object(_) | Value::Array(_))) => ResponseEnvelope::json(result),
        Some(Value::String(s)) => ResponseEnvelope::text(s.clone()),
        Some(scalar) => ResponseEnvelope::text(scalar.to_string()),
        // Neither result nor error: a malformed but parseable reply.
        None => ResponseEnvelope::json(&reply),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::forward::envelope::ContentItem;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;

    fn envelope_text(envelope: &ResponseEnvelope) -> &str {
        match &envelope.content[0] {
            ContentItem::Text { text } => text,
            other => panic!("expected text, got {other:?}"),
        }
    }

    /// Serve one canned response on an ephemeral port.
    async fn stub_origin(status: StatusCode, body: &'static str) -> String {
        let app = Router::new().route(
            "/api/tool/{name}",
            post(move || async move { (status, body) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_non_2xx_yields_contract_message() {
        let origin = stub_origin(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
        let envelope = HttpForwarder::new(origin, WireFormat::DirectBody)
            .forward("exec_command", Map::new())
            .await;
        assert!(envelope.is_error);
        assert_eq!(
            envelope_text(&envelope),
            "HTTP error! status: 500, Response: boom"
        );
    }

    #[tokio::test]
    async fn test_unparseable_body_wrapped_verbatim() {
        let origin = stub_origin(StatusCode::OK, "plain old text").await;
        let envelope = HttpForwarder::new(origin, WireFormat::DirectBody)
            .forward("exec_command", Map::new())
            .await;
        assert!(!envelope.is_error);
        assert_eq!(envelope_text(&envelope), "plain old text");
    }

    #[tokio::test]
    async fn test_connection_refused_becomes_failure_envelope() {
        // Nothing listens here.
        let envelope = HttpForwarder::new("http://127.0.0.1:1", WireFormat::DirectBody)
            .forward("exec_command", Map::new())
            .await;
        assert!(envelope.is_error);
        assert!(envelope_text(&envelope).starts_with("Error forwarding request: "));
    }

    #[tokio::test]
    async fn test_bare_payload_round_trip() {
        let origin = stub_origin(StatusCode::OK, r#"{"rows": [1, 2], "done": true}"#).await;
        let envelope = HttpForwarder::new(origin, WireFormat::DirectBody)
            .forward("exec_command", Map::new())
            .await;
        assert!(!envelope.is_error);
        let parsed: Value = serde_json::from_str(envelope_text(&envelope)).unwrap();
        assert_eq!(parsed, json!({"rows": [1, 2], "done": true}));
    }

    #[tokio::test]
    async fn test_envelope_reply_passes_through() {
        let origin = stub_origin(
            StatusCode::OK,
            r#"{"content": [{"type": "text", "text": "done"}], "isError": true}"#,
        )
        .await;
        let envelope = HttpForwarder::new(origin, WireFormat::DirectBody)
            .forward("exec_command", Map::new())
            .await;
        assert!(envelope.is_error);
        assert_eq!(envelope_text(&envelope), "done");
    }

    #[tokio::test]
    async fn test_json_rpc_result_object_and_scalar() {
        let origin = stub_origin(
            StatusCode::OK,
            r#"{"jsonrpc": "2.0", "id": 1, "result": {"ok": true}}"#,
        )
        .await;
        let envelope = HttpForwarder::new(origin, WireFormat::JsonRpc)
            .forward("exec_command", Map::new())
            .await;
        assert!(!envelope.is_error);
        let parsed: Value = serde_json::from_str(envelope_text(&envelope)).unwrap();
        assert_eq!(parsed, json!({"ok": true}));

        let origin = stub_origin(StatusCode::OK, r#"{"jsonrpc": "2.0", "id": 2, "result": "ok"}"#).await;
        let envelope = HttpForwarder::new(origin, WireFormat::JsonRpc)
            .forward("exec_command", Map::new())
            .await;
        assert_eq!(envelope_text(&envelope), "ok");
    }

    #[tokio::test]
    async fn test_json_rpc_error_is_stringified() {
        let origin = stub_origin(
            StatusCode::OK,
            r#"{"jsonrpc": "2.0", "id": 3, "error": {"code": -32000, "message": "no such tool"}}"#,
        )
        .await;
        let envelope = HttpForwarder::new(origin, WireFormat::JsonRpc)
            .forward("exec_command", Map::new())
            .await;
        assert!(envelope.is_error);
        assert!(envelope_text(&envelope).contains("no such tool"));
        assert!(envelope_text(&envelope).contains("-32000"));
    }

    #[test]
    fn test_tool_url_normalizes_trailing_slash() {
        let fwd = HttpForwarder::new("http://localhost:3001/", WireFormat::DirectBody);
        assert_eq!(fwd.tool_url("abort_command"), "http://localhost:3001/api/tool/abort_command");
    }
}
