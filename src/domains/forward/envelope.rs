//! The uniform response envelope returned for every tool call.
//!
//! Every forwarding path - success, transport failure, remote-reported
//! error, malformed reply - terminates in exactly one envelope. The wire
//! shape matches the MCP call result (`{content, isError}`), so upstream
//! envelopes pass through unmodified and the outward conversion to
//! `CallToolResult` is a direct serde round-trip.

use rmcp::model::{CallToolResult, Content};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Value, json};

/// One item of envelope content.
///
/// Content kinds outside the three the bridge understands (e.g. audio) are
/// carried verbatim in `Raw` so pass-through never loses data.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Text { text: String },
    Image { data: String, mime_type: String },
    Resource { resource: Value },
    Raw(Value),
}

impl ContentItem {
    /// Classify a wire content item. Anything unrecognized stays raw.
    pub fn from_wire(value: Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some("text") => match value.get("text").and_then(Value::as_str) {
                Some(text) => Self::Text {
                    text: text.to_string(),
                },
                None => Self::Raw(value),
            },
            Some("image") => {
                match (
                    value.get("data").and_then(Value::as_str),
                    value.get("mimeType").and_then(Value::as_str),
                ) {
                    (Some(data), Some(mime_type)) => Self::Image {
                        data: data.to_string(),
                        mime_type: mime_type.to_string(),
                    },
                    _ => Self::Raw(value),
                }
            }
            Some("resource") => match value.get("resource") {
                Some(resource) => Self::Resource {
                    resource: resource.clone(),
                },
                None => Self::Raw(value),
            },
            _ => Self::Raw(value),
        }
    }

    fn to_wire(&self) -> Value {
        match self {
            Self::Text { text } => json!({"type": "text", "text": text}),
            Self::Image { data, mime_type } => {
                json!({"type": "image", "data": data, "mimeType": mime_type})
            }
            Self::Resource { resource } => json!({"type": "resource", "resource": resource}),
            Self::Raw(value) => value.clone(),
        }
    }
}

impl Serialize for ContentItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

/// Uniform success/error wrapper for every forwarded call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub content: Vec<ContentItem>,
    pub is_error: bool,
}

impl ResponseEnvelope {
    /// Success envelope wrapping plain text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Success envelope wrapping structured data as pretty-printed JSON text.
    pub fn json(data: &Value) -> Self {
        let text = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
        Self::text(text)
    }

    /// Failure envelope carrying a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Recognize a reply already in envelope shape.
    ///
    /// Returns `None` when the value does not carry a `content` array;
    /// callers then wrap the value as a bare payload instead.
    pub fn from_wire(value: &Value) -> Option<Self> {
        let content = value.get("content")?.as_array()?;
        Some(Self {
            content: content
                .iter()
                .map(|item| ContentItem::from_wire(item.clone()))
                .collect(),
            is_error: value
                .get("isError")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }

    /// Convert into the rmcp call result handed to the outward transport.
    pub fn into_call_tool_result(self) -> CallToolResult {
        let is_error = self.is_error;
        let wire = serde_json::to_value(&self).unwrap_or(Value::Null);
        match serde_json::from_value::<CallToolResult>(wire) {
            Ok(result) => result,
            // A raw item the MCP model refuses; degrade to its JSON text
            // rather than dropping the reply.
            Err(_) => {
                let text = self
                    .content
                    .iter()
                    .map(|item| item.to_wire().to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                if is_error {
                    CallToolResult::error(vec![Content::text(text)])
                } else {
                    CallToolResult::success(vec![Content::text(text)])
                }
            }
        }
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("content", &self.content)?;
        map.serialize_entry("isError", &self.is_error)?;
        map.end()
    }
}
