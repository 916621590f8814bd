//! Schema node tree - the loosely-typed parameter-shape description.
//!
//! A `SchemaNode` is one node of the generic JSON schema an upstream server
//! attaches to a tool. The kind set is closed; anything the translator does
//! not recognize becomes [`SchemaKind::Any`], which accepts every value.

use serde_json::{Map, Value, json};

/// The closed set of schema kinds the bridge understands.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Nested object with its declared properties, in source order.
    Object { children: Vec<(String, SchemaNode)> },
    /// Array of unconstrained elements. Element-level constraints from the
    /// source schema are not propagated (known limitation).
    Array,
    /// Permissive fallback - accepts all values, including absence.
    Any,
}

/// One node of a tool's parameter schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub description: Option<String>,
    /// Supplied when the argument is absent. Not validated against `minimum`;
    /// constraint checking and default supply are independent.
    pub default: Option<Value>,
    /// Lower bound for `Integer` and `Number` kinds only.
    pub minimum: Option<f64>,
}

impl SchemaNode {
    /// The permissive node: no constraints, no metadata.
    pub fn any() -> Self {
        Self {
            kind: SchemaKind::Any,
            description: None,
            default: None,
            minimum: None,
        }
    }

    /// A bare node of the given kind with no metadata.
    pub fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            description: None,
            default: None,
            minimum: None,
        }
    }

    /// Whether an argument for this node may be absent without violation.
    ///
    /// Mirrors the registration-time contract: fields with a default are
    /// resolved from the default, `Any` fields accept absence, everything
    /// else is required.
    pub fn is_optional(&self) -> bool {
        self.default.is_some() || matches!(self.kind, SchemaKind::Any)
    }

    /// Regenerate the JSON schema for this node.
    ///
    /// Used to publish the outward catalog; children are emitted in source
    /// order so the generated documentation is deterministic.
    pub fn to_json_schema(&self) -> Value {
        let mut obj = Map::new();

        match &self.kind {
            SchemaKind::String => {
                obj.insert("type".into(), json!("string"));
            }
            SchemaKind::Integer => {
                obj.insert("type".into(), json!("integer"));
            }
            SchemaKind::Number => {
                obj.insert("type".into(), json!("number"));
            }
            SchemaKind::Boolean => {
                obj.insert("type".into(), json!("boolean"));
            }
            SchemaKind::Object { children } => {
                obj.insert("type".into(), json!("object"));
                let mut props = Map::new();
                for (name, child) in children {
                    props.insert(name.clone(), child.to_json_schema());
                }
                obj.insert("properties".into(), Value::Object(props));
            }
            SchemaKind::Array => {
                obj.insert("type".into(), json!("array"));
            }
            // An empty schema accepts everything.
            SchemaKind::Any => {}
        }

        if let Some(desc) = &self.description {
            obj.insert("description".into(), json!(desc));
        }
        if let Some(min) = self.minimum {
            obj.insert("minimum".into(), json!(min));
        }
        if let Some(default) = &self.default {
            obj.insert("default".into(), default.clone());
        }

        Value::Object(obj)
    }
}
