//! Schema translation - generic parameter schemas into validation models.
//!
//! The translator is a total function: whatever the upstream catalog emits,
//! it produces a usable model. Dispatch is a pattern match over the declared
//! `type` string with an explicit default arm; unknown shapes and malformed
//! constraints degrade to the permissive `Any` node per field, never failing
//! the whole tool. One malformed field must not hide an otherwise-usable
//! tool.

use serde_json::{Map, Value};
use tracing::warn;

use super::model::{FieldModel, ValidationModel};
use super::node::{SchemaKind, SchemaNode};

/// Build a validation model from a tool's full input schema.
///
/// Only the `properties` member is consulted; a schema without declared
/// properties yields an empty model that accepts any argument mapping.
pub fn translate_input_schema(schema: &Value) -> ValidationModel {
    match schema.get("properties").and_then(Value::as_object) {
        Some(properties) => translate(properties),
        None => ValidationModel::default(),
    }
}

/// Build a validation model from a `properties` mapping.
///
/// Field order follows the source mapping so regenerated schemas are
/// deterministic.
pub fn translate(properties: &Map<String, Value>) -> ValidationModel {
    let fields = properties
        .iter()
        .map(|(name, def)| FieldModel {
            name: name.clone(),
            node: translate_field(name, def),
        })
        .collect();
    ValidationModel::new(fields)
}

/// Translate a single field definition. Total: every failure mode degrades
/// to `Any` for this field only.
fn translate_field(name: &str, def: &Value) -> SchemaNode {
    let Some(def) = def.as_object() else {
        warn!(field = name, "schema field is not an object, degrading to any");
        return SchemaNode::any();
    };

    let kind = match def.get("type").and_then(Value::as_str) {
        Some("string") => SchemaKind::String,
        Some("integer") => SchemaKind::Integer,
        Some("number") => SchemaKind::Number,
        Some("boolean") => SchemaKind::Boolean,
        Some("object") => match def.get("properties").and_then(Value::as_object) {
            Some(properties) => SchemaKind::Object {
                children: properties
                    .iter()
                    .map(|(child_name, child_def)| {
                        (child_name.clone(), translate_field(child_name, child_def))
                    })
                    .collect(),
            },
            // Objects without declared properties carry no checkable shape.
            None => SchemaKind::Any,
        },
        // Element-level constraints are not propagated.
        Some("array") => SchemaKind::Array,
        other => {
            if let Some(t) = other {
                warn!(field = name, declared = t, "unrecognized schema type, degrading to any");
            }
            SchemaKind::Any
        }
    };

    let minimum = match (&kind, def.get("minimum")) {
        (SchemaKind::Integer | SchemaKind::Number, Some(raw)) => match raw.as_f64() {
            Some(min) => Some(min),
            None => {
                // Malformed constraint: isolate the damage to this field.
                warn!(field = name, "non-numeric minimum, degrading field to any");
                return SchemaNode::any();
            }
        },
        _ => None,
    };

    SchemaNode {
        kind,
        description: def.get("description").and_then(Value::as_str).map(String::from),
        default: def.get("default").cloned(),
        minimum,
    }
}
