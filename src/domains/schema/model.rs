//! Runtime validation model built from a schema node tree.
//!
//! One model is built per tool at registration time and reused for every
//! invocation. Validation resolves defaults for absent fields and reports
//! per-field violations; it never mutates the model itself, so a single
//! `Arc<ValidationModel>` is safe to share across concurrent calls.

use std::fmt;

use serde_json::{Map, Value, json};

use super::node::{SchemaKind, SchemaNode};

/// A single argument-validation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// The supplied value does not match the declared kind.
    TypeMismatch { field: String, expected: &'static str },
    /// A numeric value is below the declared minimum.
    BelowMinimum { field: String, minimum: f64 },
    /// A required field (no default, non-permissive kind) is absent.
    MissingRequired { field: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { field, expected } => {
                write!(f, "field '{field}': expected {expected}")
            }
            Self::BelowMinimum { field, minimum } => {
                write!(f, "field '{field}': below minimum {minimum}")
            }
            Self::MissingRequired { field } => {
                write!(f, "field '{field}': required but missing")
            }
        }
    }
}

/// One named top-level field of a tool's parameter model.
#[derive(Debug, Clone)]
pub struct FieldModel {
    pub name: String,
    pub node: SchemaNode,
}

/// The runtime-checkable form of a tool's parameter schema.
#[derive(Debug, Clone, Default)]
pub struct ValidationModel {
    fields: Vec<FieldModel>,
}

impl ValidationModel {
    pub fn new(fields: Vec<FieldModel>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldModel] {
        &self.fields
    }

    /// Validate an argument mapping against the model.
    ///
    /// On success returns the resolved arguments: absent fields with a
    /// declared default are filled in, everything else (including fields the
    /// schema does not mention) passes through untouched. On failure returns
    /// every violation found, not just the first.
    pub fn validate(
        &self,
        arguments: &Map<String, Value>,
    ) -> Result<Map<String, Value>, Vec<Violation>> {
        let mut resolved = arguments.clone();
        let mut violations = Vec::new();

        for field in &self.fields {
            match resolved.get_mut(&field.name) {
                Some(value) => check_node(&field.node, value, &field.name, &mut violations),
                None => {
                    if let Some(default) = &field.node.default {
                        resolved.insert(field.name.clone(), default.clone());
                    } else if !field.node.is_optional() {
                        violations.push(Violation::MissingRequired {
                            field: field.name.clone(),
                        });
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(resolved)
        } else {
            Err(violations)
        }
    }

    /// Regenerate an object schema for outward catalog registration.
    ///
    /// Properties appear in the order they were translated, which is the
    /// order the upstream catalog declared them.
    pub fn to_input_schema(&self) -> Map<String, Value> {
        let mut props = Map::new();
        for field in &self.fields {
            props.insert(field.name.clone(), field.node.to_json_schema());
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(props));
        schema
    }
}

/// Check one value against one node, recursing into nested objects.
///
/// Nested object defaults are filled in place, mirroring the top-level
/// resolution behavior.
fn check_node(node: &SchemaNode, value: &mut Value, path: &str, violations: &mut Vec<Violation>) {
    match &node.kind {
        SchemaKind::String => {
            if !value.is_string() {
                violations.push(Violation::TypeMismatch {
                    field: path.to_string(),
                    expected: "string",
                });
            }
        }
        SchemaKind::Integer => {
            if value.as_i64().is_none() && value.as_u64().is_none() {
                violations.push(Violation::TypeMismatch {
                    field: path.to_string(),
                    expected: "integer",
                });
            } else {
                check_minimum(node, value, path, violations);
            }
        }
        SchemaKind::Number => {
            if !value.is_number() {
                violations.push(Violation::TypeMismatch {
                    field: path.to_string(),
                    expected: "number",
                });
            } else {
                check_minimum(node, value, path, violations);
            }
        }
        SchemaKind::Boolean => {
            if !value.is_boolean() {
                violations.push(Violation::TypeMismatch {
                    field: path.to_string(),
                    expected: "boolean",
                });
            }
        }
        SchemaKind::Object { children } => match value.as_object_mut() {
            Some(map) => {
                for (name, child) in children {
                    let child_path = format!("{path}.{name}");
                    match map.get_mut(name) {
                        Some(v) => check_node(child, v, &child_path, violations),
                        None => {
                            if let Some(default) = &child.default {
                                map.insert(name.clone(), default.clone());
                            } else if !child.is_optional() {
                                violations.push(Violation::MissingRequired { field: child_path });
                            }
                        }
                    }
                }
            }
            None => violations.push(Violation::TypeMismatch {
                field: path.to_string(),
                expected: "object",
            }),
        },
        SchemaKind::Array => {
            // Elements are unconstrained; only the container shape is checked.
            if !value.is_array() {
                violations.push(Violation::TypeMismatch {
                    field: path.to_string(),
                    expected: "array",
                });
            }
        }
        SchemaKind::Any => {}
    }
}

fn check_minimum(node: &SchemaNode, value: &Value, path: &str, violations: &mut Vec<Violation>) {
    if let (Some(minimum), Some(n)) = (node.minimum, value.as_f64())
        && n < minimum
    {
        violations.push(Violation::BelowMinimum {
            field: path.to_string(),
            minimum,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn int_field(name: &str, minimum: Option<f64>, default: Option<Value>) -> FieldModel {
        let mut node = SchemaNode::of(SchemaKind::Integer);
        node.minimum = minimum;
        node.default = default;
        FieldModel {
            name: name.to_string(),
            node,
        }
    }

    #[test]
    fn test_minimum_default_semantics() {
        // {type: integer, minimum: 1, default: 5}
        let model = ValidationModel::new(vec![int_field("count", Some(1.0), Some(json!(5)))]);

        // 0 fails validation
        let err = model.validate(&args(json!({"count": 0}))).unwrap_err();
        assert_eq!(
            err,
            vec![Violation::BelowMinimum {
                field: "count".to_string(),
                minimum: 1.0
            }]
        );

        // absent resolves to the default
        let resolved = model.validate(&args(json!({}))).unwrap();
        assert_eq!(resolved["count"], json!(5));

        // 3 passes
        assert!(model.validate(&args(json!({"count": 3}))).is_ok());
    }

    #[test]
    fn test_missing_required_without_default() {
        let model = ValidationModel::new(vec![int_field("count", None, None)]);
        let err = model.validate(&args(json!({}))).unwrap_err();
        assert_eq!(
            err,
            vec![Violation::MissingRequired {
                field: "count".to_string()
            }]
        );
    }

    #[test]
    fn test_type_mismatch_reported_per_field() {
        let model = ValidationModel::new(vec![
            FieldModel {
                name: "name".to_string(),
                node: SchemaNode::of(SchemaKind::String),
            },
            int_field("count", None, None),
        ]);
        let err = model
            .validate(&args(json!({"name": 42, "count": "nope"})))
            .unwrap_err();
        assert_eq!(err.len(), 2);
    }

    #[test]
    fn test_nested_object_validation_and_defaults() {
        let mut inner = SchemaNode::of(SchemaKind::String);
        inner.default = Some(json!("ssh"));
        let model = ValidationModel::new(vec![FieldModel {
            name: "options".to_string(),
            node: SchemaNode::of(SchemaKind::Object {
                children: vec![("protocol".to_string(), inner)],
            }),
        }]);

        let resolved = model.validate(&args(json!({"options": {}}))).unwrap();
        assert_eq!(resolved["options"]["protocol"], json!("ssh"));

        let err = model.validate(&args(json!({"options": []}))).unwrap_err();
        assert_eq!(
            err,
            vec![Violation::TypeMismatch {
                field: "options".to_string(),
                expected: "object"
            }]
        );
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let model = ValidationModel::new(vec![]);
        let resolved = model.validate(&args(json!({"extra": true}))).unwrap();
        assert_eq!(resolved["extra"], json!(true));
    }

    #[test]
    fn test_array_elements_unconstrained() {
        let model = ValidationModel::new(vec![FieldModel {
            name: "items".to_string(),
            node: SchemaNode::of(SchemaKind::Array),
        }]);
        assert!(
            model
                .validate(&args(json!({"items": [1, "two", null]})))
                .is_ok()
        );
        assert!(model.validate(&args(json!({"items": "nope"}))).is_err());
    }
}
