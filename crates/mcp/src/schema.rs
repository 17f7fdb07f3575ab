//! Tool input schemas, declared as data.
//!
//! A schema is a flat list of named fields. It renders to the JSON Schema
//! object advertised by `tools/list` and validates argument bags at the
//! dispatch boundary.

use serde_json::{Map, Value, json};
use thiserror::Error;

/// The JSON type a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Boolean,
    /// An object whose values are all strings.
    StringMap,
    /// An array of integers.
    IntegerArray,
}

impl FieldKind {
    fn describe(self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Integer => "an integer",
            FieldKind::Boolean => "a boolean",
            FieldKind::StringMap => "an object of strings",
            FieldKind::IntegerArray => "an array of integers",
        }
    }

    fn json_schema(self) -> Map<String, Value> {
        let value = match self {
            FieldKind::String => json!({ "type": "string" }),
            FieldKind::Integer => json!({ "type": "integer" }),
            FieldKind::Boolean => json!({ "type": "boolean" }),
            FieldKind::StringMap => json!({
                "type": "object",
                "additionalProperties": { "type": "string" }
            }),
            FieldKind::IntegerArray => json!({
                "type": "array",
                "items": { "type": "integer" }
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::StringMap => value
                .as_object()
                .is_some_and(|map| map.values().all(Value::is_string)),
            FieldKind::IntegerArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| v.is_i64() || v.is_u64())),
        }
    }
}

/// A single named input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub description: String,
    pub required: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer, description)
    }

    pub fn string_map(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldKind::StringMap, description)
    }

    pub fn integer_array(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldKind::IntegerArray, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Boundary validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{0} is required")]
    MissingField(String),

    #[error("{field} must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

/// The declared input contract of a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSchema {
    fields: Vec<Field>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Names of the required fields, in declaration order.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }

    /// Render as a JSON Schema object.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut property = field.kind.json_schema();
            if !field.description.is_empty() {
                property.insert("description".into(), Value::String(field.description.clone()));
            }
            properties.insert(field.name.clone(), Value::Object(property));
        }

        let mut schema = Map::new();
        schema.insert("type".into(), Value::String("object".into()));
        schema.insert("properties".into(), Value::Object(properties));
        let required: Vec<Value> = self.required().map(|n| Value::String(n.into())).collect();
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        schema
    }

    /// Check presence of required fields and the type of every supplied one.
    ///
    /// A `null` value counts as absent. Undeclared fields pass through.
    pub fn validate(&self, arguments: &Map<String, Value>) -> Result<(), SchemaError> {
        for field in &self.fields {
            match arguments.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Err(SchemaError::MissingField(field.name.clone()));
                    }
                }
                Some(value) if !field.kind.accepts(value) => {
                    return Err(SchemaError::WrongType {
                        field: field.name.clone(),
                        expected: field.kind.describe(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> InputSchema {
        InputSchema::new()
            .field(Field::string("name", "Resource name").required())
            .field(Field::integer("memory", "Memory in MB"))
            .field(Field::string_map("secret", "Secret values"))
            .field(Field::integer_array("ports", "Exposed ports"))
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn renders_json_schema() {
        let json = Value::Object(schema().to_json());
        assert_eq!(json["type"], "object");
        assert_eq!(json["required"], json!(["name"]));
        assert_eq!(json["properties"]["name"]["type"], "string");
        assert_eq!(json["properties"]["name"]["description"], "Resource name");
        assert_eq!(json["properties"]["secret"]["additionalProperties"]["type"], "string");
        assert_eq!(json["properties"]["ports"]["items"]["type"], "integer");
    }

    #[test]
    fn schema_without_required_fields_omits_required_key() {
        let schema = InputSchema::new().field(Field::string("filter", ""));
        let json = schema.to_json();
        assert!(!json.contains_key("required"));
        assert!(!json["properties"]["filter"]
            .as_object()
            .unwrap()
            .contains_key("description"));
    }

    #[test]
    fn missing_required_field() {
        let err = schema().validate(&Map::new()).unwrap_err();
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn null_counts_as_missing() {
        let err = schema().validate(&args(json!({ "name": null }))).unwrap_err();
        assert_eq!(err, SchemaError::MissingField("name".into()));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let cases = [
            json!({ "name": 1 }),
            json!({ "name": "a", "memory": "big" }),
            json!({ "name": "a", "memory": 1.5 }),
            json!({ "name": "a", "secret": { "k": 1 } }),
            json!({ "name": "a", "ports": [80, "443"] }),
        ];
        for case in cases {
            assert!(
                matches!(schema().validate(&args(case.clone())), Err(SchemaError::WrongType { .. })),
                "{case}"
            );
        }
    }

    #[test]
    fn valid_and_extra_fields_pass() {
        let value = json!({
            "name": "a",
            "memory": 2048,
            "secret": { "token": "x" },
            "ports": [80, 443],
            "unrelated": true
        });
        assert!(schema().validate(&args(value)).is_ok());
    }
}
