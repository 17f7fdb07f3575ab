//! Request-scoped values exchanged between the dispatch shell and handlers.

use crate::schema::InputSchema;
use policy::Capability;
use serde_json::{Map, Value};
use thiserror::Error;

/// A registered tool's public contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub capability: Capability,
    pub schema: InputSchema,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        capability: Capability,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            capability,
            schema: InputSchema::new(),
        }
    }

    pub fn with_schema(mut self, schema: InputSchema) -> Self {
        self.schema = schema;
        self
    }
}

/// A handler-side argument check failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("{0} is required")]
    Missing(String),

    #[error("{field} must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

/// The argument bag of a single invocation.
///
/// Accessors treat `null` like an absent key. The `required_*` accessors
/// also reject empty strings, independently of boundary validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn present(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn required_str(&self, key: &str) -> Result<&str, ArgumentError> {
        match self.optional_str(key)? {
            Some(s) if !s.trim().is_empty() => Ok(s),
            _ => Err(ArgumentError::Missing(key.to_string())),
        }
    }

    pub fn optional_str(&self, key: &str) -> Result<Option<&str>, ArgumentError> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(wrong_type(key, "a string")),
        }
    }

    /// An optional string, with empty treated as absent.
    pub fn non_empty_str(&self, key: &str) -> Result<Option<&str>, ArgumentError> {
        Ok(self.optional_str(key)?.filter(|s| !s.trim().is_empty()))
    }

    pub fn optional_u64(&self, key: &str) -> Result<Option<u64>, ArgumentError> {
        match self.present(key) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| wrong_type(key, "a non-negative integer")),
        }
    }

    pub fn optional_string_map(
        &self,
        key: &str,
    ) -> Result<Option<std::collections::BTreeMap<String, String>>, ArgumentError> {
        let Some(value) = self.present(key) else {
            return Ok(None);
        };
        let object = value
            .as_object()
            .ok_or_else(|| wrong_type(key, "an object of strings"))?;
        object
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k.clone(), s.clone())),
                _ => Err(wrong_type(key, "an object of strings")),
            })
            .collect::<Result<_, _>>()
            .map(Some)
    }

    pub fn optional_u16_list(&self, key: &str) -> Result<Option<Vec<u16>>, ArgumentError> {
        let Some(value) = self.present(key) else {
            return Ok(None);
        };
        let items = value
            .as_array()
            .ok_or_else(|| wrong_type(key, "an array of ports"))?;
        items
            .iter()
            .map(|v| {
                v.as_u64()
                    .and_then(|n| u16::try_from(n).ok())
                    .ok_or_else(|| wrong_type(key, "an array of ports"))
            })
            .collect::<Result<_, _>>()
            .map(Some)
    }
}

fn wrong_type(field: &str, expected: &'static str) -> ArgumentError {
    ArgumentError::WrongType {
        field: field.to_string(),
        expected,
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Option<Map<String, Value>>> for Arguments {
    fn from(map: Option<Map<String, Value>>) -> Self {
        Self(map.unwrap_or_default())
    }
}

/// Outcome of one handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResult {
    Success(String),
    Failure(String),
}

impl HandlerResult {
    pub fn is_success(&self) -> bool {
        matches!(self, HandlerResult::Success(_))
    }

    pub fn text(&self) -> &str {
        match self {
            HandlerResult::Success(text) | HandlerResult::Failure(text) => text,
        }
    }
}

impl<E: std::fmt::Display> From<Result<String, E>> for HandlerResult {
    fn from(result: Result<String, E>) -> Self {
        match result {
            Ok(text) => HandlerResult::Success(text),
            Err(e) => HandlerResult::Failure(e.to_string()),
        }
    }
}

/// The content/is-error envelope returned to the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    pub text: String,
    pub is_error: bool,
}

impl CallOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

impl From<HandlerResult> for CallOutcome {
    fn from(result: HandlerResult) -> Self {
        match result {
            HandlerResult::Success(text) => Self::success(text),
            HandlerResult::Failure(text) => Self::failure(text),
        }
    }
}
