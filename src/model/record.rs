use serde_json::{Map, Value};

use super::ResourceKind;
use crate::error::MytardisError;

/// A single remote entity, e.g. one dataset.
///
/// The raw field mapping is kept exactly as the server sent it, key order
/// included, so rendering it back out reproduces the response.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceRecord {
    kind: ResourceKind,
    id: i64,
    fields: Map<String, Value>,
}

impl ResourceRecord {
    /// Builds a record from one decoded JSON object.
    ///
    /// `url` is only used to describe where a malformed object came from.
    pub fn from_json(kind: ResourceKind, value: Value, url: &str) -> Result<Self, MytardisError> {
        let fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(MytardisError::UnexpectedResponse {
                    url: url.to_string(),
                    message: format!("expected a {} object, found {}", kind, json_type(&other)),
                })
            }
        };
        let id = fields
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| MytardisError::UnexpectedResponse {
                url: url.to_string(),
                message: format!("{} object has no numeric \"id\"", kind),
            })?;
        Ok(Self { kind, id, fields })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// All fields in server order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// A string field; `None` when absent, null or not a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// The record's `resource_uri`, falling back to the canonical one.
    pub fn resource_uri(&self) -> String {
        self.str_field("resource_uri")
            .map(str::to_string)
            .unwrap_or_else(|| self.kind.uri(self.id))
    }

    /// Nested sub-entities of `kind` under field `name`.
    ///
    /// Accepts a single object or an array of objects; entries that are
    /// plain resource URIs or lack an id are skipped.
    pub fn nested(&self, kind: ResourceKind, name: &str) -> Vec<ResourceRecord> {
        let values: Vec<&Value> = match self.field(name) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(value @ Value::Object(_)) => vec![value],
            _ => Vec::new(),
        };
        values
            .into_iter()
            .filter_map(|value| ResourceRecord::from_json(kind, value.clone(), "").ok())
            .collect()
    }

    /// The raw field mapping as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
