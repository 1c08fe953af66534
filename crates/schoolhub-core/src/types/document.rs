//! Untyped documents as exchanged with the document store, plus the
//! serde bridge to typed entities.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::result::AppResult;

/// Field map of a document, without its id.
pub type Fields = Map<String, Value>;

/// A stored document: its id plus its field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id, unique within its collection.
    pub id: String,
    /// Stored fields.
    pub fields: Fields,
}

impl Document {
    /// Build a document from an id and fields.
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode into a typed entity. The document id is exposed to the
    /// entity as its `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> AppResult<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            AppError::serialization(format!("Malformed document '{}': {e}", self.id))
        })
    }

    /// Read a single field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Encode an entity into a field map suitable for `create`/`write`.
///
/// Any `id` field is stripped; ids live outside the field map.
pub fn encode_fields<T: Serialize>(value: &T) -> AppResult<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(AppError::serialization(format!(
            "Expected an object, got {other}"
        ))),
    }
}
