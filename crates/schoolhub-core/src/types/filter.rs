//! Filter types for document queries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single equality condition on a named document field.
///
/// A document that lacks the field matches a `Null` value, so "field is
/// absent" and "field is null" are the same condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterField {
    /// The document field to filter on.
    pub field: String,
    /// The value the field must equal.
    pub value: Value,
}

impl FilterField {
    /// Shorthand for an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether a document's field map satisfies this condition.
    pub fn matches(&self, fields: &serde_json::Map<String, Value>) -> bool {
        fields.get(&self.field).unwrap_or(&Value::Null) == &self.value
    }
}
