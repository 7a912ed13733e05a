//! Field schemas enforced by collections before any document is stored.

use super::error::{Result, StoreError};
use serde_json::{Map, Value};

/// Accepted JSON shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Number,
    Bool,
    TextList,
    /// A list of labels or a single composite label string
    Labels,
    /// RFC 3339 timestamp string
    Timestamp,
    /// One of a fixed set of string keys
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub nullable: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
            nullable: false,
        }
    }

    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
            nullable: true,
        }
    }
}

/// Schema for one collection: declared fields plus the fields to index.
#[derive(Debug)]
pub struct Schema {
    pub collection: &'static str,
    pub fields: &'static [FieldSpec],
    pub indexes: &'static [&'static str],
}

impl Schema {
    /// Validate a document in its JSON form.
    ///
    /// Undeclared fields pass validation; whether they are written back is
    /// up to the document type (catalog records keep them in `extra`).
    /// Declared fields must match their type. The `id` field must be a
    /// non-empty string.
    pub fn validate(&self, doc: &Value) -> Result<()> {
        let Some(object) = doc.as_object() else {
            return Err(StoreError::schema(self.collection, "<document>", "must be an object"));
        };

        match object.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => {}
            _ => {
                return Err(StoreError::schema(
                    self.collection,
                    "id",
                    "must be a non-empty string",
                ))
            }
        }

        for spec in self.fields {
            self.validate_field(object, spec)?;
        }
        Ok(())
    }

    fn validate_field(&self, object: &Map<String, Value>, spec: &FieldSpec) -> Result<()> {
        let value = match object.get(spec.name) {
            None if spec.required => {
                return Err(StoreError::schema(self.collection, spec.name, "is required"));
            }
            None => return Ok(()),
            Some(Value::Null) if spec.nullable => return Ok(()),
            Some(Value::Null) => {
                return Err(StoreError::schema(self.collection, spec.name, "must not be null"));
            }
            Some(value) => value,
        };

        let ok = match spec.field_type {
            FieldType::Text => value.is_string(),
            FieldType::Number => value.as_f64().is_some_and(f64::is_finite),
            FieldType::Bool => value.is_boolean(),
            FieldType::TextList => is_string_list(value),
            FieldType::Labels => value.is_string() || is_string_list(value),
            FieldType::Timestamp => value
                .as_str()
                .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
            FieldType::OneOf(keys) => value.as_str().is_some_and(|s| keys.contains(&s)),
        };

        if ok {
            Ok(())
        } else {
            Err(StoreError::schema(
                self.collection,
                spec.name,
                format!("expected {}, got {}", describe(spec.field_type), value),
            ))
        }
    }

    pub fn is_indexed(&self, field: &str) -> bool {
        self.indexes.contains(&field)
    }
}

fn is_string_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(Value::is_string))
}

fn describe(field_type: FieldType) -> String {
    match field_type {
        FieldType::Text => "a string".to_string(),
        FieldType::Number => "a finite number".to_string(),
        FieldType::Bool => "a boolean".to_string(),
        FieldType::TextList => "a list of strings".to_string(),
        FieldType::Labels => "a label string or a list of labels".to_string(),
        FieldType::Timestamp => "an RFC 3339 timestamp".to_string(),
        FieldType::OneOf(keys) => format!("one of [{}]", keys.join(", ")),
    }
}
