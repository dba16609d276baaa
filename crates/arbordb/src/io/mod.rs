//! JSON tree import and export.
//!
//! The interchange document has three top-level keys: `types` (declared
//! schemas), `objects` (the entity forest, children nested under their
//! parents), and `relations` (context attachments between entities
//! anywhere in the forest). Attribute values use their JSON-native form
//! where one exists and canonical text otherwise; data payloads are
//! base64-encoded alongside their mimetype.
//!
//! Relation endpoints are references: `id:<n>` for a storage id,
//! `unique_id:<uid>` for a unique id, or a bare key declared on an object
//! as `"ref"`.

mod export;
mod import;

use std::collections::BTreeMap;

use arbordb_core::{CoreError, Value, ValueKind};
use arbordb_graph::GraphError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use export::export_json;
pub use import::import_json;

/// The top-level interchange document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Declared entity types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeEntry>,
    /// The entity forest.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<ObjectEntry>,
    /// Context attachments between entities.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<RelationEntry>,
}

/// One declared entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeEntry {
    /// The declared type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Attribute names mapped to kind names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

/// One entity in the forest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// The entity's type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// The entity's unique id. A fresh one is assigned on import when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    /// An ad-hoc reference key for `relations` entries within the same
    /// document.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Attribute values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, serde_json::Value>,
    /// Named data payloads.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, DataEntry>,
    /// Entities whose parent is this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ObjectEntry>,
}

/// One base64-encoded data payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEntry {
    /// Declared media type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    /// Base64-encoded payload bytes.
    pub content: String,
}

/// One context attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationEntry {
    /// The relation kind; only `"context"` is defined.
    pub relation: String,
    /// The attachment label.
    pub name: String,
    /// Reference to the holding entity.
    pub from: String,
    /// Reference to the attached entity.
    pub to: String,
}

/// Counts of what an export produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Number of exported types.
    pub types: usize,
    /// Number of exported entities.
    pub entities: usize,
    /// Number of exported relations.
    pub relations: usize,
}

/// Counts of what an import created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Number of registered types.
    pub types: usize,
    /// Number of created entities.
    pub entities: usize,
    /// Number of created attachments.
    pub relations: usize,
}

/// Errors raised while importing a document.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The document does not parse as the interchange format.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// A type declares an attribute with an unknown kind name.
    #[error("type {type_name:?} declares attribute {attribute:?} with unknown kind {kind:?}")]
    UnknownKind {
        /// The declared type name.
        type_name: String,
        /// The attribute with the unknown kind.
        attribute: String,
        /// The unrecognized kind name.
        kind: String,
    },

    /// An attribute value cannot be converted to its declared kind.
    #[error("invalid value for attribute {attribute:?}: {message}")]
    InvalidValue {
        /// The attribute being set.
        attribute: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A data payload is not valid base64.
    #[error("invalid data payload {name:?}: {message}")]
    InvalidData {
        /// The payload name.
        name: String,
        /// Why the payload was rejected.
        message: String,
    },

    /// A relation entry names an undefined relation kind.
    #[error("unknown relation kind {0:?}")]
    UnknownRelation(String),

    /// A relation endpoint does not resolve to an entity.
    #[error("unresolved reference {0:?}")]
    UnresolvedReference(String),

    /// A core validation error occurred.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A graph operation failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Render a value in its JSON form: native for strings, numbers, and
/// booleans, canonical text for calendar kinds.
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map_or_else(|| serde_json::Value::String(value.to_text()), serde_json::Value::Number),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Date(_) | Value::Time(_) | Value::DateTime(_) => {
            serde_json::Value::String(value.to_text())
        }
    }
}

/// Convert a JSON value to the declared kind.
fn json_to_value(
    attribute: &str,
    kind: ValueKind,
    json: &serde_json::Value,
) -> Result<Value, ImportError> {
    let invalid = |message: String| ImportError::InvalidValue {
        attribute: attribute.to_owned(),
        message,
    };

    match json {
        serde_json::Value::String(text) => {
            Value::from_text(kind, text).map_err(|e| invalid(e.to_string()))
        }
        serde_json::Value::Number(n) => match kind {
            ValueKind::Integer => n
                .as_i64()
                .map(Value::from)
                .ok_or_else(|| invalid(format!("{n} is not an integer"))),
            ValueKind::Float => n
                .as_f64()
                .map(Value::from)
                .ok_or_else(|| invalid(format!("{n} is not a float"))),
            other => Err(invalid(format!("number given for {other} attribute"))),
        },
        serde_json::Value::Bool(b) if kind == ValueKind::Boolean => Ok(Value::from(*b)),
        other => Err(invalid(format!("unsupported JSON value {other} for {kind} attribute"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_values_round_trip_by_kind() {
        let value = Value::from(42i64);
        let json = value_to_json(&value);
        assert_eq!(json_to_value("n", ValueKind::Integer, &json).expect("int"), value);

        let value = Value::from(true);
        let json = value_to_json(&value);
        assert_eq!(json_to_value("b", ValueKind::Boolean, &json).expect("bool"), value);

        // Calendar kinds travel as canonical text.
        let value = Value::from_text(ValueKind::Date, "2009-07-23").expect("date");
        let json = value_to_json(&value);
        assert_eq!(json, serde_json::Value::String("2009-07-23".to_owned()));
        assert_eq!(json_to_value("d", ValueKind::Date, &json).expect("date"), value);
    }

    #[test]
    fn mismatched_json_values_are_rejected() {
        let err = json_to_value("rt", ValueKind::Integer, &serde_json::Value::Bool(true))
            .expect_err("bool for integer");
        assert!(matches!(err, ImportError::InvalidValue { .. }));

        let err = json_to_value("rt", ValueKind::Integer, &serde_json::json!(1.5))
            .expect_err("float for integer");
        assert!(matches!(err, ImportError::InvalidValue { .. }));
    }

    #[test]
    fn document_parses_with_missing_sections() {
        let doc: Document = serde_json::from_str("{}").expect("empty document");
        assert!(doc.types.is_empty());
        assert!(doc.objects.is_empty());
        assert!(doc.relations.is_empty());
    }
}
