//! Error types for the core crate.

use thiserror::Error;

use crate::types::Value;

/// Errors that can occur in the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A validation error occurred (malformed name token, unparseable text,
    /// out-of-range value).
    #[error("validation error: {0}")]
    Validation(String),

    /// A value's kind does not match the declared kind of the attribute.
    #[error("type mismatch: expected {expected}, got {actual}{}", value_suffix(.value))]
    TypeMismatch {
        /// The declared kind.
        expected: String,
        /// The kind of the offending value.
        actual: String,
        /// Canonical text of the offending value, when available.
        value: Option<String>,
    },

    /// An attribute is not declared for the entity's type.
    #[error("unknown attribute {attribute:?} for entity type {type_name:?}")]
    UnknownAttribute {
        /// The declared name of the entity type.
        type_name: String,
        /// The undeclared attribute.
        attribute: String,
    },

    /// An encoding or decoding error occurred.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl CoreError {
    /// Build a [`CoreError::TypeMismatch`] without the value rendering.
    #[must_use]
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch { expected: expected.into(), actual: actual.into(), value: None }
    }

    /// Build a [`CoreError::TypeMismatch`] carrying the offending value's
    /// canonical text.
    #[must_use]
    pub fn type_mismatch_with_value(
        expected: impl Into<String>,
        actual: impl Into<String>,
        value: &Value,
    ) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
            value: Some(value.to_text()),
        }
    }

    /// Build a [`CoreError::UnknownAttribute`].
    #[must_use]
    pub fn unknown_attribute(type_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::UnknownAttribute { type_name: type_name.into(), attribute: attribute.into() }
    }
}

fn value_suffix(value: &Option<String>) -> String {
    value.as_ref().map(|v| format!(" (value: {v})")).unwrap_or_default()
}
