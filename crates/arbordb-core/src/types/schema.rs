//! Declared attribute schemas and entity type identity.
//!
//! An [`EntityType`] is a declared name plus a [`Schema`] mapping attribute
//! names to value kinds. Type identity is derived deterministically from the
//! name and the sorted attribute map, so re-declaring an identical schema
//! resolves to the same type while a changed schema produces a distinct one.
//!
//! # Example
//!
//! ```
//! use arbordb_core::{EntityType, Schema, ValueKind};
//!
//! let experiment = EntityType::new(
//!     "Experiment",
//!     Schema::new()
//!         .with_attribute("project", ValueKind::String)
//!         .with_attribute("start", ValueKind::Date),
//! ).unwrap();
//!
//! assert_eq!(experiment.name(), "Experiment");
//! assert_eq!(experiment.schema().kind_of("project"), Some(ValueKind::String));
//!
//! // Identical declarations hash to the same identity.
//! let again = EntityType::new("Experiment", experiment.schema().clone()).unwrap();
//! assert_eq!(experiment.id(), again.id());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::encoding::keys::hash_str;
use crate::error::CoreError;
use crate::types::{TypeId, ValueKind};

/// Check that a declared name (type name or attribute name) is a valid token.
///
/// Tokens must be non-empty, ASCII alphanumeric or underscore, must not start
/// with a digit, and must not start with `_` (reserved for query markers).
///
/// # Errors
///
/// Returns [`CoreError::Validation`] for malformed tokens.
pub fn validate_name_token(name: &str) -> Result<(), CoreError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(CoreError::Validation("name token must not be empty".to_owned()));
    };
    if first == '_' {
        return Err(CoreError::Validation(format!(
            "name token {name:?} must not start with an underscore"
        )));
    }
    if first.is_ascii_digit() {
        return Err(CoreError::Validation(format!("name token {name:?} must not start with a digit")));
    }
    if !first.is_ascii_alphanumeric()
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(CoreError::Validation(format!(
            "name token {name:?} may only contain ASCII letters, digits, and underscores"
        )));
    }
    Ok(())
}

/// A declared attribute map: attribute name to value kind, sorted by name.
///
/// Schemas are value objects; equality is structural. The sorted order makes
/// the canonical rendering (and thus the derived type identity) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema(BTreeMap<String, ValueKind>);

impl Schema {
    /// Create an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute declaration, builder style.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.0.insert(name.into(), kind);
        self
    }

    /// The declared kind of an attribute, if declared.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<ValueKind> {
        self.0.get(name).copied()
    }

    /// Whether the attribute is declared.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of declared attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the schema declares no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, kind)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueKind)> {
        self.0.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Whether every `(name, kind)` pair of `other` is also declared here.
    #[must_use]
    pub fn is_superset_of(&self, other: &Self) -> bool {
        other.iter().all(|(name, kind)| self.kind_of(name) == Some(kind))
    }

    /// The canonical rendering used for identity hashing:
    /// `name:kind` pairs in name order, comma separated.
    #[must_use]
    pub fn canonical(&self) -> String {
        let pairs: Vec<String> =
            self.iter().map(|(name, kind)| format!("{name}:{kind}")).collect();
        pairs.join(",")
    }
}

impl FromIterator<(String, ValueKind)> for Schema {
    fn from_iter<I: IntoIterator<Item = (String, ValueKind)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A registered entity type: declared name, schema, and derived identity.
///
/// Two types with the same declared name but different schemas are distinct
/// and coexist; the identity name `"<name>_<16-hex-hash>"` disambiguates
/// them durably.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    name: String,
    schema: Schema,
    id: TypeId,
}

impl EntityType {
    /// Declare an entity type.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the type name or any attribute
    /// name is not a valid token.
    pub fn new(name: impl Into<String>, schema: Schema) -> Result<Self, CoreError> {
        let name = name.into();
        validate_name_token(&name)?;
        for (attribute, _) in schema.iter() {
            validate_name_token(attribute)?;
        }
        let id = derive_type_id(&name, &schema);
        Ok(Self { name, schema, id })
    }

    /// The declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared schema.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The derived type identity.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// The durable identity name, `"<name>_<16-hex-hash>"`.
    #[must_use]
    pub fn identity_name(&self) -> String {
        format!("{}_{}", self.name, self.id)
    }

    /// Whether a direct migration between `self` and `other` is permitted:
    /// one schema's declared `(name, kind)` set must contain the other's.
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.schema.is_superset_of(&other.schema) || other.schema.is_superset_of(&self.schema)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity_name())
    }
}

/// Derive the identity of a type from its declared name and sorted schema.
fn derive_type_id(name: &str, schema: &Schema) -> TypeId {
    TypeId::new(hash_str(&format!("{name}|{}", schema.canonical())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial_schema() -> Schema {
        Schema::new()
            .with_attribute("rt", ValueKind::Integer)
            .with_attribute("response", ValueKind::String)
    }

    #[test]
    fn name_tokens() {
        assert!(validate_name_token("Experiment").is_ok());
        assert!(validate_name_token("rt_ms2").is_ok());
        assert!(validate_name_token("").is_err());
        assert!(validate_name_token("_parent").is_err());
        assert!(validate_name_token("2fast").is_err());
        assert!(validate_name_token("with space").is_err());
        assert!(validate_name_token("non-ascii").is_err());
    }

    #[test]
    fn identical_declarations_share_identity() {
        let a = EntityType::new("Trial", trial_schema()).unwrap();
        let b = EntityType::new("Trial", trial_schema()).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.identity_name(), b.identity_name());
    }

    #[test]
    fn changed_schema_changes_identity() {
        let a = EntityType::new("Trial", trial_schema()).unwrap();
        let b = EntityType::new(
            "Trial",
            trial_schema().with_attribute("rt", ValueKind::Float),
        )
        .unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn attribute_order_does_not_matter() {
        let forward = Schema::new()
            .with_attribute("a", ValueKind::Integer)
            .with_attribute("b", ValueKind::String);
        let backward = Schema::new()
            .with_attribute("b", ValueKind::String)
            .with_attribute("a", ValueKind::Integer);
        assert_eq!(
            EntityType::new("T", forward).unwrap().id(),
            EntityType::new("T", backward).unwrap().id()
        );
    }

    #[test]
    fn compatibility_is_superset_or_subset() {
        let base = EntityType::new("E", Schema::new().with_attribute("a", ValueKind::Integer))
            .unwrap();
        let wider = EntityType::new(
            "E",
            Schema::new()
                .with_attribute("a", ValueKind::Integer)
                .with_attribute("b", ValueKind::String),
        )
        .unwrap();
        let disjoint = EntityType::new(
            "E",
            Schema::new()
                .with_attribute("a", ValueKind::Integer)
                .with_attribute("c", ValueKind::Date),
        )
        .unwrap();

        assert!(base.is_compatible_with(&wider));
        assert!(wider.is_compatible_with(&base));
        assert!(!wider.is_compatible_with(&disjoint));
        // Same attribute name with a different kind is not contained.
        let rekinded =
            EntityType::new("E", Schema::new().with_attribute("a", ValueKind::Float)).unwrap();
        assert!(!base.is_compatible_with(&rekinded));
    }

    #[test]
    fn rejects_bad_attribute_names() {
        let schema = Schema::new().with_attribute("_hidden", ValueKind::String);
        assert!(EntityType::new("E", schema).is_err());
    }
}
