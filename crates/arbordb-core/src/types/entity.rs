//! Entity (node) type for the graph.
//!
//! This module provides the [`Entity`] type: a typed record carrying a
//! schema-validated attribute map. Parent/child edges and labeled context
//! attachments live in the graph stores, keyed by [`EntityId`], not inside
//! the struct.
//!
//! # Example
//!
//! ```
//! use arbordb_core::{Entity, EntityType, Schema, Value, ValueKind};
//!
//! let trial = EntityType::new(
//!     "Trial",
//!     Schema::new()
//!         .with_attribute("rt", ValueKind::Integer)
//!         .with_attribute("response", ValueKind::String),
//! ).unwrap();
//!
//! let mut entity = Entity::new(trial)
//!     .with_attribute("rt", 120i64)
//!     .unwrap();
//! entity.set_attribute("response", "left").unwrap();
//!
//! assert_eq!(entity.attribute("rt"), Some(&Value::Int(120)));
//! // Undeclared attributes and wrong kinds are rejected at the boundary.
//! assert!(entity.set_attribute("wavelength", 400i64).is_err());
//! assert!(entity.set_attribute("rt", 1.5f64).is_err());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::{EntityId, EntityType, Value};

/// A typed entity record.
///
/// Entities carry:
/// - an optional [`EntityId`], assigned by the store on first save;
/// - a globally-unique identifier (UUID v4) assigned at creation,
///   independent of storage;
/// - an embedded copy of the registered [`EntityType`];
/// - an attribute map validated against the type's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Storage identifier, `None` until first saved.
    pub id: Option<EntityId>,
    /// Globally-unique identifier, assigned at creation.
    pub unique_id: String,
    /// The registered type of this entity.
    entity_type: EntityType,
    /// Attribute values, validated against the type's schema.
    attributes: BTreeMap<String, Value>,
}

impl Entity {
    /// Create a new, unsaved entity of the given type.
    #[must_use]
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            id: None,
            unique_id: Uuid::new_v4().to_string(),
            entity_type,
            attributes: BTreeMap::new(),
        }
    }

    /// Reconstruct an entity from its stored parts, bypassing fresh
    /// unique-id assignment. Attribute values must already be valid.
    #[must_use]
    pub fn from_parts(
        id: Option<EntityId>,
        unique_id: impl Into<String>,
        entity_type: EntityType,
        attributes: BTreeMap<String, Value>,
    ) -> Self {
        Self { id, unique_id: unique_id.into(), entity_type, attributes }
    }

    /// The registered type of this entity.
    #[must_use]
    pub const fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// The declared name of this entity's type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.entity_type.name()
    }

    /// Set an attribute, builder style.
    ///
    /// # Errors
    ///
    /// Same conditions as [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, CoreError> {
        self.set_attribute(name, value)?;
        Ok(self)
    }

    /// Set an attribute value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownAttribute`] if the attribute is not
    /// declared for this entity's type, and [`CoreError::TypeMismatch`] if
    /// the value's kind differs from the declared kind.
    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), CoreError> {
        let name = name.into();
        let value = value.into();
        let Some(kind) = self.entity_type.schema().kind_of(&name) else {
            return Err(CoreError::unknown_attribute(self.entity_type.name(), name));
        };
        kind.check(&value)?;
        self.attributes.insert(name, value);
        Ok(())
    }

    /// Set an attribute from its canonical text form, coercing through the
    /// declared kind.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownAttribute`] for an undeclared attribute
    /// and [`CoreError::Validation`] if the text does not parse as the
    /// declared kind.
    pub fn set_attribute_text(
        &mut self,
        name: impl Into<String>,
        text: &str,
    ) -> Result<(), CoreError> {
        let name = name.into();
        let Some(kind) = self.entity_type.schema().kind_of(&name) else {
            return Err(CoreError::unknown_attribute(self.entity_type.name(), name));
        };
        let value = Value::from_text(kind, text)?;
        self.attributes.insert(name, value);
        Ok(())
    }

    /// Get an attribute value.
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Remove an attribute value, returning it if it was set.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// The set attributes, in name order.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Replace the type and attribute map in one step, preserving identity.
    ///
    /// Used by schema migration; every value must already be valid under
    /// the new type's schema.
    pub(crate) fn replace_type(
        &mut self,
        entity_type: EntityType,
        attributes: BTreeMap<String, Value>,
    ) {
        self.entity_type = entity_type;
        self.attributes = attributes;
    }

    /// Rebuild this entity under a new type, validating every attribute.
    ///
    /// Identity (`id`, `unique_id`) is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownAttribute`] or [`CoreError::TypeMismatch`]
    /// if an attribute is not valid under the new type's schema.
    pub fn retyped(
        &self,
        entity_type: EntityType,
        attributes: BTreeMap<String, Value>,
    ) -> Result<Self, CoreError> {
        for (name, value) in &attributes {
            let Some(kind) = entity_type.schema().kind_of(name) else {
                return Err(CoreError::unknown_attribute(entity_type.name(), name.clone()));
            };
            kind.check(value)?;
        }
        let mut entity = self.clone();
        entity.replace_type(entity_type, attributes);
        Ok(entity)
    }
}
