//! `ArborDB` Core
//!
//! This crate provides the fundamental types shared across `ArborDB`: typed
//! entities with schema-validated attributes, registered entity types, and
//! the binary encodings used by the storage layer.
//!
//! # Overview
//!
//! - **Identifiers**: [`EntityId`] for persisted entities, [`TypeId`] for
//!   registered types (derived from the declared schema, not a counter)
//! - **Schemas**: [`Schema`] maps attribute names to [`ValueKind`]s;
//!   [`EntityType`] pairs a declared name with a schema and a durable
//!   identity
//! - **Entities**: [`Entity`] carries a validated attribute map plus a
//!   storage id and a globally-unique id
//! - **Values**: [`Value`] covers strings, integers, floats, booleans, and
//!   calendar types, with a canonical text form for each kind
//!
//! # Example
//!
//! ```
//! use arbordb_core::{Entity, EntityType, Schema, Value, ValueKind};
//!
//! let experiment = EntityType::new(
//!     "Experiment",
//!     Schema::new()
//!         .with_attribute("project", ValueKind::String)
//!         .with_attribute("trials", ValueKind::Integer),
//! ).unwrap();
//!
//! let entity = Entity::new(experiment)
//!     .with_attribute("project", "visual search").unwrap()
//!     .with_attribute("trials", 480i64).unwrap();
//!
//! assert_eq!(entity.attribute("project"), Some(&Value::from("visual search")));
//! // Values must match the declared kind.
//! assert!(entity.with_attribute("trials", "many").is_err());
//! ```
//!
//! # Modules
//!
//! - [`types`] - Core data types ([`Entity`], [`EntityType`], [`Value`], IDs)
//! - [`encoding`] - Serialization and key encoding utilities
//! - [`error`] - Error types ([`CoreError`])

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod encoding;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::CoreError;
pub use types::{Entity, EntityId, EntityType, Schema, TypeId, Value, ValueKind};
