//! Serialization and key encoding for storage.
//!
//! This module provides traits and implementations for encoding core types
//! to bytes for storage, and for generating ordered keys for range scans.
//!
//! # Encoding traits
//!
//! - [`Encoder`] - serialize types to bytes
//! - [`Decoder`] - deserialize types from bytes
//!
//! Implementations are provided for [`Entity`](crate::types::Entity) and
//! [`EntityType`](crate::types::EntityType); records carry a leading format
//! version byte over a bincode payload.
//!
//! # Key encoding
//!
//! The [`keys`] module provides functions for encoding ordered composite
//! keys that support efficient range scans in key-value storage backends.
//! Numeric components use big-endian encoding to preserve sort order.
//!
//! # Example
//!
//! ```
//! use arbordb_core::encoding::{Encoder, Decoder};
//! use arbordb_core::{Entity, EntityType, Schema, ValueKind};
//!
//! let observer = EntityType::new(
//!     "Observer",
//!     Schema::new().with_attribute("name", ValueKind::String),
//! ).unwrap();
//! let entity = Entity::new(observer).with_attribute("name", "Alice").unwrap();
//!
//! let bytes = entity.encode().unwrap();
//! let decoded = Entity::decode(&bytes).unwrap();
//! assert_eq!(decoded, entity);
//! ```

pub mod keys;
mod record;
mod traits;


pub use traits::{Decoder, Encoder, FORMAT_VERSION};
