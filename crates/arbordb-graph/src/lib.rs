//! Entity graph layer for ArborDB.
//!
//! This crate provides transactional storage for the entity graph: typed
//! entity records, the single-parent containment tree, labeled cross-cutting
//! attachments, and named binary payloads. All operations are expressed over
//! the storage transaction traits, so they compose into larger atomic units
//! at the database layer.
//!
//! # Architecture
//!
//! The [`store`] module contains stateless operation groups, each generic
//! over a [`Transaction`](arbordb_storage::Transaction):
//!
//! - [`TypeStore`] - registered entity types and name resolution
//! - [`EntityStore`] - entity CRUD plus unique-id and type indexes
//! - [`HierarchyStore`] - the containment tree
//! - [`ContextStore`] - labeled attachments
//! - [`DataStore`] - binary payloads
//!
//! # Example
//!
//! ```
//! use arbordb_core::{Entity, EntityType, Schema, ValueKind};
//! use arbordb_graph::store::{EntityStore, HierarchyStore};
//! use arbordb_storage::backends::RedbEngine;
//! use arbordb_storage::{StorageEngine, Transaction};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = RedbEngine::in_memory()?;
//! let mut tx = engine.begin_write()?;
//!
//! let session = EntityType::new(
//!     "Session",
//!     Schema::new().with_attribute("count", ValueKind::Integer),
//! )?;
//! let mut parent = Entity::new(session.clone());
//! let mut child = Entity::new(session).with_attribute("count", 3i64)?;
//!
//! let parent_id = EntityStore::insert(&mut tx, &mut parent)?;
//! let child_id = EntityStore::insert(&mut tx, &mut child)?;
//! HierarchyStore::set_parent(&mut tx, child_id, parent_id, false)?;
//! tx.commit()?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]

pub mod store;

pub use store::{
    Attachment, ContextStore, DataInfo, DataRecord, DataStore, EntityStore, GraphError,
    GraphResult, HierarchyStore, TypeStore,
};
