//! `ArborDB` - An Embedded Entity Graph with Typed Schemas
//!
//! ArborDB stores schema-validated entities in a single-parent hierarchy
//! with labeled cross-links, and answers structured queries over both the
//! attributes and the surrounding graph.
//!
//! # Features
//!
//! - **Typed attributes**: entity types declare `(attribute, kind)`
//!   schemas; every assignment is validated at the boundary
//! - **Hierarchy and context**: one optional parent per entity, plus any
//!   number of labeled attachments between entities
//! - **Structured queries**: a closed filter grammar with attribute,
//!   relational, and disjunctive clauses, evaluated recursively
//! - **Rebranding**: all-or-nothing schema migrations between compatible
//!   type declarations
//! - **ACID units of work**: every operation runs inside a transaction
//!   that rolls back on drop
//!
//! # Quick Start
//!
//! ```
//! use arbordb::{Database, Entity, Filter, ValueKind};
//!
//! # fn main() -> arbordb::Result<()> {
//! let db = Database::in_memory()?;
//!
//! let trial = db.register_type("Trial", &[
//!     ("rt", ValueKind::Integer),
//!     ("response", ValueKind::String),
//! ])?;
//!
//! let mut entity = Entity::new(trial);
//! entity.set_attribute("rt", 3i64)?;
//! entity.set_attribute("response", "left")?;
//! db.insert(&mut entity)?;
//!
//! let slow = db.find("Trial", &[Filter::greater_than("rt", 2i64)])?;
//! assert_eq!(slow.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Database configuration and builder
//! - [`database`] - Main database interface
//! - [`error`] - Error types
//! - [`io`] - JSON tree import and export
//! - [`rebrand`] - Schema migration
//! - [`transaction`] - Transaction management

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

// Re-export core types
pub use arbordb_core::{
    CoreError, Entity, EntityId, EntityType, Schema, TypeId, Value, ValueKind,
};

// Re-export graph types
pub use arbordb_graph::store::{Attachment, DataInfo, DataRecord, GraphError};

// Re-export query types
pub use arbordb_query::{
    Compare, EntityRef, Filter, FilterError, Predicate, SubSpec, Target, TypeSpec,
};

// Re-export storage types
pub use arbordb_storage::{StorageEngine, Transaction};

// Modules
pub mod config;
pub mod database;
pub mod error;
pub mod io;
pub mod rebrand;
pub mod transaction;

// Public API re-exports
pub use config::{Config, DatabaseBuilder};
pub use database::{Database, Tx};
pub use error::{Error, Result};
pub use io::{ExportReport, ImportError, ImportReport};
pub use rebrand::RebrandError;
pub use transaction::{DatabaseTransaction, TransactionError, TransactionManager};
