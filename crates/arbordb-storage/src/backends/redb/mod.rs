//! Redb storage backend.
//!
//! A storage backend implementation using Redb, a pure-Rust embedded
//! database: ACID transactions, no external server, works wherever Rust
//! does.
//!
//! # Example
//!
//! ```ignore
//! use arbordb_storage::backends::RedbEngine;
//! use arbordb_storage::{StorageEngine, Transaction};
//!
//! let engine = RedbEngine::open("graph.arbor")?;
//!
//! let mut tx = engine.begin_write()?;
//! tx.put("entities", b"entity:1", b"...")?;
//! tx.commit()?;
//!
//! let tx = engine.begin_read()?;
//! let value = tx.get("entities", b"entity:1")?;
//! ```
//!
//! For testing, [`RedbEngine::in_memory`] creates a database that does not
//! persist. [`RedbConfig`] customizes cache and size limits.

mod engine;
pub mod tables;
mod transaction;

pub use engine::{RedbConfig, RedbEngine};
pub use transaction::{RedbCursor, RedbTransaction};
