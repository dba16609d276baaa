//! `ArborDB` Storage
//!
//! This crate provides the storage engine abstraction and backend
//! implementations for `ArborDB`.
//!
//! # Overview
//!
//! The storage layer provides a transactional key-value interface that
//! backends implement. Higher layers build the entity graph on top of it
//! without depending on a concrete backend.
//!
//! # Core Traits
//!
//! - [`StorageEngine`] - The main entry point for storage operations
//! - [`Transaction`] - ACID transaction support with read/write operations
//! - [`Cursor`] - Ordered iteration over key-value pairs
//!
//! # Example
//!
//! ```ignore
//! use arbordb_storage::{StorageEngine, Transaction};
//! use arbordb_storage::backends::RedbEngine;
//!
//! let engine = RedbEngine::open("graph.arbor")?;
//!
//! let mut tx = engine.begin_write()?;
//! tx.put("entities", b"entity:1", b"Alice")?;
//! tx.commit()?;
//!
//! let tx = engine.begin_read()?;
//! assert_eq!(tx.get("entities", b"entity:1")?, Some(b"Alice".to_vec()));
//! ```
//!
//! # Modules
//!
//! - [`engine`] - Storage engine traits and abstractions
//! - [`backends`] - Concrete storage backend implementations

#![deny(clippy::unwrap_used)]

pub mod backends;
pub mod engine;

pub use engine::{
    Cursor, CursorResult, KeyValue, StorageEngine, StorageError, StorageResult, Transaction,
};
