//! Redb storage engine implementation.
//!
//! The engine maps the logical-table model onto a single physical redb
//! table (see [`super::tables`]); opening a database initializes that
//! table so the first read transaction sees an empty store instead of a
//! missing one.

use std::path::{Path, PathBuf};

use redb::{Database, ReadableDatabase};

use crate::engine::{StorageEngine, StorageError};

use super::tables::DATA_TABLE;
use super::transaction::RedbTransaction;

/// File extension applied to database paths that carry none.
pub const FILE_EXTENSION: &str = "arbor";

/// Configuration options for the Redb storage engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedbConfig {
    /// Cache size in bytes. Unset uses Redb's default.
    pub cache_size: Option<usize>,
}

impl RedbConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache size.
    #[must_use]
    pub const fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = Some(size);
        self
    }
}

/// A storage engine backed by Redb, a pure-Rust embedded database with ACID
/// transactions.
///
/// Every logical table lives in one physical redb table under prefixed
/// keys, so a fresh database is fully initialized by a single table
/// creation at open time.
///
/// # Example
///
/// ```ignore
/// use arbordb_storage::backends::RedbEngine;
/// use arbordb_storage::{StorageEngine, Transaction};
///
/// // "graph" opens (or creates) graph.arbor.
/// let engine = RedbEngine::open("graph")?;
/// let mut tx = engine.begin_write()?;
/// tx.put("entities", b"key", b"value")?;
/// tx.commit()?;
/// ```
#[derive(Debug)]
pub struct RedbEngine {
    db: Database,
}

impl RedbEngine {
    /// Open or create a database at the given path with default
    /// configuration. Paths without an extension get `.arbor` appended.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the database cannot be opened or
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open_with_config(path, RedbConfig::default())
    }

    /// Open or create a database at the given path with custom
    /// configuration. Paths without an extension get `.arbor` appended.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the database cannot be opened or
    /// created.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: RedbConfig,
    ) -> Result<Self, StorageError> {
        let mut builder = Database::builder();

        if let Some(cache_size) = config.cache_size {
            builder.set_cache_size(cache_size);
        }

        let db = builder
            .create(Self::resolve_path(path.as_ref()))
            .map_err(|e| StorageError::Open(e.to_string()))?;
        Self::ensure_data_table(&db)?;

        Ok(Self { db })
    }

    /// Create an in-memory database, lost when the engine is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(|e| StorageError::Open(e.to_string()))?;
        Self::ensure_data_table(&db)?;

        Ok(Self { db })
    }

    /// Apply the `.arbor` extension convention to a database path.
    fn resolve_path(path: &Path) -> PathBuf {
        if path.extension().is_some() {
            path.to_path_buf()
        } else {
            path.with_extension(FILE_EXTENSION)
        }
    }

    /// Create the physical data table if this database never had one, so
    /// readers of a fresh file find an empty store rather than a missing
    /// table.
    fn ensure_data_table(db: &Database) -> Result<(), StorageError> {
        let tx = db.begin_write().map_err(|e| StorageError::Open(e.to_string()))?;
        tx.open_table(DATA_TABLE).map(drop).map_err(|e| StorageError::Open(e.to_string()))?;
        tx.commit().map_err(|e| StorageError::Open(e.to_string()))?;
        Ok(())
    }

    /// Get the underlying Redb database, for advanced use and testing.
    #[must_use]
    pub const fn inner(&self) -> &Database {
        &self.db
    }
}

impl StorageEngine for RedbEngine {
    type Transaction<'a> = RedbTransaction;

    fn begin_read(&self) -> Result<Self::Transaction<'_>, StorageError> {
        let tx = self.db.begin_read().map_err(|e| StorageError::Transaction(e.to_string()))?;
        Ok(RedbTransaction::new_read(tx))
    }

    fn begin_write(&self) -> Result<Self::Transaction<'_>, StorageError> {
        let tx = self.db.begin_write().map_err(|e| StorageError::Transaction(e.to_string()))?;
        Ok(RedbTransaction::new_write(tx))
    }

    fn flush(&self) -> Result<(), StorageError> {
        // Redb commits are durable; nothing extra to flush.
        Ok(())
    }
}
