//! Main database interface.
//!
//! This module provides the [`Database`] struct, the primary entry point
//! for working with an `ArborDB` database.
//!
//! # Examples
//!
//! Open a database and store a typed entity:
//!
//! ```
//! use arbordb::{Database, Entity, ValueKind};
//!
//! # fn main() -> arbordb::Result<()> {
//! let db = Database::in_memory()?;
//!
//! let observer = db.register_type("Observer", &[
//!     ("name", ValueKind::String),
//!     ("handedness", ValueKind::String),
//! ])?;
//!
//! let mut alice = Entity::new(observer);
//! alice.set_attribute("name", "Alice")?;
//! let id = db.insert(&mut alice)?;
//!
//! assert!(db.get(id)?.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! Group multiple steps into one unit of work:
//!
//! ```
//! use arbordb::{Database, Entity, ValueKind};
//!
//! # fn main() -> arbordb::Result<()> {
//! let db = Database::in_memory()?;
//! let trial = db.register_type("Trial", &[("rt", ValueKind::Integer)])?;
//!
//! let mut tx = db.begin()?;
//! let mut a = Entity::new(trial.clone());
//! let mut b = Entity::new(trial);
//! let parent = tx.insert(&mut a)?;
//! let child = tx.insert(&mut b)?;
//! tx.set_parent(child, parent, false)?;
//! tx.commit()?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use arbordb_core::{Entity, EntityId, EntityType, Value, ValueKind};
use arbordb_graph::store::{Attachment, DataInfo, DataRecord};
use arbordb_query::{Filter, TypeSpec};
use arbordb_storage::backends::{RedbConfig, RedbEngine};
use arbordb_storage::StorageEngine;
use tracing::info;

use crate::config::{Config, DatabaseBuilder};
use crate::error::{Error, Result};
use crate::io::{ExportReport, ImportReport};
use crate::transaction::{DatabaseTransaction, TransactionManager};

/// Transaction handle type produced by [`Database::begin`] and
/// [`Database::begin_read`].
pub type Tx<'a> = DatabaseTransaction<<RedbEngine as StorageEngine>::Transaction<'a>>;

/// The main `ArborDB` database handle.
///
/// Every convenience method wraps one unit of work; use
/// [`begin`](Self::begin) for multi-step atomic sequences.
///
/// `Database` is `Send + Sync`; read transactions run concurrently while
/// write transactions serialize at the storage layer.
#[derive(Debug)]
pub struct Database {
    /// The transaction manager over the storage engine.
    manager: TransactionManager<RedbEngine>,
    /// The configuration used to open this database.
    config: Config,
}

impl Database {
    /// Open or create a database at the given path with default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the database cannot be opened or
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        DatabaseBuilder::new().path(path).open()
    }

    /// Open or create an in-memory database, lost when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        DatabaseBuilder::in_memory().open()
    }

    /// A builder for opening a database with custom options.
    #[must_use]
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Open a database with the given configuration.
    ///
    /// Typically called through [`DatabaseBuilder::open`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the database cannot be opened.
    pub fn open_with_config(config: Config) -> Result<Self> {
        let engine = if config.in_memory {
            RedbEngine::in_memory().map_err(|e| Error::Open(e.to_string()))?
        } else {
            let mut redb_config = RedbConfig::new();
            if let Some(cache_size) = config.cache_size {
                redb_config = redb_config.cache_size(cache_size);
            }
            RedbEngine::open_with_config(&config.path, redb_config)
                .map_err(|e| Error::Open(e.to_string()))?
        };

        info!(
            path = %config.path.display(),
            in_memory = config.in_memory,
            "opened database"
        );

        Ok(Self { manager: TransactionManager::new(engine), config })
    }

    /// The configuration this database was opened with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Begin a read-write transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage engine cannot start a transaction.
    pub fn begin(&self) -> Result<Tx<'_>> {
        Ok(self.manager.begin_write()?)
    }

    /// Begin a read-only transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage engine cannot start a transaction.
    pub fn begin_read(&self) -> Result<Tx<'_>> {
        Ok(self.manager.begin_read()?)
    }

    /// Run a closure inside one write transaction, committing on success.
    fn with_write<R>(&self, f: impl FnOnce(&mut Tx<'_>) -> Result<R>) -> Result<R> {
        let mut tx = self.begin()?;
        let result = f(&mut tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Run a closure inside one read transaction.
    fn with_read<R>(&self, f: impl FnOnce(&Tx<'_>) -> Result<R>) -> Result<R> {
        let tx = self.begin_read()?;
        f(&tx)
    }

    // ========================================================================
    // Type Registry
    // ========================================================================

    /// Declare and register an entity type.
    pub fn register_type(
        &self,
        name: &str,
        attributes: &[(&str, ValueKind)],
    ) -> Result<EntityType> {
        self.with_write(|tx| tx.register_type(name, attributes))
    }

    /// Resolve a registered type by identity name, declared name, or
    /// unique prefix.
    pub fn entity_type(&self, name: &str) -> Result<EntityType> {
        self.with_read(|tx| tx.entity_type(name))
    }

    /// All registered entity types.
    pub fn entity_types(&self) -> Result<Vec<EntityType>> {
        self.with_read(|tx| tx.entity_types())
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Insert a new entity, assigning and returning its storage id.
    pub fn insert(&self, entity: &mut Entity) -> Result<EntityId> {
        self.with_write(|tx| tx.insert(entity))
    }

    /// Update a saved entity's record.
    pub fn update(&self, entity: &Entity) -> Result<()> {
        self.with_write(|tx| tx.update(entity))
    }

    /// Get an entity by storage id.
    pub fn get(&self, id: EntityId) -> Result<Option<Entity>> {
        self.with_read(|tx| tx.get(id))
    }

    /// Get an entity by its unique id.
    pub fn get_by_unique_id(&self, unique_id: &str) -> Result<Option<Entity>> {
        self.with_read(|tx| tx.get_by_unique_id(unique_id))
    }

    /// Delete an entity. Children become roots; attached entities are
    /// preserved. Returns `false` if it did not exist.
    pub fn delete(&self, id: EntityId) -> Result<bool> {
        self.with_write(|tx| tx.delete(id))
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Make `parent` the parent of `child`. With `force`, an existing
    /// parent link is replaced.
    pub fn set_parent(&self, child: EntityId, parent: EntityId, force: bool) -> Result<()> {
        self.with_write(|tx| tx.set_parent(child, parent, force))
    }

    /// Remove `child`'s parent link. Returns `false` if it had no parent.
    pub fn remove_parent(&self, child: EntityId) -> Result<bool> {
        self.with_write(|tx| tx.remove_parent(child))
    }

    /// The parent of `child`, if any.
    pub fn parent(&self, child: EntityId) -> Result<Option<EntityId>> {
        self.with_read(|tx| tx.parent(child))
    }

    /// The direct children of `parent`, in ascending id order.
    pub fn children(&self, parent: EntityId) -> Result<Vec<EntityId>> {
        self.with_read(|tx| tx.children(parent))
    }

    // ========================================================================
    // Context Attachments
    // ========================================================================

    /// Attach `target` to `holder` under `label`.
    pub fn attach(&self, holder: EntityId, label: &str, target: EntityId) -> Result<()> {
        self.with_write(|tx| tx.attach(holder, label, target))
    }

    /// Remove one attachment triple. Returns `false` if it did not exist.
    pub fn detach(&self, holder: EntityId, label: &str, target: EntityId) -> Result<bool> {
        self.with_write(|tx| tx.detach(holder, label, target))
    }

    /// Remove every attachment of `holder` under `label`, returning how
    /// many were removed.
    pub fn detach_label(&self, holder: EntityId, label: &str) -> Result<usize> {
        self.with_write(|tx| tx.detach_label(holder, label))
    }

    /// All attachments held by `holder`.
    pub fn attachments(&self, holder: EntityId) -> Result<Vec<Attachment>> {
        self.with_read(|tx| tx.attachments(holder))
    }

    /// All attachments in which `target` is the attached entity.
    pub fn holders(&self, target: EntityId) -> Result<Vec<Attachment>> {
        self.with_read(|tx| tx.holders(target))
    }

    /// The distinct labels under which `holder` holds attachments.
    pub fn labels(&self, holder: EntityId) -> Result<Vec<String>> {
        self.with_read(|tx| tx.labels(holder))
    }

    /// The attachment partners of `entity` in both directions,
    /// deduplicated.
    pub fn related(&self, entity: EntityId) -> Result<Vec<EntityId>> {
        self.with_read(|tx| tx.related(entity))
    }

    // ========================================================================
    // Data Payloads
    // ========================================================================

    /// Store a named binary payload on `entity`, replacing any previous
    /// payload under the same name.
    pub fn put_data(
        &self,
        entity: EntityId,
        name: &str,
        mimetype: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<()> {
        self.with_write(|tx| tx.put_data(entity, name, mimetype, bytes))
    }

    /// Get a payload by name.
    pub fn get_data(&self, entity: EntityId, name: &str) -> Result<Option<DataRecord>> {
        self.with_read(|tx| tx.get_data(entity, name))
    }

    /// Summary of a payload, without its bytes.
    pub fn data_info(&self, entity: EntityId, name: &str) -> Result<Option<DataInfo>> {
        self.with_read(|tx| tx.data_info(entity, name))
    }

    /// Summaries of every payload on `entity`.
    pub fn list_data(&self, entity: EntityId) -> Result<Vec<DataInfo>> {
        self.with_read(|tx| tx.list_data(entity))
    }

    /// Delete a payload by name. Returns `false` if it did not exist.
    pub fn delete_data(&self, entity: EntityId, name: &str) -> Result<bool> {
        self.with_write(|tx| tx.delete_data(entity, name))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Find entities of a type satisfying every filter, in ascending id
    /// order.
    pub fn find(&self, spec: impl Into<TypeSpec>, filters: &[Filter]) -> Result<Vec<Entity>> {
        self.with_read(|tx| tx.find(spec, filters))
    }

    /// All entities of a type.
    pub fn find_all(&self, spec: impl Into<TypeSpec>) -> Result<Vec<Entity>> {
        self.with_read(|tx| tx.find_all(spec))
    }

    /// Find exactly one matching entity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when nothing matches and
    /// [`Error::AmbiguousResult`] when more than one entity does.
    pub fn find_one(&self, spec: impl Into<TypeSpec>, filters: &[Filter]) -> Result<Entity> {
        self.with_read(|tx| tx.find_one(spec, filters))
    }

    /// Find matching entities that have no parent.
    pub fn find_roots(&self, spec: impl Into<TypeSpec>, filters: &[Filter]) -> Result<Vec<Entity>> {
        self.with_read(|tx| tx.find_roots(spec, filters))
    }

    /// Count entities of a type satisfying every filter.
    pub fn count(&self, spec: impl Into<TypeSpec>, filters: &[Filter]) -> Result<usize> {
        self.with_read(|tx| tx.count(spec, filters))
    }

    // ========================================================================
    // Rebranding
    // ========================================================================

    /// Migrate every entity of `source` to `target` in one unit of work,
    /// returning the number of migrated entities. Any failure rolls the
    /// whole migration back.
    pub fn rebrand(&self, source: &EntityType, target: &EntityType) -> Result<usize> {
        self.with_write(|tx| tx.rebrand(source, target))
    }

    /// Migrate every entity of `source` to `target`, passing each entity
    /// and its attribute map through `transform`, in one unit of work.
    pub fn rebrand_with<F>(
        &self,
        source: &EntityType,
        target: &EntityType,
        transform: F,
    ) -> Result<usize>
    where
        F: Fn(&Entity, BTreeMap<String, Value>) -> BTreeMap<String, Value>,
    {
        self.with_write(|tx| tx.rebrand_with(source, target, transform))
    }

    // ========================================================================
    // Import / Export
    // ========================================================================

    /// Export the whole database as a JSON tree document.
    pub fn export_json<W: Write>(&self, writer: W) -> Result<ExportReport> {
        self.with_read(|tx| tx.export_json(writer))
    }

    /// Import a JSON tree document in one unit of work.
    pub fn import_json<R: Read>(&self, reader: R) -> Result<ImportReport> {
        self.with_write(|tx| tx.import_json(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_reports_open_errors() {
        let err = Database::open("/nonexistent-dir/sub/db.arbor").expect_err("bad path");
        assert!(matches!(err, Error::Open(_)));
    }

    #[test]
    fn convenience_methods_commit_their_work() {
        let db = Database::in_memory().expect("db");
        let observer = db
            .register_type("Observer", &[("name", ValueKind::String)])
            .expect("register");

        let mut entity = Entity::new(observer);
        entity.set_attribute("name", "Alice").expect("valid");
        let id = db.insert(&mut entity).expect("insert");

        // A later, separate transaction sees the committed entity.
        let loaded = db.get(id).expect("get").expect("present");
        assert_eq!(loaded.attribute("name"), Some(&Value::from("Alice")));
    }
}
