//! Database transaction handle.
//!
//! [`DatabaseTransaction`] wraps a storage transaction and exposes every
//! registry, graph, data, query, and migration operation as a method. A
//! handle is consumed by [`commit`](DatabaseTransaction::commit) or
//! [`rollback`](DatabaseTransaction::rollback); dropping an unconsumed
//! handle rolls it back.

use std::io::{Read, Write};

use arbordb_core::{Entity, EntityId, EntityType, Value, ValueKind};
use arbordb_graph::store::{
    Attachment, ContextStore, DataInfo, DataRecord, DataStore, EntityStore, HierarchyStore,
    TypeStore,
};
use arbordb_query::{find_complex, Filter, TypeSpec};
use arbordb_storage::Transaction;
use std::collections::BTreeMap;

use super::error::TransactionError;
use crate::error::{Error, Result};
use crate::io::{self, ExportReport, ImportReport};
use crate::rebrand;

/// A transaction handle over the entity graph.
///
/// All operations run against the wrapped storage transaction; nothing is
/// visible to other transactions until [`commit`](Self::commit).
pub struct DatabaseTransaction<T: Transaction> {
    /// Unique id assigned by the transaction manager.
    tx_id: u64,
    /// The storage transaction, `None` once committed or rolled back.
    storage: Option<T>,
    /// Whether this transaction rejects writes.
    read_only: bool,
}

impl<T: Transaction> DatabaseTransaction<T> {
    /// Create a read-only transaction handle.
    pub(crate) const fn new_read(tx_id: u64, storage: T) -> Self {
        Self { tx_id, storage: Some(storage), read_only: true }
    }

    /// Create a read-write transaction handle.
    pub(crate) const fn new_write(tx_id: u64, storage: T) -> Self {
        Self { tx_id, storage: Some(storage), read_only: false }
    }

    /// This transaction's id.
    #[must_use]
    pub const fn tx_id(&self) -> u64 {
        self.tx_id
    }

    /// Whether this transaction rejects writes.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// The storage transaction, for read access.
    fn storage(&self) -> std::result::Result<&T, TransactionError> {
        self.storage.as_ref().ok_or(TransactionError::AlreadyCompleted)
    }

    /// The storage transaction, for write access.
    fn storage_mut(&mut self) -> std::result::Result<&mut T, TransactionError> {
        if self.read_only {
            return Err(TransactionError::ReadOnly);
        }
        self.storage.as_mut().ok_or(TransactionError::AlreadyCompleted)
    }

    // ========================================================================
    // Type Registry
    // ========================================================================

    /// Declare and register an entity type in one step.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed name or a schema conflict with an
    /// already-registered type of the same name.
    pub fn register_type(
        &mut self,
        name: &str,
        attributes: &[(&str, ValueKind)],
    ) -> Result<EntityType> {
        let storage = self.storage_mut()?;
        Ok(TypeStore::register_type(storage, name, attributes)?)
    }

    /// Register an already-built entity type. Idempotent for an unchanged
    /// declaration.
    ///
    /// # Errors
    ///
    /// Returns an error on a schema conflict with a same-named type.
    pub fn register(&mut self, entity_type: &EntityType) -> Result<()> {
        let storage = self.storage_mut()?;
        Ok(TypeStore::register(storage, entity_type)?)
    }

    /// Resolve a registered type by identity name, declared name, or
    /// unique prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if no type matches or the name is ambiguous.
    pub fn entity_type(&self, name: &str) -> Result<EntityType> {
        let storage = self.storage()?;
        Ok(TypeStore::resolve(storage, name)?)
    }

    /// All registered entity types.
    pub fn entity_types(&self) -> Result<Vec<EntityType>> {
        let storage = self.storage()?;
        Ok(TypeStore::all(storage)?)
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Insert a new entity, assigning and returning its storage id.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity was already saved or its unique id
    /// collides with an existing entity.
    pub fn insert(&mut self, entity: &mut Entity) -> Result<EntityId> {
        let storage = self.storage_mut()?;
        Ok(EntityStore::insert(storage, entity)?)
    }

    /// Update a saved entity's record.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity was never saved or its record no
    /// longer exists.
    pub fn update(&mut self, entity: &Entity) -> Result<()> {
        let storage = self.storage_mut()?;
        Ok(EntityStore::update(storage, entity)?)
    }

    /// Get an entity by storage id.
    pub fn get(&self, id: EntityId) -> Result<Option<Entity>> {
        let storage = self.storage()?;
        Ok(EntityStore::get(storage, id)?)
    }

    /// Get an entity by its unique id.
    pub fn get_by_unique_id(&self, unique_id: &str) -> Result<Option<Entity>> {
        let storage = self.storage()?;
        Ok(EntityStore::get_by_unique_id(storage, unique_id)?)
    }

    /// Delete an entity, detaching its relations and removing its data
    /// payloads. Children become roots. Returns `false` if it did not
    /// exist.
    pub fn delete(&mut self, id: EntityId) -> Result<bool> {
        let storage = self.storage_mut()?;
        Ok(EntityStore::delete(storage, id)?)
    }

    /// Total number of persisted entities.
    pub fn entity_count(&self) -> Result<usize> {
        let storage = self.storage()?;
        Ok(EntityStore::count(storage)?)
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Make `parent` the parent of `child`.
    ///
    /// With `force`, an existing parent link is replaced; without it,
    /// reparenting fails. Links that would close a cycle always fail.
    pub fn set_parent(&mut self, child: EntityId, parent: EntityId, force: bool) -> Result<()> {
        let storage = self.storage_mut()?;
        Ok(HierarchyStore::set_parent(storage, child, parent, force)?)
    }

    /// Remove `child`'s parent link, making it a root. Returns `false` if
    /// it had no parent.
    pub fn remove_parent(&mut self, child: EntityId) -> Result<bool> {
        let storage = self.storage_mut()?;
        Ok(HierarchyStore::remove_parent(storage, child)?)
    }

    /// The parent of `child`, if any.
    pub fn parent(&self, child: EntityId) -> Result<Option<EntityId>> {
        let storage = self.storage()?;
        Ok(HierarchyStore::parent(storage, child)?)
    }

    /// The direct children of `parent`, in ascending id order.
    pub fn children(&self, parent: EntityId) -> Result<Vec<EntityId>> {
        let storage = self.storage()?;
        Ok(HierarchyStore::children(storage, parent)?)
    }

    /// All ancestors of `entity`, nearest first.
    pub fn ancestors(&self, entity: EntityId) -> Result<Vec<EntityId>> {
        let storage = self.storage()?;
        Ok(HierarchyStore::ancestors(storage, entity)?)
    }

    /// All descendants of `entity`.
    pub fn descendants(&self, entity: EntityId) -> Result<Vec<EntityId>> {
        let storage = self.storage()?;
        Ok(HierarchyStore::descendants(storage, entity)?)
    }

    /// All entities without a parent.
    pub fn roots(&self) -> Result<Vec<EntityId>> {
        let storage = self.storage()?;
        Ok(HierarchyStore::roots(storage)?)
    }

    // ========================================================================
    // Context Attachments
    // ========================================================================

    /// Attach `target` to `holder` under `label`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed label, a missing entity, or a
    /// duplicate (holder, label, target) triple.
    pub fn attach(&mut self, holder: EntityId, label: &str, target: EntityId) -> Result<()> {
        let storage = self.storage_mut()?;
        Ok(ContextStore::attach(storage, holder, label, target)?)
    }

    /// Remove one attachment triple. Returns `false` if it did not exist.
    pub fn detach(&mut self, holder: EntityId, label: &str, target: EntityId) -> Result<bool> {
        let storage = self.storage_mut()?;
        Ok(ContextStore::detach(storage, holder, label, target)?)
    }

    /// Remove every attachment of `holder` under `label`, returning how
    /// many were removed.
    pub fn detach_label(&mut self, holder: EntityId, label: &str) -> Result<usize> {
        let storage = self.storage_mut()?;
        Ok(ContextStore::detach_label(storage, holder, label)?)
    }

    /// All attachments held by `holder`.
    pub fn attachments(&self, holder: EntityId) -> Result<Vec<Attachment>> {
        let storage = self.storage()?;
        Ok(ContextStore::attachments(storage, holder)?)
    }

    /// The entities attached to `holder` under `label`.
    pub fn targets(&self, holder: EntityId, label: &str) -> Result<Vec<EntityId>> {
        let storage = self.storage()?;
        Ok(ContextStore::targets(storage, holder, label)?)
    }

    /// All attachments in which `target` is the attached entity.
    pub fn holders(&self, target: EntityId) -> Result<Vec<Attachment>> {
        let storage = self.storage()?;
        Ok(ContextStore::holders(storage, target)?)
    }

    /// The distinct labels under which `holder` holds attachments.
    pub fn labels(&self, holder: EntityId) -> Result<Vec<String>> {
        let storage = self.storage()?;
        Ok(ContextStore::labels(storage, holder)?)
    }

    /// The attachment partners of `entity` in both directions,
    /// deduplicated.
    pub fn related(&self, entity: EntityId) -> Result<Vec<EntityId>> {
        let storage = self.storage()?;
        Ok(ContextStore::related(storage, entity)?)
    }

    // ========================================================================
    // Data Payloads
    // ========================================================================

    /// Store a named binary payload on `entity`, replacing any previous
    /// payload under the same name.
    pub fn put_data(
        &mut self,
        entity: EntityId,
        name: &str,
        mimetype: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let storage = self.storage_mut()?;
        let record = DataRecord { mimetype: mimetype.map(str::to_owned), bytes };
        Ok(DataStore::put(storage, entity, name, &record)?)
    }

    /// Get a payload by name.
    pub fn get_data(&self, entity: EntityId, name: &str) -> Result<Option<DataRecord>> {
        let storage = self.storage()?;
        Ok(DataStore::get(storage, entity, name)?)
    }

    /// Summary of a payload, without its bytes.
    pub fn data_info(&self, entity: EntityId, name: &str) -> Result<Option<DataInfo>> {
        let storage = self.storage()?;
        Ok(DataStore::info(storage, entity, name)?)
    }

    /// Summaries of every payload on `entity`.
    pub fn list_data(&self, entity: EntityId) -> Result<Vec<DataInfo>> {
        let storage = self.storage()?;
        Ok(DataStore::list(storage, entity)?)
    }

    /// Delete a payload by name. Returns `false` if it did not exist.
    pub fn delete_data(&mut self, entity: EntityId, name: &str) -> Result<bool> {
        let storage = self.storage_mut()?;
        Ok(DataStore::delete(storage, entity, name)?)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Find entities of a type satisfying every filter, in ascending id
    /// order.
    pub fn find(&self, spec: impl Into<TypeSpec>, filters: &[Filter]) -> Result<Vec<Entity>> {
        let storage = self.storage()?;
        Ok(find_complex(storage, &spec.into(), filters)?)
    }

    /// All entities of a type.
    pub fn find_all(&self, spec: impl Into<TypeSpec>) -> Result<Vec<Entity>> {
        self.find(spec, &[])
    }

    /// Find exactly one matching entity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when nothing matches and
    /// [`Error::AmbiguousResult`] when more than one entity does.
    pub fn find_one(&self, spec: impl Into<TypeSpec>, filters: &[Filter]) -> Result<Entity> {
        let mut matches = self.find(spec, filters)?;
        match matches.len() {
            1 => matches.pop().ok_or_else(|| {
                Error::Internal("non-empty result emptied".to_owned())
            }),
            0 => Err(Error::NotFound("no entity matches the query".to_owned())),
            n => Err(Error::AmbiguousResult(format!("{n} entities match the query"))),
        }
    }

    /// Find matching entities that have no parent.
    pub fn find_roots(
        &self,
        spec: impl Into<TypeSpec>,
        filters: &[Filter],
    ) -> Result<Vec<Entity>> {
        let matches = self.find(spec, filters)?;
        let storage = self.storage()?;
        let mut roots = Vec::new();
        for entity in matches {
            let is_root = match entity.id {
                Some(id) => HierarchyStore::parent(storage, id)?.is_none(),
                None => false,
            };
            if is_root {
                roots.push(entity);
            }
        }
        Ok(roots)
    }

    /// Count entities of a type satisfying every filter.
    pub fn count(&self, spec: impl Into<TypeSpec>, filters: &[Filter]) -> Result<usize> {
        let storage = self.storage()?;
        Ok(arbordb_query::count(storage, &spec.into(), filters)?)
    }

    // ========================================================================
    // Rebranding
    // ========================================================================

    /// Migrate every entity of `source` to `target`, carrying over the
    /// attributes `target` declares and dropping the rest. Returns the
    /// number of migrated entities.
    ///
    /// # Errors
    ///
    /// Returns an error when the schemas are incompatible; the enclosing
    /// transaction should then be discarded.
    pub fn rebrand(&mut self, source: &EntityType, target: &EntityType) -> Result<usize> {
        let storage = self.storage_mut()?;
        Ok(rebrand::rebrand(storage, source, target)?)
    }

    /// Migrate every entity of `source` to `target`, passing each entity
    /// and its attribute map through `transform` to produce the map to
    /// carry forward.
    ///
    /// # Errors
    ///
    /// Returns an error when the schemas are incompatible or a transformed
    /// map is invalid under `target`; the enclosing transaction should
    /// then be discarded.
    pub fn rebrand_with<F>(
        &mut self,
        source: &EntityType,
        target: &EntityType,
        transform: F,
    ) -> Result<usize>
    where
        F: Fn(&Entity, BTreeMap<String, Value>) -> BTreeMap<String, Value>,
    {
        let storage = self.storage_mut()?;
        Ok(rebrand::rebrand_with(storage, source, target, transform)?)
    }

    // ========================================================================
    // Import / Export
    // ========================================================================

    /// Export every registered type, entity, attachment, and data payload
    /// as a JSON tree document.
    pub fn export_json<W: Write>(&self, writer: W) -> Result<ExportReport> {
        let storage = self.storage()?;
        io::export_json(storage, writer)
    }

    /// Import a JSON tree document, registering its types and creating its
    /// entities, hierarchy, attachments, and data payloads.
    pub fn import_json<R: Read>(&mut self, reader: R) -> Result<ImportReport> {
        let storage = self.storage_mut()?;
        io::import_json(storage, reader)
    }

    // ========================================================================
    // Transaction Lifecycle
    // ========================================================================

    /// Commit the transaction, making all changes durable.
    ///
    /// The handle is consumed and cannot be used afterwards.
    pub fn commit(mut self) -> Result<()> {
        let storage = self.storage.take().ok_or(TransactionError::AlreadyCompleted)?;
        storage.commit().map_err(TransactionError::from)?;
        Ok(())
    }

    /// Roll back the transaction, discarding all changes.
    ///
    /// Dropping an unconsumed handle does the same implicitly.
    pub fn rollback(mut self) -> Result<()> {
        let storage = self.storage.take().ok_or(TransactionError::AlreadyCompleted)?;
        storage.rollback().map_err(TransactionError::from)?;
        Ok(())
    }
}

impl<T: Transaction> Drop for DatabaseTransaction<T> {
    fn drop(&mut self) {
        // Still Some means neither commit nor rollback ran. Errors cannot
        // propagate out of drop.
        if let Some(storage) = self.storage.take() {
            let _ = storage.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbordb_storage::backends::RedbEngine;
    use arbordb_storage::StorageEngine;

    #[test]
    fn writes_rejected_on_read_only_handle() {
        let engine = RedbEngine::in_memory().expect("engine");
        let storage = engine.begin_read().expect("read tx");
        let mut tx = DatabaseTransaction::new_read(1, storage);

        let err = tx.register_type("Observer", &[]).expect_err("read-only");
        assert!(matches!(err, Error::Transaction(TransactionError::ReadOnly)));
    }

    #[test]
    fn insert_then_get_within_one_transaction() {
        let engine = RedbEngine::in_memory().expect("engine");
        let storage = engine.begin_write().expect("write tx");
        let mut tx = DatabaseTransaction::new_write(1, storage);

        let observer = tx
            .register_type("Observer", &[("name", ValueKind::String)])
            .expect("register");
        let mut entity = Entity::new(observer);
        entity.set_attribute("name", "Alice").expect("valid");
        let id = tx.insert(&mut entity).expect("insert");

        let loaded = tx.get(id).expect("get").expect("present");
        assert_eq!(loaded.attribute("name"), Some(&Value::from("Alice")));
        tx.commit().expect("commit");
    }
}
