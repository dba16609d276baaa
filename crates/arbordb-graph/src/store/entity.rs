//! Entity storage operations.
//!
//! Entities are stored as encoded records keyed by their storage ID, with
//! two side indexes: the unique-id index (unique id to storage ID) and the
//! type-membership index (type ID + storage ID). Storage IDs come from a
//! persisted counter, so they survive reopening the database.

use arbordb_core::encoding::keys::{
    decode_type_index_key, entity_key, type_index_key, type_index_prefix, unique_id_key,
};
use arbordb_core::encoding::{Decoder, Encoder};
use arbordb_core::{Entity, EntityId, TypeId};
use arbordb_storage::{Cursor, Transaction};

use super::error::{GraphError, GraphResult};
use super::{
    prefix_scan, ContextStore, DataStore, HierarchyStore, TypeStore, TABLE_ENTITIES,
    TABLE_METADATA, TABLE_TYPE_INDEX, TABLE_UNIQUE_INDEX,
};

/// Metadata key for the next entity ID counter.
const NEXT_ENTITY_ID_KEY: &[u8] = b"next_entity_id";

/// Entity storage operations.
///
/// # Example
///
/// ```ignore
/// use arbordb_graph::store::EntityStore;
///
/// let mut entity = Entity::new(observer).with_attribute("name", "Alice")?;
/// let id = EntityStore::insert(&mut tx, &mut entity)?;
/// let retrieved = EntityStore::get_or_error(&tx, id)?;
/// ```
pub struct EntityStore;

impl EntityStore {
    /// Allocate the next entity ID from the persisted counter.
    ///
    /// IDs start at 1 and never repeat within one database.
    fn next_id<T: Transaction>(tx: &mut T) -> GraphResult<EntityId> {
        let next = match tx.get(TABLE_METADATA, NEXT_ENTITY_ID_KEY)? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    GraphError::Internal("malformed entity id counter".to_owned())
                })?;
                u64::from_be_bytes(bytes)
            }
            None => 1,
        };
        tx.put(TABLE_METADATA, NEXT_ENTITY_ID_KEY, &(next + 1).to_be_bytes())?;
        Ok(EntityId::new(next))
    }

    /// Insert a new entity, assigning its storage ID.
    ///
    /// The entity's type is registered as a side effect, and the unique-id
    /// and type indexes are updated. The assigned ID is written back into
    /// the entity and returned.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateUniqueId`] if another entity already
    /// carries the same unique id, and [`GraphError::Internal`] if the
    /// entity has already been saved.
    pub fn insert<T: Transaction>(tx: &mut T, entity: &mut Entity) -> GraphResult<EntityId> {
        if let Some(id) = entity.id {
            return Err(GraphError::Internal(format!("entity already saved as {id}")));
        }
        if tx.get(TABLE_UNIQUE_INDEX, &unique_id_key(&entity.unique_id))?.is_some() {
            return Err(GraphError::DuplicateUniqueId(entity.unique_id.clone()));
        }

        TypeStore::register(tx, entity.entity_type())?;

        let id = Self::next_id(tx)?;
        entity.id = Some(id);

        tx.put(TABLE_ENTITIES, &entity_key(id), &entity.encode()?)?;
        tx.put(
            TABLE_UNIQUE_INDEX,
            &unique_id_key(&entity.unique_id),
            &id.as_u64().to_be_bytes(),
        )?;
        tx.put(TABLE_TYPE_INDEX, &type_index_key(entity.entity_type().id(), id), &[])?;

        Ok(id)
    }

    /// Update an existing entity record.
    ///
    /// If the entity's type changed, the type index is moved to the new
    /// type, which is registered as a side effect.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Internal`] if the entity was never saved and
    /// [`GraphError::EntityNotFound`] if no record exists for its ID.
    pub fn update<T: Transaction>(tx: &mut T, entity: &Entity) -> GraphResult<()> {
        let id = entity
            .id
            .ok_or_else(|| GraphError::Internal("entity has no storage id".to_owned()))?;
        let old = Self::get(tx, id)?.ok_or(GraphError::EntityNotFound(id))?;

        let old_type = old.entity_type().id();
        let new_type = entity.entity_type().id();
        if old_type != new_type {
            tx.delete(TABLE_TYPE_INDEX, &type_index_key(old_type, id))?;
            TypeStore::register(tx, entity.entity_type())?;
            tx.put(TABLE_TYPE_INDEX, &type_index_key(new_type, id), &[])?;
        }

        tx.put(TABLE_ENTITIES, &entity_key(id), &entity.encode()?)?;
        Ok(())
    }

    /// Get an entity by storage ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be decoded.
    pub fn get<T: Transaction>(tx: &T, id: EntityId) -> GraphResult<Option<Entity>> {
        match tx.get(TABLE_ENTITIES, &entity_key(id))? {
            Some(value) => Ok(Some(Entity::decode(&value)?)),
            None => Ok(None),
        }
    }

    /// Get an entity by storage ID, or fail.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EntityNotFound`] if no record exists.
    pub fn get_or_error<T: Transaction>(tx: &T, id: EntityId) -> GraphResult<Entity> {
        Self::get(tx, id)?.ok_or(GraphError::EntityNotFound(id))
    }

    /// Check whether an entity exists.
    pub fn exists<T: Transaction>(tx: &T, id: EntityId) -> GraphResult<bool> {
        Ok(tx.get(TABLE_ENTITIES, &entity_key(id))?.is_some())
    }

    /// Look up an entity by its unique id.
    pub fn get_by_unique_id<T: Transaction>(tx: &T, unique_id: &str) -> GraphResult<Option<Entity>> {
        match tx.get(TABLE_UNIQUE_INDEX, &unique_id_key(unique_id))? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    GraphError::Internal("malformed unique-id index entry".to_owned())
                })?;
                Self::get(tx, EntityId::new(u64::from_be_bytes(bytes)))
            }
            None => Ok(None),
        }
    }

    /// IDs of all entities of one registered type, in ascending ID order.
    pub fn ids_by_type<T: Transaction>(tx: &T, type_id: TypeId) -> GraphResult<Vec<EntityId>> {
        let mut cursor = prefix_scan(tx, TABLE_TYPE_INDEX, &type_index_prefix(type_id))?;
        let mut ids = Vec::new();
        while let Some((key, _)) = cursor.next()? {
            if let Some(id) = decode_type_index_key(&key) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Count all entities in the store.
    pub fn count<T: Transaction>(tx: &T) -> GraphResult<usize> {
        let mut cursor = tx.cursor(TABLE_ENTITIES)?;
        let mut count = 0;
        while cursor.next()?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Iterate over all entities in ascending ID order.
    ///
    /// The callback returns `false` to stop iteration early.
    ///
    /// # Errors
    ///
    /// Returns an error if iteration fails or a record cannot be decoded.
    pub fn for_each<T: Transaction, F>(tx: &T, mut f: F) -> GraphResult<()>
    where
        F: FnMut(&Entity) -> bool,
    {
        let mut cursor = tx.cursor(TABLE_ENTITIES)?;
        while let Some((_, value)) = cursor.next()? {
            let entity = Entity::decode(&value)?;
            if !f(&entity) {
                break;
            }
        }
        Ok(())
    }

    /// All entities as a vector.
    ///
    /// Prefer [`Self::for_each`] on large stores.
    pub fn all<T: Transaction>(tx: &T) -> GraphResult<Vec<Entity>> {
        let mut entities = Vec::new();
        Self::for_each(tx, |entity| {
            entities.push(entity.clone());
            true
        })?;
        Ok(entities)
    }

    /// Delete an entity and every trace of it.
    ///
    /// Removes the record, its indexes, its payloads, its attachments in
    /// both directions, and its parent link. Children are orphaned (their
    /// parent link is removed), not deleted.
    ///
    /// # Returns
    ///
    /// `true` if the entity existed.
    pub fn delete<T: Transaction>(tx: &mut T, id: EntityId) -> GraphResult<bool> {
        let Some(entity) = Self::get(tx, id)? else {
            return Ok(false);
        };

        HierarchyStore::remove_parent(tx, id)?;
        HierarchyStore::orphan_children(tx, id)?;
        ContextStore::detach_entity(tx, id)?;
        DataStore::delete_all(tx, id)?;

        tx.delete(TABLE_UNIQUE_INDEX, &unique_id_key(&entity.unique_id))?;
        tx.delete(TABLE_TYPE_INDEX, &type_index_key(entity.entity_type().id(), id))?;
        tx.delete(TABLE_ENTITIES, &entity_key(id))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use arbordb_core::{EntityType, Schema, Value, ValueKind};
    use arbordb_storage::backends::RedbEngine;
    use arbordb_storage::StorageEngine;

    use super::*;

    fn observer() -> EntityType {
        EntityType::new(
            "Observer",
            Schema::new()
                .with_attribute("name", ValueKind::String)
                .with_attribute("age", ValueKind::Integer),
        )
        .expect("valid declaration")
    }

    fn saved(tx: &mut impl Transaction, name: &str) -> Entity {
        let mut entity = Entity::new(observer())
            .with_attribute("name", name)
            .expect("declared attribute");
        EntityStore::insert(tx, &mut entity).expect("insert");
        entity
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        let mut tx = engine.begin_write().expect("begin write");

        let a = saved(&mut tx, "Alice");
        let b = saved(&mut tx, "Bob");
        assert_eq!(a.id, Some(EntityId::new(1)));
        assert_eq!(b.id, Some(EntityId::new(2)));
        assert_eq!(EntityStore::count(&tx).expect("count"), 2);
    }

    #[test]
    fn ids_survive_commit() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        {
            let mut tx = engine.begin_write().expect("begin write");
            saved(&mut tx, "Alice");
            tx.commit().expect("commit");
        }
        let mut tx = engine.begin_write().expect("begin write");
        let b = saved(&mut tx, "Bob");
        assert_eq!(b.id, Some(EntityId::new(2)));
    }

    #[test]
    fn get_by_unique_id_roundtrip() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        let mut tx = engine.begin_write().expect("begin write");

        let entity = saved(&mut tx, "Alice");
        let found = EntityStore::get_by_unique_id(&tx, &entity.unique_id)
            .expect("lookup")
            .expect("entity exists");
        assert_eq!(found.id, entity.id);
        assert_eq!(found.attribute("name"), Some(&Value::from("Alice")));

        assert!(EntityStore::get_by_unique_id(&tx, "no-such-uid").expect("lookup").is_none());
    }

    #[test]
    fn reinserting_saved_entity_fails() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        let mut tx = engine.begin_write().expect("begin write");

        let mut entity = saved(&mut tx, "Alice");
        assert!(EntityStore::insert(&mut tx, &mut entity).is_err());
    }

    #[test]
    fn type_index_tracks_membership() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        let mut tx = engine.begin_write().expect("begin write");

        let a = saved(&mut tx, "Alice");
        let b = saved(&mut tx, "Bob");

        let ids = EntityStore::ids_by_type(&tx, observer().id()).expect("ids");
        assert_eq!(ids, vec![a.id.expect("saved"), b.id.expect("saved")]);
    }

    #[test]
    fn update_moves_type_index_on_retype() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        let mut tx = engine.begin_write().expect("begin write");

        let entity = saved(&mut tx, "Alice");
        let id = entity.id.expect("saved");

        let narrow = EntityType::new(
            "Observer",
            Schema::new().with_attribute("name", ValueKind::String),
        )
        .expect("valid declaration");
        let migrated = entity
            .retyped(narrow.clone(), entity.attributes().clone())
            .expect("name fits narrow schema");
        EntityStore::update(&mut tx, &migrated).expect("update");

        assert!(EntityStore::ids_by_type(&tx, observer().id()).expect("ids").is_empty());
        assert_eq!(EntityStore::ids_by_type(&tx, narrow.id()).expect("ids"), vec![id]);
    }

    #[test]
    fn delete_removes_record_and_indexes() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        let mut tx = engine.begin_write().expect("begin write");

        let entity = saved(&mut tx, "Alice");
        let id = entity.id.expect("saved");

        assert!(EntityStore::delete(&mut tx, id).expect("delete"));
        assert!(!EntityStore::delete(&mut tx, id).expect("second delete"));
        assert!(EntityStore::get(&tx, id).expect("get").is_none());
        assert!(EntityStore::get_by_unique_id(&tx, &entity.unique_id).expect("lookup").is_none());
        assert!(EntityStore::ids_by_type(&tx, observer().id()).expect("ids").is_empty());
    }
}
