//! The single-parent containment tree.
//!
//! Every entity has at most one parent. The forward direction is stored as
//! a child-keyed link (`parents` table) and mirrored in a parent-keyed
//! index (`children` table) so both directions scan efficiently.

use arbordb_core::encoding::keys::{
    children_key, children_prefix, decode_children_key, decode_entity_key, parent_key,
};
use arbordb_core::EntityId;
use arbordb_storage::{Cursor, Transaction};

use super::error::{GraphError, GraphResult};
use super::{prefix_scan, EntityStore, TABLE_CHILDREN, TABLE_PARENTS};

/// Upper bound on ancestry walks, guarding against index corruption.
const MAX_ANCESTRY_DEPTH: usize = 10_000;

/// Containment tree operations.
pub struct HierarchyStore;

impl HierarchyStore {
    /// Set `parent` as the parent of `child`.
    ///
    /// Fails if the child already has a parent unless `force` is set, in
    /// which case the child is reparented. Re-linking the current parent is
    /// no exception. Fails if the link would create a cycle, including the
    /// self-loop case.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EntityNotFound`] if either entity does not
    /// exist, [`GraphError::AlreadyHasParent`] or
    /// [`GraphError::Circularity`] as described above.
    pub fn set_parent<T: Transaction>(
        tx: &mut T,
        child: EntityId,
        parent: EntityId,
        force: bool,
    ) -> GraphResult<()> {
        if !EntityStore::exists(tx, child)? {
            return Err(GraphError::EntityNotFound(child));
        }
        if !EntityStore::exists(tx, parent)? {
            return Err(GraphError::EntityNotFound(parent));
        }

        // The child must not appear among the new parent's ancestors.
        if child == parent || Self::ancestors(tx, parent)?.contains(&child) {
            return Err(GraphError::Circularity { child, parent });
        }

        if let Some(current) = Self::parent(tx, child)? {
            if !force {
                return Err(GraphError::AlreadyHasParent { child, parent: current });
            }
            tx.delete(TABLE_CHILDREN, &children_key(current, child))?;
        }

        tx.put(TABLE_PARENTS, &parent_key(child), &parent.as_u64().to_be_bytes())?;
        tx.put(TABLE_CHILDREN, &children_key(parent, child), &[])?;
        Ok(())
    }

    /// Remove the parent link of `child`, if any.
    ///
    /// Returns `true` if a link was removed.
    pub fn remove_parent<T: Transaction>(tx: &mut T, child: EntityId) -> GraphResult<bool> {
        let Some(parent) = Self::parent(tx, child)? else {
            return Ok(false);
        };
        tx.delete(TABLE_PARENTS, &parent_key(child))?;
        tx.delete(TABLE_CHILDREN, &children_key(parent, child))?;
        Ok(true)
    }

    /// The parent of `child`, if it has one.
    pub fn parent<T: Transaction>(tx: &T, child: EntityId) -> GraphResult<Option<EntityId>> {
        match tx.get(TABLE_PARENTS, &parent_key(child))? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    GraphError::Internal("malformed parent link".to_owned())
                })?;
                Ok(Some(EntityId::new(u64::from_be_bytes(bytes))))
            }
            None => Ok(None),
        }
    }

    /// The direct children of `parent`, in ascending ID order.
    pub fn children<T: Transaction>(tx: &T, parent: EntityId) -> GraphResult<Vec<EntityId>> {
        let mut cursor = prefix_scan(tx, TABLE_CHILDREN, &children_prefix(parent))?;
        let mut children = Vec::new();
        while let Some((key, _)) = cursor.next()? {
            if let Some(child) = decode_children_key(&key) {
                children.push(child);
            }
        }
        Ok(children)
    }

    /// The chain of ancestors of `entity`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Internal`] if the walk exceeds the depth
    /// guard, which indicates a corrupted index.
    pub fn ancestors<T: Transaction>(tx: &T, entity: EntityId) -> GraphResult<Vec<EntityId>> {
        let mut ancestors = Vec::new();
        let mut current = entity;
        while let Some(parent) = Self::parent(tx, current)? {
            ancestors.push(parent);
            if ancestors.len() > MAX_ANCESTRY_DEPTH {
                return Err(GraphError::Internal(format!(
                    "ancestry of {entity} exceeds {MAX_ANCESTRY_DEPTH} levels"
                )));
            }
            current = parent;
        }
        Ok(ancestors)
    }

    /// All descendants of `entity`, in traversal order.
    pub fn descendants<T: Transaction>(tx: &T, entity: EntityId) -> GraphResult<Vec<EntityId>> {
        let mut descendants = Vec::new();
        let mut frontier = vec![entity];
        while let Some(current) = frontier.pop() {
            for child in Self::children(tx, current)? {
                descendants.push(child);
                frontier.push(child);
                if descendants.len() > MAX_ANCESTRY_DEPTH {
                    return Err(GraphError::Internal(format!(
                        "descendant walk of {entity} exceeds {MAX_ANCESTRY_DEPTH} entities"
                    )));
                }
            }
        }
        Ok(descendants)
    }

    /// IDs of all entities that have no parent, in ascending ID order.
    pub fn roots<T: Transaction>(tx: &T) -> GraphResult<Vec<EntityId>> {
        let mut roots = Vec::new();
        let mut cursor = tx.cursor(super::TABLE_ENTITIES)?;
        while let Some((key, _)) = cursor.next()? {
            if let Some(id) = decode_entity_key(&key) {
                if Self::parent(tx, id)?.is_none() {
                    roots.push(id);
                }
            }
        }
        Ok(roots)
    }

    /// Remove the parent links of all children of `parent`, making them
    /// roots. Used when deleting an entity.
    pub(crate) fn orphan_children<T: Transaction>(
        tx: &mut T,
        parent: EntityId,
    ) -> GraphResult<()> {
        for child in Self::children(tx, parent)? {
            tx.delete(TABLE_PARENTS, &parent_key(child))?;
            tx.delete(TABLE_CHILDREN, &children_key(parent, child))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use arbordb_core::{Entity, EntityType, Schema};
    use arbordb_storage::backends::RedbEngine;
    use arbordb_storage::StorageEngine;

    use super::*;

    fn node(tx: &mut impl Transaction) -> EntityId {
        let kind = EntityType::new("Node", Schema::new()).expect("valid declaration");
        let mut entity = Entity::new(kind);
        EntityStore::insert(tx, &mut entity).expect("insert")
    }

    #[test]
    fn set_and_query_parent() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        let mut tx = engine.begin_write().expect("begin write");

        let root = node(&mut tx);
        let a = node(&mut tx);
        let b = node(&mut tx);
        HierarchyStore::set_parent(&mut tx, a, root, false).expect("link a");
        HierarchyStore::set_parent(&mut tx, b, root, false).expect("link b");

        assert_eq!(HierarchyStore::parent(&tx, a).expect("parent"), Some(root));
        assert_eq!(HierarchyStore::parent(&tx, root).expect("parent"), None);
        assert_eq!(HierarchyStore::children(&tx, root).expect("children"), vec![a, b]);
        assert_eq!(HierarchyStore::roots(&tx).expect("roots"), vec![root]);
    }

    #[test]
    fn reparenting_requires_force() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        let mut tx = engine.begin_write().expect("begin write");

        let p1 = node(&mut tx);
        let p2 = node(&mut tx);
        let child = node(&mut tx);
        HierarchyStore::set_parent(&mut tx, child, p1, false).expect("link");

        // Even the current parent needs force.
        assert!(matches!(
            HierarchyStore::set_parent(&mut tx, child, p1, false),
            Err(GraphError::AlreadyHasParent { .. })
        ));
        HierarchyStore::set_parent(&mut tx, child, p1, true).expect("forced re-link");
        assert_eq!(HierarchyStore::parent(&tx, child).expect("parent"), Some(p1));

        assert!(matches!(
            HierarchyStore::set_parent(&mut tx, child, p2, false),
            Err(GraphError::AlreadyHasParent { .. })
        ));

        HierarchyStore::set_parent(&mut tx, child, p2, true).expect("forced reparent");
        assert_eq!(HierarchyStore::parent(&tx, child).expect("parent"), Some(p2));
        assert!(HierarchyStore::children(&tx, p1).expect("children").is_empty());
    }

    #[test]
    fn cycles_are_rejected() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        let mut tx = engine.begin_write().expect("begin write");

        let a = node(&mut tx);
        let b = node(&mut tx);
        let c = node(&mut tx);
        HierarchyStore::set_parent(&mut tx, b, a, false).expect("link");
        HierarchyStore::set_parent(&mut tx, c, b, false).expect("link");

        assert!(matches!(
            HierarchyStore::set_parent(&mut tx, a, c, false),
            Err(GraphError::Circularity { .. })
        ));
        assert!(matches!(
            HierarchyStore::set_parent(&mut tx, a, a, false),
            Err(GraphError::Circularity { .. })
        ));
        // Force does not override the cycle check.
        assert!(matches!(
            HierarchyStore::set_parent(&mut tx, a, c, true),
            Err(GraphError::Circularity { .. })
        ));
    }

    #[test]
    fn ancestors_and_descendants() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        let mut tx = engine.begin_write().expect("begin write");

        let a = node(&mut tx);
        let b = node(&mut tx);
        let c = node(&mut tx);
        HierarchyStore::set_parent(&mut tx, b, a, false).expect("link");
        HierarchyStore::set_parent(&mut tx, c, b, false).expect("link");

        assert_eq!(HierarchyStore::ancestors(&tx, c).expect("ancestors"), vec![b, a]);
        let mut descendants = HierarchyStore::descendants(&tx, a).expect("descendants");
        descendants.sort_unstable();
        assert_eq!(descendants, vec![b, c]);
    }

    #[test]
    fn deleting_parent_orphans_children() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        let mut tx = engine.begin_write().expect("begin write");

        let parent = node(&mut tx);
        let child = node(&mut tx);
        HierarchyStore::set_parent(&mut tx, child, parent, false).expect("link");

        EntityStore::delete(&mut tx, parent).expect("delete");
        assert!(EntityStore::exists(&tx, child).expect("exists"));
        assert_eq!(HierarchyStore::parent(&tx, child).expect("parent"), None);
    }

    #[test]
    fn missing_entities_are_rejected() {
        let engine = RedbEngine::in_memory().expect("in-memory engine");
        let mut tx = engine.begin_write().expect("begin write");

        let a = node(&mut tx);
        assert!(matches!(
            HierarchyStore::set_parent(&mut tx, a, EntityId::new(999), false),
            Err(GraphError::EntityNotFound(_))
        ));
    }
}
