//! Entity graph storage operations.
//!
//! This module provides transactional CRUD operations for the entity graph.
//! All operations work within a transaction context for ACID guarantees.
//!
//! # Overview
//!
//! - [`TypeStore`] - Registered entity types and name resolution
//! - [`EntityStore`] - Create, read, update, delete entities
//! - [`HierarchyStore`] - The single-parent containment tree
//! - [`ContextStore`] - Labeled cross-cutting attachments
//! - [`DataStore`] - Named binary payloads per entity
//!
//! # Tables
//!
//! The stores use the following logical tables in the storage backend:
//!
//! - `entities` - Entity records keyed by entity ID
//! - `entity_types` - Registered type records keyed by type ID
//! - `unique_index` - Unique id to entity ID
//! - `type_index` - Type membership, keyed by type ID + entity ID
//! - `parents` - Child to parent link
//! - `children` - Parent to children index
//! - `attachments` - Holder to (label, target)
//! - `attachments_inv` - Target to (label, holder)
//! - `data` - Binary payloads keyed by entity ID + name
//! - `metadata` - Counters (next entity ID)

mod context;
mod data;
mod entity;
mod error;
mod hierarchy;
mod types;

pub use context::{Attachment, ContextStore};
pub use data::{DataInfo, DataRecord, DataStore};
pub use entity::EntityStore;
pub use error::{GraphError, GraphResult};
pub use hierarchy::HierarchyStore;
pub use types::TypeStore;

/// Table name for entity records.
pub const TABLE_ENTITIES: &str = "entities";
/// Table name for registered entity types.
pub const TABLE_ENTITY_TYPES: &str = "entity_types";
/// Table name for the unique-id index.
pub const TABLE_UNIQUE_INDEX: &str = "unique_index";
/// Table name for the type-membership index.
pub const TABLE_TYPE_INDEX: &str = "type_index";
/// Table name for child-to-parent links.
pub const TABLE_PARENTS: &str = "parents";
/// Table name for the parent-to-children index.
pub const TABLE_CHILDREN: &str = "children";
/// Table name for attachments, keyed by holder.
pub const TABLE_ATTACHMENTS: &str = "attachments";
/// Table name for the reverse attachment index, keyed by target.
pub const TABLE_ATTACHMENTS_INV: &str = "attachments_inv";
/// Table name for binary payloads.
pub const TABLE_DATA: &str = "data";
/// Table name for counters and other metadata.
pub const TABLE_METADATA: &str = "metadata";

use std::ops::Bound;

use arbordb_core::encoding::keys::prefix_upper_bound;
use arbordb_storage::Transaction;

/// Open a cursor over every key starting with `prefix` in `table`.
pub(crate) fn prefix_scan<'a, T: Transaction>(
    tx: &'a T,
    table: &str,
    prefix: &[u8],
) -> GraphResult<T::Cursor<'a>> {
    let end = prefix_upper_bound(prefix);
    let upper = match &end {
        Some(bound) => Bound::Excluded(bound.as_slice()),
        None => Bound::Unbounded,
    };
    Ok(tx.range(table, Bound::Included(prefix), upper)?)
}
