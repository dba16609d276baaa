//! Schema migration ("rebranding").
//!
//! A rebrand moves every persisted entity of a source type onto a target
//! type in one unit of work. Identity, hierarchy, attachments, and data
//! payloads are untouched; only the embedded type and the attribute map
//! change.
//!
//! Migrations are restricted to single compatible steps: the target's
//! declared attribute set must be a superset or a subset of the source's,
//! with matching kinds on the shared attributes. Anything broader is an
//! explicit chain of compatible steps.

use std::collections::BTreeMap;

use arbordb_core::{CoreError, Entity, EntityType, Value};
use arbordb_graph::store::{EntityStore, GraphError, TypeStore};
use arbordb_storage::Transaction;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during a rebrand migration.
#[derive(Debug, Error)]
pub enum RebrandError {
    /// The target schema is neither a superset nor a subset of the source
    /// schema.
    #[error("cannot rebrand {source_type} as {target}: schemas are incompatible")]
    IncompatibleSchema {
        /// Identity name of the source type.
        source_type: String,
        /// Identity name of the target type.
        target: String,
    },

    /// A transformed attribute map is invalid under the target schema.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A graph operation failed during migration.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Migrate every entity of `source` to `target`.
///
/// Attributes declared by `target` are carried over; the rest are dropped.
/// Returns the number of migrated entities.
///
/// # Errors
///
/// Returns [`RebrandError::IncompatibleSchema`] when the schemas are
/// neither superset nor subset of one another. On any error the caller
/// must discard the enclosing transaction; no entity is migrated halfway.
pub fn rebrand<T: Transaction>(
    tx: &mut T,
    source: &EntityType,
    target: &EntityType,
) -> Result<usize, RebrandError> {
    rebrand_with(tx, source, target, |_, attributes| {
        attributes
            .into_iter()
            .filter(|(name, _)| target.schema().declares(name))
            .collect()
    })
}

/// Migrate every entity of `source` to `target`, passing each entity and
/// its current attribute map through `transform` to produce the map to
/// carry forward.
///
/// The transformed map is validated against the target schema. Returns
/// the number of migrated entities.
///
/// # Errors
///
/// Same conditions as [`rebrand`], plus validation failures of the
/// transformed maps.
pub fn rebrand_with<T, F>(
    tx: &mut T,
    source: &EntityType,
    target: &EntityType,
    transform: F,
) -> Result<usize, RebrandError>
where
    T: Transaction,
    F: Fn(&Entity, BTreeMap<String, Value>) -> BTreeMap<String, Value>,
{
    if !source.is_compatible_with(target) {
        return Err(RebrandError::IncompatibleSchema {
            source_type: source.identity_name(),
            target: target.identity_name(),
        });
    }

    TypeStore::register(tx, target)?;

    let ids = EntityStore::ids_by_type(tx, source.id())?;
    for &id in &ids {
        let entity = EntityStore::get_or_error(tx, id)?;
        let attributes = transform(&entity, entity.attributes().clone());
        let migrated = entity.retyped(target.clone(), attributes)?;
        EntityStore::update(tx, &migrated)?;
    }

    info!(
        source = %source.identity_name(),
        target = %target.identity_name(),
        entities = ids.len(),
        "rebranded entities"
    );

    Ok(ids.len())
}
