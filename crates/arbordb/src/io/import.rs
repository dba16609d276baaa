//! JSON tree import.

use std::collections::BTreeMap;
use std::io::Read;
use std::str::FromStr;

use arbordb_core::{CoreError, Entity, EntityId, EntityType, Schema, ValueKind};
use arbordb_graph::store::{
    ContextStore, DataRecord, DataStore, EntityStore, GraphError, HierarchyStore, TypeStore,
};
use arbordb_storage::Transaction;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::info;

use super::{json_to_value, Document, ImportError, ImportReport, ObjectEntry};
use crate::error::Result;

/// Import a JSON tree document.
///
/// Listed types are registered (idempotently for unchanged declarations),
/// entities are created depth-first with their parent links, and
/// `relations` entries become context attachments. The caller supplies
/// the transaction, so the whole import commits or rolls back as one.
///
/// # Errors
///
/// Returns [`ImportError`] for malformed documents, unknown kinds,
/// invalid values, and unresolvable references; entity and registry
/// failures surface through their own error types.
pub fn import_json<T: Transaction, R: Read>(tx: &mut T, reader: R) -> Result<ImportReport> {
    let document: Document =
        serde_json::from_reader(reader).map_err(|e| ImportError::Malformed(e.to_string()))?;

    for entry in &document.types {
        let mut pairs = Vec::with_capacity(entry.parameters.len());
        for (attribute, kind_name) in &entry.parameters {
            let kind = ValueKind::from_str(kind_name).map_err(|_| ImportError::UnknownKind {
                type_name: entry.type_name.clone(),
                attribute: attribute.clone(),
                kind: kind_name.clone(),
            })?;
            pairs.push((attribute.clone(), kind));
        }
        let schema: Schema = pairs.into_iter().collect();
        let entity_type =
            EntityType::new(entry.type_name.as_str(), schema).map_err(ImportError::Core)?;
        TypeStore::register(tx, &entity_type).map_err(ImportError::Graph)?;
    }

    let mut report = ImportReport { types: document.types.len(), ..Default::default() };
    let mut references = BTreeMap::new();

    for object in &document.objects {
        import_object(tx, object, None, &mut references, &mut report)?;
    }

    for relation in &document.relations {
        if relation.relation != "context" {
            return Err(ImportError::UnknownRelation(relation.relation.clone()).into());
        }
        let from = resolve_reference(tx, &references, &relation.from)?;
        let to = resolve_reference(tx, &references, &relation.to)?;
        ContextStore::attach(tx, from, &relation.name, to)?;
        report.relations += 1;
    }

    info!(
        types = report.types,
        entities = report.entities,
        relations = report.relations,
        "imported json document"
    );

    Ok(report)
}

/// Create one entity and, recursively, its children.
fn import_object<T: Transaction>(
    tx: &mut T,
    object: &ObjectEntry,
    parent: Option<EntityId>,
    references: &mut BTreeMap<String, EntityId>,
    report: &mut ImportReport,
) -> Result<()> {
    let entity_type = TypeStore::resolve(tx, &object.type_name)?;

    let mut entity = match &object.unique_id {
        Some(uid) => Entity::from_parts(None, uid.clone(), entity_type.clone(), BTreeMap::new()),
        None => Entity::new(entity_type.clone()),
    };

    for (attribute, json) in &object.parameters {
        let kind = entity_type.schema().kind_of(attribute).ok_or_else(|| {
            ImportError::Core(CoreError::unknown_attribute(entity_type.name(), attribute.clone()))
        })?;
        let value = json_to_value(attribute, kind, json)?;
        entity.set_attribute(attribute.clone(), value)?;
    }

    let id = EntityStore::insert(tx, &mut entity)?;
    report.entities += 1;

    if let Some(parent) = parent {
        HierarchyStore::set_parent(tx, id, parent, false)?;
    }
    if let Some(reference) = &object.reference {
        references.insert(reference.clone(), id);
    }

    for (name, data) in &object.data {
        let bytes = STANDARD.decode(&data.content).map_err(|e| ImportError::InvalidData {
            name: name.clone(),
            message: e.to_string(),
        })?;
        let record = DataRecord { mimetype: data.mimetype.clone(), bytes };
        DataStore::put(tx, id, name, &record)?;
    }

    for child in &object.children {
        import_object(tx, child, Some(id), references, report)?;
    }

    Ok(())
}

/// Resolve a relation endpoint: `id:<n>`, `unique_id:<uid>`, or a bare
/// `"ref"` key declared on an object in the same document.
fn resolve_reference<T: Transaction>(
    tx: &T,
    references: &BTreeMap<String, EntityId>,
    reference: &str,
) -> Result<EntityId> {
    if let Some(raw) = reference.strip_prefix("id:") {
        let id = raw
            .parse::<u64>()
            .map_err(|_| ImportError::UnresolvedReference(reference.to_owned()))?;
        let id = EntityId::new(id);
        if !EntityStore::exists(tx, id)? {
            return Err(GraphError::EntityNotFound(id).into());
        }
        return Ok(id);
    }

    if let Some(uid) = reference.strip_prefix("unique_id:") {
        let entity = EntityStore::get_by_unique_id(tx, uid)?
            .ok_or_else(|| GraphError::UniqueIdNotFound(uid.to_owned()))?;
        return entity
            .id
            .ok_or_else(|| ImportError::UnresolvedReference(reference.to_owned()).into());
    }

    references
        .get(reference)
        .copied()
        .ok_or_else(|| ImportError::UnresolvedReference(reference.to_owned()).into())
}
