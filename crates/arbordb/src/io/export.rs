//! JSON tree export.

use std::io::Write;

use arbordb_core::EntityId;
use arbordb_graph::store::{ContextStore, DataStore, EntityStore, HierarchyStore, TypeStore};
use arbordb_storage::Transaction;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::info;

use super::{value_to_json, DataEntry, Document, ExportReport, ObjectEntry, RelationEntry, TypeEntry};
use crate::error::{Error, Result};

/// Export every registered type, entity, attachment, and data payload as
/// a JSON tree document.
///
/// Entities appear as a forest with children nested under their parents;
/// attachments appear as `relations` entries referencing both endpoints
/// by unique id.
///
/// # Errors
///
/// Returns an error if a graph read fails or the document cannot be
/// written.
pub fn export_json<T: Transaction, W: Write>(tx: &T, writer: W) -> Result<ExportReport> {
    let mut document = Document::default();

    for entity_type in TypeStore::all(tx)? {
        document.types.push(TypeEntry {
            type_name: entity_type.name().to_owned(),
            parameters: entity_type
                .schema()
                .iter()
                .map(|(name, kind)| (name.to_owned(), kind.as_str().to_owned()))
                .collect(),
        });
    }

    let mut entities = 0;
    for root in HierarchyStore::roots(tx)? {
        document.objects.push(export_object(tx, root, &mut entities)?);
    }

    for entity in EntityStore::all(tx)? {
        let Some(holder) = entity.id else { continue };
        for attachment in ContextStore::attachments(tx, holder)? {
            let target = EntityStore::get_or_error(tx, attachment.target)?;
            document.relations.push(RelationEntry {
                relation: "context".to_owned(),
                name: attachment.label,
                from: format!("unique_id:{}", entity.unique_id),
                to: format!("unique_id:{}", target.unique_id),
            });
        }
    }

    let report = ExportReport {
        types: document.types.len(),
        entities,
        relations: document.relations.len(),
    };

    serde_json::to_writer_pretty(writer, &document)
        .map_err(|e| Error::Internal(format!("failed to write document: {e}")))?;

    info!(
        types = report.types,
        entities = report.entities,
        relations = report.relations,
        "exported json document"
    );

    Ok(report)
}

/// Export one entity and, recursively, its children.
fn export_object<T: Transaction>(
    tx: &T,
    id: EntityId,
    entities: &mut usize,
) -> Result<ObjectEntry> {
    let entity = EntityStore::get_or_error(tx, id)?;
    *entities += 1;

    let mut entry = ObjectEntry {
        type_name: entity.type_name().to_owned(),
        unique_id: Some(entity.unique_id.clone()),
        reference: None,
        parameters: entity
            .attributes()
            .iter()
            .map(|(name, value)| (name.clone(), value_to_json(value)))
            .collect(),
        data: Default::default(),
        children: Vec::new(),
    };

    for data_info in DataStore::list(tx, id)? {
        if let Some(record) = DataStore::get(tx, id, &data_info.name)? {
            entry.data.insert(
                data_info.name,
                DataEntry {
                    mimetype: record.mimetype,
                    content: STANDARD.encode(&record.bytes),
                },
            );
        }
    }

    for child in HierarchyStore::children(tx, id)? {
        entry.children.push(export_object(tx, child, entities)?);
    }

    Ok(entry)
}
