//! Labeled cross-cutting attachments.
//!
//! Attachments connect entities outside the containment tree: a holder
//! entity points at a target entity under a textual label, and any number
//! of attachments may exist as long as the (holder, label, target) triple
//! is unique. The forward table is keyed by holder and mirrored in a
//! target-keyed table so both endpoints scan efficiently.

use arbordb_core::encoding::keys::{
    attachment_key, attachment_label_prefix, attachment_prefix, decode_attachment_key,
};
use arbordb_core::types::validate_name_token;
use arbordb_core::EntityId;
use arbordb_storage::{Cursor, Transaction};

use super::error::{GraphError, GraphResult};
use super::{prefix_scan, EntityStore, TABLE_ATTACHMENTS, TABLE_ATTACHMENTS_INV};

/// One attachment as seen from the holder side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// The label under which the target is attached.
    pub label: String,
    /// The attached entity.
    pub target: EntityId,
}

/// Attachment storage operations.
pub struct ContextStore;

impl ContextStore {
    /// Attach `target` to `holder` under `label`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EntityNotFound`] if either entity does not
    /// exist, [`GraphError::DuplicateAttachment`] if the exact triple is
    /// already present, or a validation error for a malformed label.
    pub fn attach<T: Transaction>(
        tx: &mut T,
        holder: EntityId,
        label: &str,
        target: EntityId,
    ) -> GraphResult<()> {
        validate_name_token(label).map_err(GraphError::Core)?;
        if !EntityStore::exists(tx, holder)? {
            return Err(GraphError::EntityNotFound(holder));
        }
        if !EntityStore::exists(tx, target)? {
            return Err(GraphError::EntityNotFound(target));
        }

        let forward = attachment_key(holder, label, target);
        if tx.get(TABLE_ATTACHMENTS, &forward)?.is_some() {
            return Err(GraphError::DuplicateAttachment {
                holder,
                label: label.to_owned(),
                target,
            });
        }

        tx.put(TABLE_ATTACHMENTS, &forward, &[])?;
        tx.put(TABLE_ATTACHMENTS_INV, &attachment_key(target, label, holder), &[])?;
        Ok(())
    }

    /// Remove one attachment triple.
    ///
    /// Returns `true` if the attachment existed.
    pub fn detach<T: Transaction>(
        tx: &mut T,
        holder: EntityId,
        label: &str,
        target: EntityId,
    ) -> GraphResult<bool> {
        let removed = tx.delete(TABLE_ATTACHMENTS, &attachment_key(holder, label, target))?;
        if removed {
            tx.delete(TABLE_ATTACHMENTS_INV, &attachment_key(target, label, holder))?;
        }
        Ok(removed)
    }

    /// Remove every attachment `holder` has under `label`.
    ///
    /// Returns the number of attachments removed.
    pub fn detach_label<T: Transaction>(
        tx: &mut T,
        holder: EntityId,
        label: &str,
    ) -> GraphResult<usize> {
        let targets = Self::targets(tx, holder, label)?;
        for target in &targets {
            tx.delete(TABLE_ATTACHMENTS, &attachment_key(holder, label, *target))?;
            tx.delete(TABLE_ATTACHMENTS_INV, &attachment_key(*target, label, holder))?;
        }
        Ok(targets.len())
    }

    /// All attachments held by `holder`, grouped by label and sorted by
    /// target ID within a label.
    pub fn attachments<T: Transaction>(
        tx: &T,
        holder: EntityId,
    ) -> GraphResult<Vec<Attachment>> {
        Self::scan(tx, TABLE_ATTACHMENTS, &attachment_prefix(holder))
    }

    /// The targets `holder` has attached under `label`, in ascending ID
    /// order.
    pub fn targets<T: Transaction>(
        tx: &T,
        holder: EntityId,
        label: &str,
    ) -> GraphResult<Vec<EntityId>> {
        let entries = Self::scan(tx, TABLE_ATTACHMENTS, &attachment_label_prefix(holder, label))?;
        Ok(entries.into_iter().map(|a| a.target).collect())
    }

    /// All entities holding an attachment to `target`, with the label each
    /// one uses.
    pub fn holders<T: Transaction>(tx: &T, target: EntityId) -> GraphResult<Vec<Attachment>> {
        Self::scan(tx, TABLE_ATTACHMENTS_INV, &attachment_prefix(target))
    }

    /// The union of attachment partners of `entity`, in both directions,
    /// deduplicated and in ascending ID order.
    pub fn related<T: Transaction>(tx: &T, entity: EntityId) -> GraphResult<Vec<EntityId>> {
        let mut related: Vec<EntityId> =
            Self::attachments(tx, entity)?.into_iter().map(|a| a.target).collect();
        related.extend(Self::holders(tx, entity)?.into_iter().map(|a| a.target));
        related.sort_unstable();
        related.dedup();
        Ok(related)
    }

    /// The distinct labels `holder` uses, in sorted order.
    ///
    /// Scan order groups equal labels but sorts by length before content,
    /// so the result is re-sorted lexicographically.
    pub fn labels<T: Transaction>(tx: &T, holder: EntityId) -> GraphResult<Vec<String>> {
        let mut labels: Vec<String> = Self::attachments(tx, holder)?
            .into_iter()
            .map(|a| a.label)
            .collect();
        labels.sort_unstable();
        labels.dedup();
        Ok(labels)
    }

    /// Remove every attachment touching `entity`, in both directions. Used
    /// when deleting an entity.
    pub(crate) fn detach_entity<T: Transaction>(tx: &mut T, entity: EntityId) -> GraphResult<()> {
        for held in Self::scan(tx, TABLE_ATTACHMENTS, &attachment_prefix(entity))? {
            tx.delete(TABLE_ATTACHMENTS, &attachment_key(entity, &held.label, held.target))?;
            tx.delete(
                TABLE_ATTACHMENTS_INV,
                &attachment_key(held.target, &held.label, entity),
            )?;
        }
        for incoming in Self::scan(tx, TABLE_ATTACHMENTS_INV, &attachment_prefix(entity))? {
            tx.delete(
                TABLE_ATTACHMENTS,
                &attachment_key(incoming.target, &incoming.label, entity),
            )?;
            tx.delete(
                TABLE_ATTACHMENTS_INV,
                &attachment_key(entity, &incoming.label, incoming.target),
            )?;
        }
        Ok(())
    }

    /// Collect `(label, other)` pairs under `prefix` in `table`. Both
    /// attachment tables share the key layout, so the same decode serves
    /// holder scans and target scans.
    fn scan<T: Transaction>(tx: &T, table: &str, prefix: &[u8]) -> GraphResult<Vec<Attachment>> {
        let mut cursor = prefix_scan(tx, table, prefix)?;
        let mut attachments = Vec::new();
        while let Some((key, _)) = cursor.next()? {
            if let Some((label, other)) = decode_attachment_key(&key) {
                attachments.push(Attachment {
                    label: label.to_owned(),
                    target: other,
                });
            }
        }
        Ok(attachments)
    }
}
