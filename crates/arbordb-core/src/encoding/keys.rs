//! Key encoding for ordered storage.
//!
//! This module provides composite-key encoding that preserves sort order for
//! range queries in key-value storage backends. Keys are table-agnostic: the
//! storage layer partitions the keyspace into named logical tables, and the
//! encoders here produce the key bytes used within one table.
//!
//! # Key layouts
//!
//! - Entity: `[entity_id]`
//! - Unique-id index: `[uid bytes]`
//! - Type index: `[type_id][entity_id]`
//! - Parent edge (child to parent): `[child_id]`
//! - Children index: `[parent_id][child_id]`
//! - Attachment: `[holder_id][len:u16][label][target_id]`
//! - Reverse attachment: `[target_id][len:u16][label][holder_id]`
//! - Data blob: `[entity_id][len:u16][name]`
//!
//! All numeric values are encoded big-endian so byte order matches numeric
//! order. Labels and blob names are embedded length-prefixed rather than
//! hashed, so scans can recover them without a side lookup.

use crate::types::{EntityId, TypeId};

/// Compute the FNV-1a hash of a string.
///
/// Used to derive stable identifiers from declared names, most notably the
/// identity of a registered entity type.
#[inline]
#[must_use]
pub fn hash_str(s: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in s.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Append a length-prefixed string to a key.
///
/// The length is a big-endian `u16`; names longer than `u16::MAX` bytes are
/// truncated at the limit, which callers rule out by validating tokens first.
fn push_str(key: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    let len = u16::try_from(bytes.len()).unwrap_or(u16::MAX);
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(&bytes[..usize::from(len)]);
}

/// Read a length-prefixed string starting at `offset`.
///
/// Returns the string and the offset past it, or `None` if the key is
/// malformed.
fn read_str(key: &[u8], offset: usize) -> Option<(&str, usize)> {
    let len_bytes: [u8; 2] = key.get(offset..offset + 2)?.try_into().ok()?;
    let len = usize::from(u16::from_be_bytes(len_bytes));
    let start = offset + 2;
    let s = std::str::from_utf8(key.get(start..start + len)?).ok()?;
    Some((s, start + len))
}

/// Read a big-endian `u64` starting at `offset`.
fn read_u64(key: &[u8], offset: usize) -> Option<u64> {
    let bytes: [u8; 8] = key.get(offset..offset + 8)?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Encode an entity ID as a storage key: `[entity_id]`.
#[inline]
#[must_use]
pub fn entity_key(id: EntityId) -> Vec<u8> {
    id.as_u64().to_be_bytes().to_vec()
}

/// Decode an entity ID from an entity key.
#[inline]
#[must_use]
pub fn decode_entity_key(key: &[u8]) -> Option<EntityId> {
    if key.len() != 8 {
        return None;
    }
    read_u64(key, 0).map(EntityId::new)
}

/// Encode a type ID as a storage key: `[type_id]`.
#[inline]
#[must_use]
pub fn type_key(id: TypeId) -> Vec<u8> {
    id.as_u64().to_be_bytes().to_vec()
}

/// Encode a unique-id index key: the UTF-8 bytes of the unique id.
#[inline]
#[must_use]
pub fn unique_id_key(unique_id: &str) -> Vec<u8> {
    unique_id.as_bytes().to_vec()
}

/// Encode a type-index key: `[type_id][entity_id]`.
///
/// Entries for one type are contiguous and sorted by entity ID, so a prefix
/// scan yields a type's members in ascending ID order.
#[must_use]
pub fn type_index_key(type_id: TypeId, entity_id: EntityId) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&type_id.as_u64().to_be_bytes());
    key.extend_from_slice(&entity_id.as_u64().to_be_bytes());
    key
}

/// Encode a prefix for scanning all members of a type.
#[inline]
#[must_use]
pub fn type_index_prefix(type_id: TypeId) -> Vec<u8> {
    type_id.as_u64().to_be_bytes().to_vec()
}

/// Decode the entity ID from a type-index key.
#[inline]
#[must_use]
pub fn decode_type_index_key(key: &[u8]) -> Option<EntityId> {
    if key.len() != 16 {
        return None;
    }
    read_u64(key, 8).map(EntityId::new)
}

/// Encode a child-to-parent edge key: `[child_id]`.
///
/// Each child has at most one parent, so the child ID alone is the key.
#[inline]
#[must_use]
pub fn parent_key(child: EntityId) -> Vec<u8> {
    child.as_u64().to_be_bytes().to_vec()
}

/// Encode a children-index key: `[parent_id][child_id]`.
#[must_use]
pub fn children_key(parent: EntityId, child: EntityId) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&parent.as_u64().to_be_bytes());
    key.extend_from_slice(&child.as_u64().to_be_bytes());
    key
}

/// Encode a prefix for scanning the children of a parent.
#[inline]
#[must_use]
pub fn children_prefix(parent: EntityId) -> Vec<u8> {
    parent.as_u64().to_be_bytes().to_vec()
}

/// Decode the child ID from a children-index key.
#[inline]
#[must_use]
pub fn decode_children_key(key: &[u8]) -> Option<EntityId> {
    if key.len() != 16 {
        return None;
    }
    read_u64(key, 8).map(EntityId::new)
}

/// Encode an attachment key: `[holder_id][len:u16][label][target_id]`.
///
/// Attachments for one holder group together; within a holder, entries group
/// by label and sort by target ID.
#[must_use]
pub fn attachment_key(holder: EntityId, label: &str, target: EntityId) -> Vec<u8> {
    let mut key = Vec::with_capacity(18 + label.len());
    key.extend_from_slice(&holder.as_u64().to_be_bytes());
    push_str(&mut key, label);
    key.extend_from_slice(&target.as_u64().to_be_bytes());
    key
}

/// Encode a prefix for scanning all attachments of a holder.
#[inline]
#[must_use]
pub fn attachment_prefix(holder: EntityId) -> Vec<u8> {
    holder.as_u64().to_be_bytes().to_vec()
}

/// Encode a prefix for scanning a holder's attachments under one label.
#[must_use]
pub fn attachment_label_prefix(holder: EntityId, label: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(10 + label.len());
    key.extend_from_slice(&holder.as_u64().to_be_bytes());
    push_str(&mut key, label);
    key
}

/// Decode the `(label, other_entity)` pair from an attachment key.
///
/// Works for both the forward table (other = target) and the reverse table
/// (other = holder), which share the layout.
#[must_use]
pub fn decode_attachment_key(key: &[u8]) -> Option<(&str, EntityId)> {
    let (label, offset) = read_str(key, 8)?;
    if key.len() != offset + 8 {
        return None;
    }
    let other = read_u64(key, offset).map(EntityId::new)?;
    Some((label, other))
}

/// Encode a data-blob key: `[entity_id][len:u16][name]`.
#[must_use]
pub fn data_key(entity: EntityId, name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(10 + name.len());
    key.extend_from_slice(&entity.as_u64().to_be_bytes());
    push_str(&mut key, name);
    key
}

/// Encode a prefix for scanning all data blobs of an entity.
#[inline]
#[must_use]
pub fn data_prefix(entity: EntityId) -> Vec<u8> {
    entity.as_u64().to_be_bytes().to_vec()
}

/// Decode the blob name from a data key.
#[must_use]
pub fn decode_data_key(key: &[u8]) -> Option<&str> {
    let (name, offset) = read_str(key, 8)?;
    if key.len() != offset {
        return None;
    }
    Some(name)
}

/// Create an exclusive upper bound key by incrementing a prefix.
///
/// The returned key is the smallest key greater than all keys starting with
/// the given prefix. Returns `None` when the prefix is all `0xFF` bytes, in
/// which case no finite exclusive bound exists and the scan must run to the
/// end of the table.
#[must_use]
pub fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut bound = prefix.to_vec();
    let mut i = bound.len();
    while i > 0 {
        i -= 1;
        if bound[i] < 255 {
            bound[i] += 1;
            bound.truncate(i + 1);
            return Some(bound);
        }
    }
    None
}
