//! Named binary payloads per entity.
//!
//! Each entity can carry any number of named blobs, such as raw measurement
//! files. Blobs are stored as versioned records holding an optional
//! mimetype next to the bytes, keyed by entity ID plus name so one prefix
//! scan lists an entity's payloads.

use arbordb_core::encoding::keys::{data_key, data_prefix, decode_data_key};
use arbordb_core::encoding::{Decoder, Encoder, FORMAT_VERSION};
use arbordb_core::types::validate_name_token;
use arbordb_core::{CoreError, EntityId};
use arbordb_storage::{Cursor, Transaction};
use serde::{Deserialize, Serialize};

use super::error::{GraphError, GraphResult};
use super::{prefix_scan, EntityStore, TABLE_DATA};

/// A stored binary payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    /// Declared media type of the payload, if any.
    pub mimetype: Option<String>,
    /// The payload bytes.
    pub bytes: Vec<u8>,
}

/// Summary of a stored payload, without its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataInfo {
    /// The name the payload is stored under.
    pub name: String,
    /// Declared media type, if any.
    pub mimetype: Option<String>,
    /// Payload size in bytes.
    pub size: usize,
}

impl Encoder for DataRecord {
    fn encode(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        self.encode_to(&mut buf)?;
        Ok(buf)
    }

    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<(), CoreError> {
        buf.push(FORMAT_VERSION);
        let payload = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| CoreError::Encoding(e.to_string()))?;
        buf.extend_from_slice(&payload);
        Ok(())
    }
}

impl Decoder for DataRecord {
    fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        let Some((&version, payload)) = bytes.split_first() else {
            return Err(CoreError::Encoding("unexpected end of input".to_owned()));
        };
        if version != FORMAT_VERSION {
            return Err(CoreError::Encoding(format!(
                "unsupported format version: {version}, expected {FORMAT_VERSION}"
            )));
        }
        let (record, consumed) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard())
                .map_err(|e| CoreError::Encoding(e.to_string()))?;
        if consumed != payload.len() {
            return Err(CoreError::Encoding("trailing bytes after record".to_owned()));
        }
        Ok(record)
    }
}

/// Binary payload storage operations.
pub struct DataStore;

impl DataStore {
    /// Store a payload under `name` for `entity`, replacing any existing
    /// payload with that name.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EntityNotFound`] if the entity does not exist,
    /// or a validation error for a malformed name.
    pub fn put<T: Transaction>(
        tx: &mut T,
        entity: EntityId,
        name: &str,
        record: &DataRecord,
    ) -> GraphResult<()> {
        validate_name_token(name).map_err(GraphError::Core)?;
        if !EntityStore::exists(tx, entity)? {
            return Err(GraphError::EntityNotFound(entity));
        }
        tx.put(TABLE_DATA, &data_key(entity, name), &record.encode()?)?;
        Ok(())
    }

    /// Load the payload stored under `name` for `entity`.
    pub fn get<T: Transaction>(
        tx: &T,
        entity: EntityId,
        name: &str,
    ) -> GraphResult<Option<DataRecord>> {
        match tx.get(TABLE_DATA, &data_key(entity, name))? {
            Some(value) => Ok(Some(DataRecord::decode(&value)?)),
            None => Ok(None),
        }
    }

    /// Summarize the payload stored under `name` without copying its bytes
    /// out.
    pub fn info<T: Transaction>(
        tx: &T,
        entity: EntityId,
        name: &str,
    ) -> GraphResult<Option<DataInfo>> {
        match Self::get(tx, entity, name)? {
            Some(record) => Ok(Some(DataInfo {
                name: name.to_owned(),
                mimetype: record.mimetype,
                size: record.bytes.len(),
            })),
            None => Ok(None),
        }
    }

    /// Summaries of all payloads stored for `entity`.
    pub fn list<T: Transaction>(tx: &T, entity: EntityId) -> GraphResult<Vec<DataInfo>> {
        let mut cursor = prefix_scan(tx, TABLE_DATA, &data_prefix(entity))?;
        let mut infos = Vec::new();
        while let Some((key, value)) = cursor.next()? {
            if let Some(name) = decode_data_key(&key) {
                let record = DataRecord::decode(&value)?;
                infos.push(DataInfo {
                    name: name.to_owned(),
                    mimetype: record.mimetype,
                    size: record.bytes.len(),
                });
            }
        }
        Ok(infos)
    }

    /// Delete the payload stored under `name`.
    ///
    /// Returns `true` if a payload was deleted.
    pub fn delete<T: Transaction>(tx: &mut T, entity: EntityId, name: &str) -> GraphResult<bool> {
        Ok(tx.delete(TABLE_DATA, &data_key(entity, name))?)
    }

    /// Delete every payload stored for `entity`. Used when deleting an
    /// entity.
    pub(crate) fn delete_all<T: Transaction>(tx: &mut T, entity: EntityId) -> GraphResult<()> {
        let names: Vec<String> = Self::list(tx, entity)?.into_iter().map(|i| i.name).collect();
        for name in names {
            tx.delete(TABLE_DATA, &data_key(entity, &name))?;
        }
        Ok(())
    }
}
