//! Binary record encoding for stored types.
//!
//! Records are encoded as a format-version byte followed by a bincode
//! payload of the serde representation. [`Entity`] and [`EntityType`] share
//! the layout; the version byte is checked on decode so a later format can
//! evolve without misreading old rows.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::{Entity, EntityType};

use super::traits::{Decoder, Encoder, FORMAT_VERSION};

fn encode_record<T: Serialize>(value: &T, buf: &mut Vec<u8>) -> Result<(), CoreError> {
    buf.push(FORMAT_VERSION);
    let payload = bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| CoreError::Encoding(e.to_string()))?;
    buf.extend_from_slice(&payload);
    Ok(())
}

fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CoreError> {
    let Some((&version, payload)) = bytes.split_first() else {
        return Err(CoreError::Encoding("unexpected end of input".to_owned()));
    };
    if version != FORMAT_VERSION {
        return Err(CoreError::Encoding(format!(
            "unsupported format version: {version}, expected {FORMAT_VERSION}"
        )));
    }
    let (value, consumed) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .map_err(|e| CoreError::Encoding(e.to_string()))?;
    if consumed != payload.len() {
        return Err(CoreError::Encoding("trailing bytes after record".to_owned()));
    }
    Ok(value)
}

impl Encoder for Entity {
    fn encode(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        self.encode_to(&mut buf)?;
        Ok(buf)
    }

    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<(), CoreError> {
        encode_record(self, buf)
    }
}

impl Decoder for Entity {
    fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        decode_record(bytes)
    }
}

impl Encoder for EntityType {
    fn encode(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        self.encode_to(&mut buf)?;
        Ok(buf)
    }

    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<(), CoreError> {
        encode_record(self, buf)
    }
}

impl Decoder for EntityType {
    fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        decode_record(bytes)
    }
}
