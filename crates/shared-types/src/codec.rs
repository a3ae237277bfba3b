//! # Persistence Codec
//!
//! The serialization boundary for everything written to a `KeyValueStore`.
//! Bincode with varint integers; trailing bytes are rejected so that a value
//! decodes to exactly one representation.

use crate::errors::StoreError;
use crate::store::KeyValueStore;
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

fn options() -> impl Options {
    bincode::DefaultOptions::new().reject_trailing_bytes()
}

/// Printable form of a store key for error messages.
pub fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

/// Encode a value with the persistence codec.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, bincode::Error> {
    options().serialize(value)
}

/// Decode a value with the persistence codec.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, bincode::Error> {
    options().deserialize(bytes)
}

/// Read and decode the value under `key`, if any.
pub fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &[u8],
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        None => Ok(None),
        Some(bytes) => decode(&bytes).map(Some).map_err(|e| StoreError::Corrupted {
            key: display_key(key),
            message: e.to_string(),
        }),
    }
}

/// Encode `value` and write it under `key`.
pub fn save<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &[u8],
    value: &T,
) -> Result<(), StoreError> {
    let bytes = encode(value).map_err(|e| StoreError::Encode {
        key: display_key(key),
        message: e.to_string(),
    })?;
    store.put(key, &bytes)
}
