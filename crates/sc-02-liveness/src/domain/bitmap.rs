//! # Missed-Block Bitmap
//!
//! One bit per window slot, set when the validator missed the block recorded
//! in that slot. Bits live in fixed chunks of [`CHUNK_BITS`] stored as raw
//! bytes under `liveness/bitmap/<hex address>/<chunk index, big-endian u64>`.
//! Chunks that were never written read as all zeros.

use bitvec::prelude::*;
use shared_types::codec::display_key;
use shared_types::{ConsAddress, KeyValueStore, StoreError};

/// Bits per stored chunk.
pub const CHUNK_BITS: u64 = 1024;
const CHUNK_BYTES: usize = (CHUNK_BITS / 8) as usize;

const BITMAP_PREFIX: &str = "liveness/bitmap/";

type Chunk = BitVec<u8, Lsb0>;

fn validator_prefix(address: &ConsAddress) -> Vec<u8> {
    format!("{}{}/", BITMAP_PREFIX, address).into_bytes()
}

fn chunk_key(address: &ConsAddress, chunk: u64) -> Vec<u8> {
    let mut key = validator_prefix(address);
    key.extend_from_slice(&chunk.to_be_bytes());
    key
}

fn decode_chunk(key: &[u8], bytes: Vec<u8>) -> Result<Chunk, StoreError> {
    if bytes.len() != CHUNK_BYTES {
        return Err(StoreError::Corrupted {
            key: display_key(key),
            message: format!("bitmap chunk has {} bytes, expected {}", bytes.len(), CHUNK_BYTES),
        });
    }
    Ok(Chunk::from_vec(bytes))
}

fn load_chunk(store: &dyn KeyValueStore, key: &[u8]) -> Result<Chunk, StoreError> {
    match store.get(key)? {
        Some(bytes) => decode_chunk(key, bytes),
        None => Ok(bitvec![u8, Lsb0; 0; CHUNK_BITS as usize]),
    }
}

fn split(index: u64) -> (u64, usize) {
    (index / CHUNK_BITS, (index % CHUNK_BITS) as usize)
}

/// Accessors for the per-validator bitmap.
pub struct MissedBlockBitmap;

impl MissedBlockBitmap {
    /// Whether slot `index` is marked missed.
    pub fn get(store: &dyn KeyValueStore, address: &ConsAddress, index: u64) -> Result<bool, StoreError> {
        let (chunk, bit) = split(index);
        let key = chunk_key(address, chunk);
        Ok(load_chunk(store, &key)?[bit])
    }

    /// Mark slot `index` as missed or signed.
    pub fn set(
        store: &mut dyn KeyValueStore,
        address: &ConsAddress,
        index: u64,
        missed: bool,
    ) -> Result<(), StoreError> {
        let (chunk, bit) = split(index);
        let key = chunk_key(address, chunk);
        let mut bits = load_chunk(store, &key)?;
        bits.set(bit, missed);
        store.put(&key, bits.as_raw_slice())
    }

    /// Indices of all missed slots in ascending order.
    pub fn missed_indices(store: &dyn KeyValueStore, address: &ConsAddress) -> Result<Vec<u64>, StoreError> {
        let prefix = validator_prefix(address);
        let mut out = Vec::new();
        for (key, bytes) in store.prefix_scan(&prefix)? {
            let suffix = &key[prefix.len()..];
            let chunk: [u8; 8] = suffix.try_into().map_err(|_| StoreError::Corrupted {
                key: display_key(&key),
                message: "bitmap chunk key has no chunk index".to_string(),
            })?;
            let base = u64::from_be_bytes(chunk) * CHUNK_BITS;
            let bits = decode_chunk(&key, bytes)?;
            out.extend(bits.iter_ones().map(|bit| base + bit as u64));
        }
        Ok(out)
    }

    /// Drop every chunk of a validator.
    pub fn clear(store: &mut dyn KeyValueStore, address: &ConsAddress) -> Result<(), StoreError> {
        for (key, _) in store.prefix_scan(&validator_prefix(address))? {
            store.delete(&key)?;
        }
        Ok(())
    }
}
