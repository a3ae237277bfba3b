//! # Epoch Store
//!
//! Persistent epoch-sync state under the `epoch_sync/` prefix:
//!
//! | Key | Value |
//! |-----|-------|
//! | `epoch_sync/params` | [`Params`] |
//! | `epoch_sync/current_epoch` | committed [`Epoch`] |
//! | `epoch_sync/last_validator_set` | last applied [`ValidatorSetSnapshot`] |
//!
//! The store holds no state of its own; every call receives the store handle.

use crate::types::Params;
use shared_types::codec;
use shared_types::{Epoch, KeyValueStore, StoreError, ValidatorSetSnapshot};

pub const KEY_PREFIX: &[u8] = b"epoch_sync/";
const PARAMS_KEY: &[u8] = b"epoch_sync/params";
const CURRENT_EPOCH_KEY: &[u8] = b"epoch_sync/current_epoch";
const LAST_VALIDATOR_SET_KEY: &[u8] = b"epoch_sync/last_validator_set";

pub struct EpochStore;

impl EpochStore {
    /// Committed epoch; 0 when nothing was committed yet.
    pub fn current_epoch(store: &dyn KeyValueStore) -> Result<Epoch, StoreError> {
        Ok(codec::load(store, CURRENT_EPOCH_KEY)?.unwrap_or(0))
    }

    pub fn set_current_epoch(store: &mut dyn KeyValueStore, epoch: Epoch) -> Result<(), StoreError> {
        codec::save(store, CURRENT_EPOCH_KEY, &epoch)
    }

    /// Last applied snapshot; an empty set at epoch 0 before genesis.
    pub fn last_validator_set(store: &dyn KeyValueStore) -> Result<ValidatorSetSnapshot, StoreError> {
        Ok(codec::load(store, LAST_VALIDATOR_SET_KEY)?.unwrap_or_default())
    }

    pub fn set_last_validator_set(
        store: &mut dyn KeyValueStore,
        snapshot: &ValidatorSetSnapshot,
    ) -> Result<(), StoreError> {
        codec::save(store, LAST_VALIDATOR_SET_KEY, snapshot)
    }

    /// Stored params, falling back to defaults before genesis.
    pub fn params(store: &dyn KeyValueStore) -> Result<Params, StoreError> {
        Ok(codec::load(store, PARAMS_KEY)?.unwrap_or_default())
    }

    pub fn set_params(store: &mut dyn KeyValueStore, params: &Params) -> Result<(), StoreError> {
        codec::save(store, PARAMS_KEY, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ConsensusPubKey, InMemoryKVStore, ValidatorRecord};

    #[test]
    fn test_defaults_before_genesis() {
        let store = InMemoryKVStore::new();
        assert_eq!(EpochStore::current_epoch(&store).unwrap(), 0);
        assert!(EpochStore::last_validator_set(&store).unwrap().is_empty());
        assert_eq!(EpochStore::params(&store).unwrap(), Params::default());
    }

    #[test]
    fn test_persist_epoch_and_snapshot() {
        let mut store = InMemoryKVStore::new();
        EpochStore::set_current_epoch(&mut store, 12).unwrap();

        let snapshot = ValidatorSetSnapshot::new(
            12,
            vec![ValidatorRecord::new(ConsensusPubKey::ed25519([4; 32]), 100)],
        );
        EpochStore::set_last_validator_set(&mut store, &snapshot).unwrap();

        assert_eq!(EpochStore::current_epoch(&store).unwrap(), 12);
        assert_eq!(EpochStore::last_validator_set(&store).unwrap(), snapshot);
    }

    #[test]
    fn test_corrupted_epoch_is_an_error() {
        let mut store = InMemoryKVStore::new();
        store.put(CURRENT_EPOCH_KEY, &[0xff]).unwrap();
        assert!(matches!(
            EpochStore::current_epoch(&store),
            Err(StoreError::Corrupted { .. })
        ));
    }
}
