//! # Liveness Store
//!
//! Persistent liveness state under the `liveness/` prefix:
//!
//! | Key | Value |
//! |-----|-------|
//! | `liveness/params` | [`Params`] |
//! | `liveness/signing_info/<hex address>` | [`ValidatorSigningInfo`] |
//! | `liveness/pubkey/<hex address>` | [`ConsensusPubKey`] |
//! | `liveness/bitmap/<hex address>/<chunk>` | see [`super::bitmap`] |

use super::signing_info::ValidatorSigningInfo;
use crate::types::Params;
use shared_types::codec::{self, display_key};
use shared_types::{ConsAddress, ConsensusPubKey, KeyValueStore, StoreError};

pub const KEY_PREFIX: &[u8] = b"liveness/";
const PARAMS_KEY: &[u8] = b"liveness/params";
const SIGNING_INFO_PREFIX: &str = "liveness/signing_info/";
const PUBKEY_PREFIX: &str = "liveness/pubkey/";

fn signing_info_key(address: &ConsAddress) -> Vec<u8> {
    format!("{}{}", SIGNING_INFO_PREFIX, address).into_bytes()
}

fn pubkey_key(address: &ConsAddress) -> Vec<u8> {
    format!("{}{}", PUBKEY_PREFIX, address).into_bytes()
}

pub struct LivenessStore;

impl LivenessStore {
    /// Stored params, falling back to defaults before genesis.
    pub fn params(store: &dyn KeyValueStore) -> Result<Params, StoreError> {
        Ok(codec::load(store, PARAMS_KEY)?.unwrap_or_default())
    }

    pub fn set_params(store: &mut dyn KeyValueStore, params: &Params) -> Result<(), StoreError> {
        codec::save(store, PARAMS_KEY, params)
    }

    pub fn signing_info(
        store: &dyn KeyValueStore,
        address: &ConsAddress,
    ) -> Result<Option<ValidatorSigningInfo>, StoreError> {
        codec::load(store, &signing_info_key(address))
    }

    pub fn has_signing_info(store: &dyn KeyValueStore, address: &ConsAddress) -> Result<bool, StoreError> {
        store.exists(&signing_info_key(address))
    }

    pub fn set_signing_info(
        store: &mut dyn KeyValueStore,
        info: &ValidatorSigningInfo,
    ) -> Result<(), StoreError> {
        codec::save(store, &signing_info_key(&info.address), info)
    }

    /// Every signing info, ordered by address.
    pub fn all_signing_infos(store: &dyn KeyValueStore) -> Result<Vec<ValidatorSigningInfo>, StoreError> {
        store
            .prefix_scan(SIGNING_INFO_PREFIX.as_bytes())?
            .into_iter()
            .map(|(key, bytes)| {
                codec::decode(&bytes).map_err(|e| StoreError::Corrupted {
                    key: display_key(&key),
                    message: e.to_string(),
                })
            })
            .collect()
    }

    pub fn pub_key(
        store: &dyn KeyValueStore,
        address: &ConsAddress,
    ) -> Result<Option<ConsensusPubKey>, StoreError> {
        codec::load(store, &pubkey_key(address))
    }

    /// Record the address → pub key relation for a bonded validator.
    pub fn add_pub_key(store: &mut dyn KeyValueStore, pub_key: &ConsensusPubKey) -> Result<(), StoreError> {
        codec::save(store, &pubkey_key(&pub_key.address()), pub_key)
    }

    pub fn delete_pub_key(store: &mut dyn KeyValueStore, address: &ConsAddress) -> Result<(), StoreError> {
        store.delete(&pubkey_key(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::InMemoryKVStore;

    #[test]
    fn test_signing_infos_listed_by_address() {
        let mut store = InMemoryKVStore::new();
        for b in [3u8, 1, 2] {
            let info = ValidatorSigningInfo::new(ConsAddress::new([b; 20]), b as u64);
            LivenessStore::set_signing_info(&mut store, &info).unwrap();
        }
        let heights: Vec<u64> = LivenessStore::all_signing_infos(&store)
            .unwrap()
            .iter()
            .map(|i| i.start_height)
            .collect();
        assert_eq!(heights, vec![1, 2, 3]);
    }

    #[test]
    fn test_pub_key_relation() {
        let mut store = InMemoryKVStore::new();
        let key = ConsensusPubKey::ed25519([5; 32]);
        let address = key.address();

        LivenessStore::add_pub_key(&mut store, &key).unwrap();
        assert_eq!(LivenessStore::pub_key(&store, &address).unwrap(), Some(key));

        LivenessStore::delete_pub_key(&mut store, &address).unwrap();
        assert_eq!(LivenessStore::pub_key(&store, &address).unwrap(), None);
    }

    #[test]
    fn test_params_default_before_genesis() {
        let store = InMemoryKVStore::new();
        assert_eq!(LivenessStore::params(&store).unwrap(), Params::default());
        assert!(!LivenessStore::has_signing_info(&store, &ConsAddress::new([0; 20])).unwrap());
    }
}
