//! Fixture-driven in-process registry.
//!
//! Stands in for the live registry when none is configured. The fixture is a
//! JSON object mapping epochs to hex-encoded ed25519 private keys:
//!
//! ```json
//! { "0": ["<hex key>", "<hex key>"], "10": ["<hex key>"] }
//! ```
//!
//! The set for epoch `E` is the entry with the greatest epoch `<= E`. Keys may
//! be 32-byte seeds or 64-byte `seed || public` keypairs; empty strings are
//! skipped.

use crate::domain::{ChainEpochInfo, RegistryKey, RegistryValidator, RegistryValidatorSet, SignReceipt};
use crate::error::RegistryError;
use crate::ports::outbound::RegistryClient;
use crate::types::DEFAULT_VALIDATOR_KEY_TAG;
use async_trait::async_trait;
use ed25519_dalek::{SigningKey, VerifyingKey};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use shared_types::Epoch;
use std::collections::BTreeMap;
use std::path::Path;

/// Voting power assigned to every fixture validator.
pub const FIXTURE_VOTING_POWER: &str = "10000";

/// The reported epoch moves forward by this much whenever a set at or beyond
/// it is requested.
pub const FIXTURE_EPOCH_STEP: Epoch = 5;

pub struct FixtureRegistryClient {
    sets: BTreeMap<Epoch, Vec<VerifyingKey>>,
    current_epoch: Mutex<Epoch>,
}

fn fixture_error(reason: impl Into<String>) -> RegistryError {
    RegistryError::Fixture {
        reason: reason.into(),
    }
}

fn parse_key(epoch: Epoch, hex_key: &str) -> Result<VerifyingKey, RegistryError> {
    let bytes = hex::decode(hex_key.trim_start_matches("0x"))
        .map_err(|e| fixture_error(format!("epoch {}: invalid hex key: {}", epoch, e)))?;

    let signing = match bytes.len() {
        32 => {
            let mut seed = [0u8; 32];
            seed.copy_from_slice(&bytes);
            SigningKey::from_bytes(&seed)
        }
        64 => {
            let mut keypair = [0u8; 64];
            keypair.copy_from_slice(&bytes);
            SigningKey::from_keypair_bytes(&keypair)
                .map_err(|e| fixture_error(format!("epoch {}: inconsistent keypair: {}", epoch, e)))?
        }
        n => {
            return Err(fixture_error(format!(
                "epoch {}: expected 32 or 64 key bytes, got {}",
                epoch, n
            )))
        }
    };

    Ok(signing.verifying_key())
}

impl FixtureRegistryClient {
    /// Parse fixture JSON.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let raw: BTreeMap<Epoch, Vec<String>> =
            serde_json::from_str(json).map_err(|e| fixture_error(e.to_string()))?;

        let mut sets = BTreeMap::new();
        for (epoch, keys) in raw {
            let parsed = keys
                .iter()
                .filter(|k| !k.is_empty())
                .map(|k| parse_key(epoch, k))
                .collect::<Result<Vec<_>, _>>()?;
            sets.insert(epoch, parsed);
        }

        tracing::info!(
            "[sc-01] Loaded registry fixture with {} epoch entries",
            sets.len()
        );

        Ok(Self {
            sets,
            current_epoch: Mutex::new(0),
        })
    }

    /// Load a fixture file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| fixture_error(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    fn validators_for(&self, epoch: Epoch) -> Vec<RegistryValidator> {
        let keys = self
            .sets
            .range(..=epoch)
            .next_back()
            .map(|(_, keys)| keys.as_slice())
            .unwrap_or_default();

        keys.iter()
            .enumerate()
            .map(|(i, key)| RegistryValidator {
                operator: format!("0xValidator{}", i),
                voting_power: FIXTURE_VOTING_POWER.to_string(),
                is_active: true,
                keys: vec![RegistryKey {
                    tag: DEFAULT_VALIDATOR_KEY_TAG,
                    payload: key.to_bytes().to_vec(),
                }],
            })
            .collect()
    }
}

#[async_trait]
impl RegistryClient for FixtureRegistryClient {
    async fn get_current_epoch(&self) -> Result<Epoch, RegistryError> {
        Ok(*self.current_epoch.lock())
    }

    async fn get_validator_set(&self, epoch: Epoch) -> Result<RegistryValidatorSet, RegistryError> {
        {
            let mut current = self.current_epoch.lock();
            if *current <= epoch {
                *current += FIXTURE_EPOCH_STEP;
            }
        }
        Ok(RegistryValidatorSet {
            epoch,
            validators: self.validators_for(epoch),
        })
    }

    async fn get_last_all_committed(&self) -> Result<Vec<ChainEpochInfo>, RegistryError> {
        Ok(vec![ChainEpochInfo {
            last_committed_epoch: *self.current_epoch.lock(),
        }])
    }

    async fn sign_message(
        &self,
        _key_tag: u32,
        message: Vec<u8>,
    ) -> Result<SignReceipt, RegistryError> {
        let digest = Sha256::digest(&message);
        Ok(SignReceipt {
            request_hash: format!("0x{}", hex::encode(digest)),
            epoch: *self.current_epoch.lock(),
        })
    }
}
