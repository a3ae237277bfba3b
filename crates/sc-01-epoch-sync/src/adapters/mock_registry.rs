//! Scriptable registry for tests.

use crate::domain::{ChainEpochInfo, RegistryKey, RegistryValidator, RegistryValidatorSet, SignReceipt};
use crate::error::RegistryError;
use crate::ports::outbound::RegistryClient;
use crate::types::DEFAULT_VALIDATOR_KEY_TAG;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ConsensusPubKey, Epoch};
use std::collections::BTreeMap;

#[derive(Default)]
struct MockState {
    current_epoch: Epoch,
    sets: BTreeMap<Epoch, Vec<RegistryValidator>>,
    committed: Vec<ChainEpochInfo>,
    fail_committed: bool,
    fail_validator_set: bool,
    signed: Vec<(u32, Vec<u8>)>,
    validator_set_requests: Vec<Epoch>,
}

/// In-memory registry whose answers are set by the test.
#[derive(Default)]
pub struct MockRegistryClient {
    state: Mutex<MockState>,
}

/// A registry record with a single ed25519 key under the default tag.
pub fn registry_validator(operator: &str, pub_key: &ConsensusPubKey, power: i64) -> RegistryValidator {
    RegistryValidator {
        operator: operator.to_string(),
        voting_power: power.to_string(),
        is_active: true,
        keys: vec![RegistryKey {
            tag: DEFAULT_VALIDATOR_KEY_TAG,
            payload: pub_key.as_bytes().to_vec(),
        }],
    }
}

impl MockRegistryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current_epoch(&self, epoch: Epoch) {
        self.state.lock().current_epoch = epoch;
    }

    pub fn set_validators(&self, epoch: Epoch, validators: Vec<RegistryValidator>) {
        self.state.lock().sets.insert(epoch, validators);
    }

    pub fn set_committed(&self, epochs: &[Epoch]) {
        self.state.lock().committed = epochs
            .iter()
            .map(|e| ChainEpochInfo {
                last_committed_epoch: *e,
            })
            .collect();
    }

    pub fn fail_committed(&self, fail: bool) {
        self.state.lock().fail_committed = fail;
    }

    pub fn fail_validator_set(&self, fail: bool) {
        self.state.lock().fail_validator_set = fail;
    }

    /// Messages submitted for signing, with their key tags.
    pub fn signed_messages(&self) -> Vec<(u32, Vec<u8>)> {
        self.state.lock().signed.clone()
    }

    /// Epochs requested through `get_validator_set`, in call order.
    pub fn validator_set_requests(&self) -> Vec<Epoch> {
        self.state.lock().validator_set_requests.clone()
    }
}

fn unavailable() -> RegistryError {
    RegistryError::Transport {
        reason: "mock registry unavailable".to_string(),
    }
}

#[async_trait]
impl RegistryClient for MockRegistryClient {
    async fn get_current_epoch(&self) -> Result<Epoch, RegistryError> {
        Ok(self.state.lock().current_epoch)
    }

    async fn get_validator_set(&self, epoch: Epoch) -> Result<RegistryValidatorSet, RegistryError> {
        let mut state = self.state.lock();
        state.validator_set_requests.push(epoch);
        if state.fail_validator_set {
            return Err(unavailable());
        }
        Ok(RegistryValidatorSet {
            epoch,
            validators: state.sets.get(&epoch).cloned().unwrap_or_default(),
        })
    }

    async fn get_last_all_committed(&self) -> Result<Vec<ChainEpochInfo>, RegistryError> {
        let state = self.state.lock();
        if state.fail_committed {
            return Err(unavailable());
        }
        Ok(state.committed.clone())
    }

    async fn sign_message(
        &self,
        key_tag: u32,
        message: Vec<u8>,
    ) -> Result<SignReceipt, RegistryError> {
        let mut state = self.state.lock();
        let request_hash = format!("0xmock{}", state.signed.len());
        state.signed.push((key_tag, message));
        Ok(SignReceipt {
            request_hash,
            epoch: state.current_epoch,
        })
    }
}
