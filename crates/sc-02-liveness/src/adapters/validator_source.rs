//! Validator set sources for genesis import.

use crate::error::{LivenessError, LivenessResult};
use crate::ports::outbound::ValidatorSetSource;
use sc_01_epoch_sync::EpochSyncQuery;
use shared_types::{KeyValueStore, ValidatorRecord};
use std::sync::Arc;

/// Reads the last validator set applied by Epoch Sync.
pub struct EpochSyncValidatorSource<Q: EpochSyncQuery> {
    query: Arc<Q>,
}

impl<Q: EpochSyncQuery> EpochSyncValidatorSource<Q> {
    pub fn new(query: Arc<Q>) -> Self {
        Self { query }
    }
}

impl<Q: EpochSyncQuery> ValidatorSetSource for EpochSyncValidatorSource<Q> {
    fn bonded_validators(&self, store: &dyn KeyValueStore) -> LivenessResult<Vec<ValidatorRecord>> {
        let mut bonded = Vec::new();
        self.query
            .iterate_validators(store, &mut |_, record| {
                if record.power > 0 {
                    bonded.push(record.clone());
                }
                false
            })
            .map_err(|e| LivenessError::ValidatorSource {
                reason: e.to_string(),
            })?;
        Ok(bonded)
    }
}

/// Fixed validator list.
#[derive(Clone, Debug, Default)]
pub struct StaticValidatorSource(pub Vec<ValidatorRecord>);

impl ValidatorSetSource for StaticValidatorSource {
    fn bonded_validators(&self, _store: &dyn KeyValueStore) -> LivenessResult<Vec<ValidatorRecord>> {
        Ok(self.0.clone())
    }
}
