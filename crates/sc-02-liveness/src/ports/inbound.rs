//! Driving Ports (API - Inbound)

use crate::domain::ValidatorSigningInfo;
use crate::error::LivenessResult;
use crate::ports::outbound::ValidatorSetSource;
use crate::types::{GenesisState, MissedBlock, Params};
use shared_types::{ConsAddress, ConsensusPubKey, Height, KeyValueStore};

/// Result of recording one signature observation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureOutcome {
    pub address: ConsAddress,
    /// `false` when the validator is tombstoned and nothing was recorded.
    pub recorded: bool,
    pub index_offset: u64,
    pub missed_blocks_counter: u64,
    /// Missed fraction over the observed window exceeds the allowed limit.
    pub downtime: bool,
}

/// State-changing liveness operations.
pub trait LivenessApi: Send + Sync {
    /// Import genesis at `height`. Every validator reported by `validators`
    /// gets fresh signing info before the listed entries are applied.
    fn init_genesis(
        &self,
        store: &mut dyn KeyValueStore,
        height: Height,
        validators: &dyn ValidatorSetSource,
        genesis: &GenesisState,
    ) -> LivenessResult<()>;

    fn export_genesis(&self, store: &dyn KeyValueStore) -> LivenessResult<GenesisState>;

    /// Record whether `address` signed the current block.
    fn handle_validator_signature(
        &self,
        store: &mut dyn KeyValueStore,
        address: &ConsAddress,
        signed: bool,
    ) -> LivenessResult<SignatureOutcome>;

    /// Governance-gated, all-or-nothing params replacement. A new window
    /// restarts every validator's missed-block history.
    fn update_params(
        &self,
        store: &mut dyn KeyValueStore,
        authority: &str,
        params: Params,
    ) -> LivenessResult<()>;
}

/// Read-only queries.
pub trait LivenessQuery: Send + Sync {
    fn params(&self, store: &dyn KeyValueStore) -> LivenessResult<Params>;

    fn signing_info(
        &self,
        store: &dyn KeyValueStore,
        address: &ConsAddress,
    ) -> LivenessResult<Option<ValidatorSigningInfo>>;

    fn signing_infos(&self, store: &dyn KeyValueStore) -> LivenessResult<Vec<ValidatorSigningInfo>>;

    fn pub_key(
        &self,
        store: &dyn KeyValueStore,
        address: &ConsAddress,
    ) -> LivenessResult<Option<ConsensusPubKey>>;

    /// Missed slots of one validator, ascending.
    fn missed_blocks(
        &self,
        store: &dyn KeyValueStore,
        address: &ConsAddress,
    ) -> LivenessResult<Vec<MissedBlock>>;
}
