//! Driving Ports (API - Inbound)

use crate::domain::{Infraction, ProposalStatus};
use crate::error::EpochSyncResult;
use crate::types::Params;
use async_trait::async_trait;
use shared_types::{Epoch, Height, KeyValueStore, Ratio, ValidatorRecord, ValidatorSetSnapshot};

/// Block lifecycle entry points called by the consensus engine.
///
/// Every call receives the store handle for the block being processed.
#[async_trait]
pub trait EpochSyncApi: Send + Sync {
    /// Propose phase. Prepends an epoch claim at boundary heights; never
    /// fails because of the registry.
    async fn prepare_proposal(
        &self,
        store: &dyn KeyValueStore,
        height: Height,
        txs: Vec<Vec<u8>>,
    ) -> EpochSyncResult<Vec<Vec<u8>>>;

    /// Verify phase. Deterministic in the payload and committed state.
    fn process_proposal(
        &self,
        store: &dyn KeyValueStore,
        height: Height,
        txs: &[Vec<u8>],
    ) -> EpochSyncResult<ProposalStatus>;

    /// Commit phase. Returns the epoch written, if any.
    fn pre_block(
        &self,
        store: &mut dyn KeyValueStore,
        height: Height,
        txs: &[Vec<u8>],
    ) -> EpochSyncResult<Option<Epoch>>;

    /// Applies a new validator set when the committed epoch moved and returns
    /// the consensus updates (updated, added, removed).
    async fn end_block(
        &self,
        store: &mut dyn KeyValueStore,
        height: Height,
    ) -> EpochSyncResult<Vec<ValidatorRecord>>;

    /// Governance-gated params replacement.
    fn update_params(
        &self,
        store: &mut dyn KeyValueStore,
        authority: &str,
        params: Params,
    ) -> EpochSyncResult<()>;

    /// Submit slashing evidence for signing; returns the request hash.
    async fn slash_with_infraction_reason(
        &self,
        store: &dyn KeyValueStore,
        validator_pub_key: &[u8],
        infraction_height: Height,
        power: i64,
        slash_factor: Ratio,
        infraction: Infraction,
    ) -> EpochSyncResult<String>;
}

/// Read-only queries.
pub trait EpochSyncQuery: Send + Sync {
    fn current_epoch(&self, store: &dyn KeyValueStore) -> EpochSyncResult<Epoch>;

    fn last_validator_set(&self, store: &dyn KeyValueStore) -> EpochSyncResult<ValidatorSetSnapshot>;

    fn params(&self, store: &dyn KeyValueStore) -> EpochSyncResult<Params>;

    /// Visit the last applied set in order until `f` returns `true`.
    fn iterate_validators(
        &self,
        store: &dyn KeyValueStore,
        f: &mut dyn FnMut(usize, &ValidatorRecord) -> bool,
    ) -> EpochSyncResult<()>;
}
