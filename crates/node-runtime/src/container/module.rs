//! # Validator Module
//!
//! Holds Epoch Sync and Liveness and connects them: Liveness is registered
//! as a validator set listener on Epoch Sync, in the order configured under
//! `[hooks]`.

use super::config::{ConfigError, GovernanceConfig, HooksConfig};
use crate::genesis::NodeGenesis;
use sc_01_epoch_sync::{
    EpochSyncApi, EpochSyncConfig, EpochSyncError, EpochSyncQuery, EpochSyncService,
    HookDispatcher, ProposalStatus, RegistryClient, ValidatorSetHooks,
};
use sc_02_liveness::adapters::EpochSyncValidatorSource;
use sc_02_liveness::{
    LivenessApi, LivenessConfig, LivenessError, LivenessHooks, LivenessTracker,
};
use shared_types::{BufferedStore, ConsAddress, Epoch, Height, KeyValueStore, ValidatorRecord};
use std::sync::Arc;
use thiserror::Error;

/// Name under which Liveness listens to validator set changes.
pub const LIVENESS_HOOK: &str = "liveness";

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error(transparent)]
    EpochSync(#[from] EpochSyncError),

    #[error(transparent)]
    Liveness(#[from] LivenessError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type ModuleResult<T> = Result<T, ModuleError>;

/// One validator's participation in a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vote {
    pub address: ConsAddress,
    pub signed: bool,
}

/// What committing a block changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockOutcome {
    /// Epoch committed by this block's claim.
    pub committed_epoch: Option<Epoch>,
    /// Consensus updates: updated, then added, then removed (power 0).
    pub validator_updates: Vec<ValidatorRecord>,
    /// Validators past the downtime limit after this block.
    pub downtime: Vec<ConsAddress>,
}

/// Builder for [`ValidatorModule`].
pub struct ValidatorModuleBuilder<R: RegistryClient> {
    registry: Arc<R>,
    governance: GovernanceConfig,
    hooks: HooksConfig,
    extra_listeners: Vec<(String, Box<dyn ValidatorSetHooks>)>,
}

impl<R: RegistryClient> ValidatorModuleBuilder<R> {
    pub fn governance(mut self, governance: GovernanceConfig) -> Self {
        self.governance = governance;
        self
    }

    pub fn hooks(mut self, hooks: HooksConfig) -> Self {
        self.hooks = hooks;
        self
    }

    /// Add a listener next to Liveness.
    pub fn listener(mut self, name: impl Into<String>, listener: Box<dyn ValidatorSetHooks>) -> Self {
        self.extra_listeners.push((name.into(), listener));
        self
    }

    pub fn build(self) -> ModuleResult<ValidatorModule<R>> {
        let liveness_hooks: Box<dyn ValidatorSetHooks> = Box::new(LivenessHooks::new());
        let mut listeners = vec![(LIVENESS_HOOK.to_string(), liveness_hooks)];
        listeners.extend(self.extra_listeners);

        let ordered = order_listeners(listeners, &self.hooks.order)?;
        let mut dispatcher = HookDispatcher::new();
        for (name, listener) in ordered {
            dispatcher.register(name, listener)?;
        }
        tracing::info!("Validator set hooks: {:?}", dispatcher.names());

        let epoch_sync = Arc::new(EpochSyncService::new(
            EpochSyncConfig {
                authority: self.governance.authority.clone(),
            },
            self.registry,
        ));
        epoch_sync.set_hooks(dispatcher)?;

        let liveness = Arc::new(LivenessTracker::new(LivenessConfig {
            authority: self.governance.authority,
        }));

        Ok(ValidatorModule {
            epoch_sync,
            liveness,
        })
    }
}

/// Reorder `listeners` to follow `order`. An empty order keeps them as they
/// are; otherwise `order` must name every listener exactly once.
fn order_listeners(
    mut listeners: Vec<(String, Box<dyn ValidatorSetHooks>)>,
    order: &[String],
) -> Result<Vec<(String, Box<dyn ValidatorSetHooks>)>, ConfigError> {
    if order.is_empty() {
        return Ok(listeners);
    }
    if order.len() != listeners.len() {
        let known: Vec<&str> = listeners.iter().map(|(n, _)| n.as_str()).collect();
        return Err(ConfigError::Invalid {
            field: "hooks.order",
            reason: format!("must list every listener exactly once: {:?}", known),
        });
    }

    let mut ordered = Vec::with_capacity(listeners.len());
    for name in order {
        let position = listeners
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| ConfigError::Invalid {
                field: "hooks.order",
                reason: format!("unknown listener \"{}\"", name),
            })?;
        ordered.push(listeners.remove(position));
    }
    Ok(ordered)
}

/// Epoch Sync and Liveness, wired together.
pub struct ValidatorModule<R: RegistryClient> {
    epoch_sync: Arc<EpochSyncService<R>>,
    liveness: Arc<LivenessTracker>,
}

impl<R: RegistryClient> ValidatorModule<R> {
    pub fn builder(registry: Arc<R>) -> ValidatorModuleBuilder<R> {
        ValidatorModuleBuilder {
            registry,
            governance: GovernanceConfig::default(),
            hooks: HooksConfig::default(),
            extra_listeners: Vec::new(),
        }
    }

    pub fn epoch_sync(&self) -> &Arc<EpochSyncService<R>> {
        &self.epoch_sync
    }

    pub fn liveness(&self) -> &Arc<LivenessTracker> {
        &self.liveness
    }

    /// Import genesis for both subsystems and return the initial consensus set.
    pub async fn init_genesis(
        &self,
        store: &mut dyn KeyValueStore,
        height: Height,
        genesis: &NodeGenesis,
    ) -> ModuleResult<Vec<ValidatorRecord>> {
        let validators = self
            .epoch_sync
            .init_genesis(store, &genesis.epoch_sync)
            .await?;

        let source = EpochSyncValidatorSource::new(self.epoch_sync.clone());
        self.liveness
            .init_genesis(store, height, &source, &genesis.liveness)?;

        tracing::info!(
            "Genesis imported: epoch {}, {} validators",
            genesis.epoch_sync.genesis_epoch,
            validators.len()
        );
        Ok(validators)
    }

    pub fn export_genesis(&self, store: &dyn KeyValueStore) -> ModuleResult<NodeGenesis> {
        Ok(NodeGenesis {
            epoch_sync: self.epoch_sync.export_genesis(store)?,
            liveness: self.liveness.export_genesis(store)?,
        })
    }

    /// Propose phase.
    pub async fn prepare_proposal(
        &self,
        store: &dyn KeyValueStore,
        height: Height,
        txs: Vec<Vec<u8>>,
    ) -> ModuleResult<Vec<Vec<u8>>> {
        Ok(self.epoch_sync.prepare_proposal(store, height, txs).await?)
    }

    /// Verify phase.
    pub fn process_proposal(
        &self,
        store: &dyn KeyValueStore,
        height: Height,
        txs: &[Vec<u8>],
    ) -> ModuleResult<ProposalStatus> {
        Ok(self.epoch_sync.process_proposal(store, height, txs)?)
    }

    /// Commit an accepted block: persist the epoch claim, record votes, then
    /// apply a new validator set if the epoch moved.
    ///
    /// All writes are buffered and reach `store` in a single atomic batch.
    /// On error the store is left exactly as it was.
    pub async fn finalize_block(
        &self,
        store: &mut dyn KeyValueStore,
        height: Height,
        txs: &[Vec<u8>],
        votes: &[Vote],
    ) -> ModuleResult<BlockOutcome> {
        let mut buffer = BufferedStore::new(&*store);
        let outcome = match self.apply_block(&mut buffer, height, txs, votes).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    "Block {} aborted, discarding {} buffered writes: {}",
                    height,
                    buffer.pending_len(),
                    e
                );
                return Err(e);
            }
        };

        let batch = buffer.into_batch();
        store
            .atomic_batch_write(batch)
            .map_err(EpochSyncError::from)?;
        Ok(outcome)
    }

    async fn apply_block(
        &self,
        store: &mut dyn KeyValueStore,
        height: Height,
        txs: &[Vec<u8>],
        votes: &[Vote],
    ) -> ModuleResult<BlockOutcome> {
        let committed_epoch = self.epoch_sync.pre_block(store, height, txs)?;

        let mut downtime = Vec::new();
        for vote in votes {
            let outcome = self
                .liveness
                .handle_validator_signature(store, &vote.address, vote.signed)?;
            if outcome.downtime {
                downtime.push(outcome.address);
            }
        }

        let validator_updates = self.epoch_sync.end_block(store, height).await?;

        Ok(BlockOutcome {
            committed_epoch,
            validator_updates,
            downtime,
        })
    }

    /// Current validator set as seen by consensus.
    pub fn validators(&self, store: &dyn KeyValueStore) -> ModuleResult<Vec<ValidatorRecord>> {
        Ok(self.epoch_sync.last_validator_set(store)?.validators)
    }
}
