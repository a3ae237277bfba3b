//! Epoch Sync Service - block lifecycle orchestration
//!
//! Wires the domain logic to the registry port and the store handle passed
//! into each call. Holds no chain state itself.

use crate::domain::{
    diff, lowest_committed_epoch, resolve_validator_set, EpochClaim, EpochProposalCoordinator,
    EpochStore, HookDispatcher, Infraction, ProposalStatus, SlashMessage,
};
use crate::error::{EpochSyncError, EpochSyncResult};
use crate::ports::inbound::{EpochSyncApi, EpochSyncQuery};
use crate::ports::outbound::RegistryClient;
use crate::types::{GenesisState, Params};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{
    BlockContext, Epoch, Height, KeyValueStore, Ratio, ValidatorRecord, ValidatorSetSnapshot,
};
use std::sync::Arc;

/// Epoch Sync configuration
#[derive(Clone, Debug)]
pub struct EpochSyncConfig {
    /// Account allowed to replace params.
    pub authority: String,
}

impl Default for EpochSyncConfig {
    fn default() -> Self {
        Self {
            authority: "gov".to_string(),
        }
    }
}

/// Epoch Sync Service implementation
pub struct EpochSyncService<R: RegistryClient> {
    config: EpochSyncConfig,
    registry: Arc<R>,
    hooks: RwLock<Option<Arc<HookDispatcher>>>,
}

impl<R: RegistryClient> EpochSyncService<R> {
    pub fn new(config: EpochSyncConfig, registry: Arc<R>) -> Self {
        Self {
            config,
            registry,
            hooks: RwLock::new(None),
        }
    }

    pub fn authority(&self) -> &str {
        &self.config.authority
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    /// Install the hook dispatcher. Allowed once.
    pub fn set_hooks(&self, hooks: HookDispatcher) -> EpochSyncResult<()> {
        let mut slot = self.hooks.write();
        if slot.is_some() {
            return Err(EpochSyncError::HooksAlreadySet);
        }
        tracing::info!(
            "[sc-01] Validator set hooks installed: {:?}",
            hooks.names()
        );
        *slot = Some(Arc::new(hooks));
        Ok(())
    }

    fn installed_hooks(&self) -> Option<Arc<HookDispatcher>> {
        self.hooks.read().clone()
    }

    /// Lowest committed epoch across the registry's settlement targets.
    pub async fn latest_epoch(&self) -> EpochSyncResult<Option<Epoch>> {
        let infos = self.registry.get_last_all_committed().await?;
        Ok(lowest_committed_epoch(&infos))
    }

    /// Fetch and resolve the validator set for `epoch`; all or nothing.
    pub async fn fetch_validator_set(
        &self,
        params: &Params,
        epoch: Epoch,
    ) -> EpochSyncResult<Vec<ValidatorRecord>> {
        let response = self.registry.get_validator_set(epoch).await?;
        resolve_validator_set(&response.validators, params.validator_key_tag)
            .map_err(|source| EpochSyncError::Resolution { epoch, source })
    }

    /// Import genesis: params, epoch and the genesis validator set, which is
    /// returned as the initial consensus set.
    pub async fn init_genesis(
        &self,
        store: &mut dyn KeyValueStore,
        genesis: &GenesisState,
    ) -> EpochSyncResult<Vec<ValidatorRecord>> {
        genesis.validate()?;
        EpochStore::set_params(store, &genesis.params)?;

        tracing::info!(
            "[sc-01] Initializing genesis state at epoch {}",
            genesis.genesis_epoch
        );
        EpochStore::set_current_epoch(store, genesis.genesis_epoch)?;

        let validators = self
            .fetch_validator_set(&genesis.params, genesis.genesis_epoch)
            .await?;
        EpochStore::set_last_validator_set(
            store,
            &ValidatorSetSnapshot::new(genesis.genesis_epoch, validators.clone()),
        )?;

        Ok(validators)
    }

    pub fn export_genesis(&self, store: &dyn KeyValueStore) -> EpochSyncResult<GenesisState> {
        Ok(GenesisState {
            params: EpochStore::params(store)?,
            genesis_epoch: EpochStore::current_epoch(store)?,
        })
    }
}

#[async_trait]
impl<R: RegistryClient> EpochSyncApi for EpochSyncService<R> {
    async fn prepare_proposal(
        &self,
        store: &dyn KeyValueStore,
        height: Height,
        txs: Vec<Vec<u8>>,
    ) -> EpochSyncResult<Vec<Vec<u8>>> {
        let params = EpochStore::params(store)?;
        if !params.is_epoch_boundary(height) {
            return Ok(txs);
        }

        let local = EpochStore::current_epoch(store).unwrap_or_else(|e| {
            tracing::warn!(
                "[sc-01] PrepareProposal: could not read current epoch, assuming 0: {}",
                e
            );
            0
        });

        let latest = match self.latest_epoch().await {
            Ok(latest) => latest,
            Err(e) => {
                tracing::error!(
                    "[sc-01] PrepareProposal: failed to get latest epoch from registry: {}",
                    e
                );
                return Ok(txs);
            }
        };

        let epoch = EpochProposalCoordinator::choose_epoch(local, latest);
        tracing::debug!(
            "[sc-01] PrepareProposal: height {} local epoch {} registry {:?} -> claim {}",
            height,
            local,
            latest,
            epoch
        );
        EpochProposalCoordinator::inject_claim(EpochClaim::new(epoch), txs)
    }

    fn process_proposal(
        &self,
        store: &dyn KeyValueStore,
        height: Height,
        txs: &[Vec<u8>],
    ) -> EpochSyncResult<ProposalStatus> {
        let params = EpochStore::params(store)?;
        if !params.is_epoch_boundary(height) || txs.is_empty() {
            return Ok(ProposalStatus::Accept);
        }
        let committed = EpochStore::current_epoch(store)?;
        Ok(EpochProposalCoordinator::verify(
            &params, height, txs, committed,
        ))
    }

    fn pre_block(
        &self,
        store: &mut dyn KeyValueStore,
        height: Height,
        txs: &[Vec<u8>],
    ) -> EpochSyncResult<Option<Epoch>> {
        let params = EpochStore::params(store)?;
        let Some(claim) = EpochProposalCoordinator::claim_to_commit(&params, height, txs)? else {
            return Ok(None);
        };

        EpochStore::set_current_epoch(store, claim.epoch)?;
        tracing::info!(
            "[sc-01] Committed epoch {} at height {}",
            claim.epoch,
            height
        );
        Ok(Some(claim.epoch))
    }

    async fn end_block(
        &self,
        store: &mut dyn KeyValueStore,
        height: Height,
    ) -> EpochSyncResult<Vec<ValidatorRecord>> {
        let last = EpochStore::last_validator_set(store)?;
        let current = EpochStore::current_epoch(store)?;
        if last.epoch == current {
            return Ok(Vec::new());
        }

        let params = EpochStore::params(store)?;
        let new_validators = self.fetch_validator_set(&params, current).await?;
        let changes = diff(&last.validators, &new_validators);

        // The snapshot moves only once every listener has seen the change.
        if let Some(hooks) = self.installed_hooks() {
            let mut ctx = BlockContext::new(height, store);
            hooks.dispatch_diff(&mut ctx, &changes)?;
        }

        EpochStore::set_last_validator_set(
            store,
            &ValidatorSetSnapshot::new(current, new_validators),
        )?;

        tracing::info!(
            "[sc-01] Validator set moved from epoch {} to {} at height {}: {} removed, {} added, {} updated",
            last.epoch,
            current,
            height,
            changes.removed.len(),
            changes.added.len(),
            changes.updated.len()
        );

        let updates = changes.into_updates();
        for update in &updates {
            tracing::debug!(
                "[sc-01] PubKey: {}, Power: {}",
                update.pub_key,
                update.power
            );
        }
        Ok(updates)
    }

    fn update_params(
        &self,
        store: &mut dyn KeyValueStore,
        authority: &str,
        params: Params,
    ) -> EpochSyncResult<()> {
        if authority != self.config.authority {
            return Err(EpochSyncError::Unauthorized {
                expected: self.config.authority.clone(),
                actual: authority.to_string(),
            });
        }
        params.validate()?;
        EpochStore::set_params(store, &params)?;
        tracing::info!("[sc-01] Params updated: {:?}", params);
        Ok(())
    }

    async fn slash_with_infraction_reason(
        &self,
        store: &dyn KeyValueStore,
        validator_pub_key: &[u8],
        infraction_height: Height,
        power: i64,
        slash_factor: Ratio,
        infraction: Infraction,
    ) -> EpochSyncResult<String> {
        let message = SlashMessage::new(
            validator_pub_key,
            infraction_height,
            power,
            slash_factor,
            infraction,
        );
        let bytes = message
            .to_json_bytes()
            .map_err(|e| EpochSyncError::SlashEncoding {
                reason: e.to_string(),
            })?;
        let params = EpochStore::params(store)?;

        let receipt = self
            .registry
            .sign_message(params.signing_key_tag, bytes)
            .await?;
        tracing::info!(
            "[sc-01] Slash request {} submitted for {} ({})",
            receipt.request_hash,
            message.validator_pk,
            infraction
        );
        Ok(receipt.request_hash)
    }
}

impl<R: RegistryClient> EpochSyncQuery for EpochSyncService<R> {
    fn current_epoch(&self, store: &dyn KeyValueStore) -> EpochSyncResult<Epoch> {
        Ok(EpochStore::current_epoch(store)?)
    }

    fn last_validator_set(&self, store: &dyn KeyValueStore) -> EpochSyncResult<ValidatorSetSnapshot> {
        Ok(EpochStore::last_validator_set(store)?)
    }

    fn params(&self, store: &dyn KeyValueStore) -> EpochSyncResult<Params> {
        Ok(EpochStore::params(store)?)
    }

    fn iterate_validators(
        &self,
        store: &dyn KeyValueStore,
        f: &mut dyn FnMut(usize, &ValidatorRecord) -> bool,
    ) -> EpochSyncResult<()> {
        let snapshot = EpochStore::last_validator_set(store)?;
        for (index, validator) in snapshot.validators.iter().enumerate() {
            if f(index, validator) {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{registry_validator, MockRegistryClient};
    use crate::domain::ValidatorSetHooks;
    use crate::error::HookError;
    use parking_lot::Mutex;
    use shared_types::{ConsensusPubKey, InMemoryKVStore};

    fn key(seed: u8) -> ConsensusPubKey {
        ConsensusPubKey::ed25519([seed; 32])
    }

    fn service(registry: Arc<MockRegistryClient>) -> EpochSyncService<MockRegistryClient> {
        EpochSyncService::new(EpochSyncConfig::default(), registry)
    }

    async fn genesis_with(
        registry: &Arc<MockRegistryClient>,
        svc: &EpochSyncService<MockRegistryClient>,
        store: &mut InMemoryKVStore,
    ) {
        registry.set_validators(
            0,
            vec![
                registry_validator("a", &key(1), 10),
                registry_validator("b", &key(2), 10),
            ],
        );
        svc.init_genesis(store, &GenesisState::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_prepare_off_boundary_is_pass_through() {
        let registry = Arc::new(MockRegistryClient::new());
        registry.set_committed(&[5]);
        let svc = service(registry);
        let store = InMemoryKVStore::new();

        let txs = svc
            .prepare_proposal(&store, 11, vec![b"tx".to_vec()])
            .await
            .unwrap();
        assert_eq!(txs, vec![b"tx".to_vec()]);
    }

    #[tokio::test]
    async fn test_prepare_degrades_when_registry_down() {
        let registry = Arc::new(MockRegistryClient::new());
        registry.fail_committed(true);
        let svc = service(registry);
        let store = InMemoryKVStore::new();

        let txs = svc
            .prepare_proposal(&store, 10, vec![b"tx".to_vec()])
            .await
            .unwrap();
        assert_eq!(txs, vec![b"tx".to_vec()]);
    }

    #[tokio::test]
    async fn test_prepare_without_progress_claims_local_epoch() {
        let registry = Arc::new(MockRegistryClient::new());
        registry.set_committed(&[4, 6]);
        let svc = service(registry);
        let mut store = InMemoryKVStore::new();
        EpochStore::set_current_epoch(&mut store, 7).unwrap();

        let txs = svc.prepare_proposal(&store, 20, Vec::new()).await.unwrap();
        assert_eq!(EpochClaim::decode(&txs[0]).unwrap().epoch, 7);
    }

    #[tokio::test]
    async fn test_prepare_with_no_targets_claims_local_epoch() {
        let registry = Arc::new(MockRegistryClient::new());
        let svc = service(registry);
        let mut store = InMemoryKVStore::new();
        EpochStore::set_current_epoch(&mut store, 3).unwrap();

        let txs = svc.prepare_proposal(&store, 10, Vec::new()).await.unwrap();
        assert_eq!(EpochClaim::decode(&txs[0]).unwrap().epoch, 3);
    }

    #[tokio::test]
    async fn test_verify_and_commit() {
        let registry = Arc::new(MockRegistryClient::new());
        let svc = service(registry);
        let mut store = InMemoryKVStore::new();
        EpochStore::set_current_epoch(&mut store, 4).unwrap();

        let regress = vec![EpochClaim::new(3).encode().unwrap()];
        assert_eq!(
            svc.process_proposal(&store, 10, &regress).unwrap(),
            ProposalStatus::Reject
        );

        let forward = vec![EpochClaim::new(9).encode().unwrap()];
        assert_eq!(
            svc.process_proposal(&store, 10, &forward).unwrap(),
            ProposalStatus::Accept
        );
        assert_eq!(svc.pre_block(&mut store, 10, &forward).unwrap(), Some(9));
        assert_eq!(svc.current_epoch(&store).unwrap(), 9);

        // Off-boundary blocks never touch the epoch.
        assert_eq!(svc.pre_block(&mut store, 11, &regress).unwrap(), None);
        assert_eq!(svc.current_epoch(&store).unwrap(), 9);
    }

    #[tokio::test]
    async fn test_genesis_roundtrip() {
        let registry = Arc::new(MockRegistryClient::new());
        let svc = service(registry.clone());
        let mut store = InMemoryKVStore::new();
        genesis_with(&registry, &svc, &mut store).await;

        let snapshot = svc.last_validator_set(&store).unwrap();
        assert_eq!(snapshot.epoch, 0);
        assert_eq!(snapshot.len(), 2);

        let exported = svc.export_genesis(&store).unwrap();
        assert_eq!(exported, GenesisState::default());
    }

    #[tokio::test]
    async fn test_genesis_rejects_partial_set() {
        let registry = Arc::new(MockRegistryClient::new());
        let mut bad = registry_validator("bad", &key(2), 10);
        bad.keys[0].tag = 15;
        registry.set_validators(0, vec![registry_validator("a", &key(1), 10), bad]);
        let svc = service(registry);
        let mut store = InMemoryKVStore::new();

        let err = svc
            .init_genesis(&mut store, &GenesisState::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EpochSyncError::Resolution { epoch: 0, .. }));
        assert!(svc.last_validator_set(&store).unwrap().is_empty());
    }

    struct OrderLog(Arc<Mutex<Vec<String>>>);

    impl ValidatorSetHooks for OrderLog {
        fn after_validator_created(
            &self,
            ctx: &mut BlockContext<'_>,
            pub_key: &ConsensusPubKey,
        ) -> Result<(), HookError> {
            self.0
                .lock()
                .push(format!("created:{}@{}", pub_key.as_bytes()[0], ctx.height));
            Ok(())
        }

        fn after_validator_modified(
            &self,
            _ctx: &mut BlockContext<'_>,
            pub_key: &ConsensusPubKey,
        ) -> Result<(), HookError> {
            self.0.lock().push(format!("modified:{}", pub_key.as_bytes()[0]));
            Ok(())
        }

        fn after_validator_removed(
            &self,
            _ctx: &mut BlockContext<'_>,
            pub_key: &ConsensusPubKey,
        ) -> Result<(), HookError> {
            self.0.lock().push(format!("removed:{}", pub_key.as_bytes()[0]));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_end_block_applies_new_set_and_notifies() {
        let registry = Arc::new(MockRegistryClient::new());
        let svc = service(registry.clone());
        let mut store = InMemoryKVStore::new();
        genesis_with(&registry, &svc, &mut store).await;

        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = HookDispatcher::new();
        hooks.register("log", Box::new(OrderLog(log.clone()))).unwrap();
        svc.set_hooks(hooks).unwrap();

        // Same epoch: nothing to do.
        assert!(svc.end_block(&mut store, 5).await.unwrap().is_empty());

        registry.set_validators(
            5,
            vec![
                registry_validator("a", &key(1), 30),
                registry_validator("c", &key(3), 20),
            ],
        );
        EpochStore::set_current_epoch(&mut store, 5).unwrap();

        let updates = svc.end_block(&mut store, 10).await.unwrap();
        assert_eq!(
            updates,
            vec![
                ValidatorRecord::new(key(1), 30),
                ValidatorRecord::new(key(3), 20),
                ValidatorRecord::new(key(2), 0),
            ]
        );
        assert_eq!(*log.lock(), vec!["removed:2", "created:3@10", "modified:1"]);
        assert_eq!(svc.last_validator_set(&store).unwrap().epoch, 5);

        // Applied once per epoch.
        assert!(svc.end_block(&mut store, 11).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_block_registry_failure_keeps_old_set() {
        let registry = Arc::new(MockRegistryClient::new());
        let svc = service(registry.clone());
        let mut store = InMemoryKVStore::new();
        genesis_with(&registry, &svc, &mut store).await;

        EpochStore::set_current_epoch(&mut store, 5).unwrap();
        registry.fail_validator_set(true);

        assert!(matches!(
            svc.end_block(&mut store, 10).await,
            Err(EpochSyncError::Registry(_))
        ));
        assert_eq!(svc.last_validator_set(&store).unwrap().epoch, 0);
    }

    struct Refuse;

    impl ValidatorSetHooks for Refuse {
        fn after_validator_created(
            &self,
            _ctx: &mut BlockContext<'_>,
            _pub_key: &ConsensusPubKey,
        ) -> Result<(), HookError> {
            Err(HookError::Rejected {
                reason: "not today".to_string(),
            })
        }

        fn after_validator_modified(
            &self,
            _ctx: &mut BlockContext<'_>,
            _pub_key: &ConsensusPubKey,
        ) -> Result<(), HookError> {
            Ok(())
        }

        fn after_validator_removed(
            &self,
            _ctx: &mut BlockContext<'_>,
            _pub_key: &ConsensusPubKey,
        ) -> Result<(), HookError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_end_block_hook_failure_keeps_old_set() {
        let registry = Arc::new(MockRegistryClient::new());
        let svc = service(registry.clone());
        let mut store = InMemoryKVStore::new();
        genesis_with(&registry, &svc, &mut store).await;

        let mut hooks = HookDispatcher::new();
        hooks.register("refuse", Box::new(Refuse)).unwrap();
        svc.set_hooks(hooks).unwrap();

        registry.set_validators(5, vec![registry_validator("c", &key(3), 20)]);
        EpochStore::set_current_epoch(&mut store, 5).unwrap();

        assert!(matches!(
            svc.end_block(&mut store, 10).await,
            Err(EpochSyncError::Hook { .. })
        ));
        // Still pending, so the next block retries the change.
        assert_eq!(svc.last_validator_set(&store).unwrap().epoch, 0);
        assert!(svc.end_block(&mut store, 11).await.is_err());
    }

    #[test]
    fn test_hooks_set_once() {
        let svc = service(Arc::new(MockRegistryClient::new()));
        svc.set_hooks(HookDispatcher::new()).unwrap();
        assert!(matches!(
            svc.set_hooks(HookDispatcher::new()),
            Err(EpochSyncError::HooksAlreadySet)
        ));
    }

    #[test]
    fn test_update_params() {
        let svc = service(Arc::new(MockRegistryClient::new()));
        let mut store = InMemoryKVStore::new();
        let new_params = Params {
            epoch_check_interval: 25,
            ..Params::default()
        };

        assert!(matches!(
            svc.update_params(&mut store, "mallory", new_params.clone()),
            Err(EpochSyncError::Unauthorized { .. })
        ));

        let invalid = Params {
            validator_key_tag: 0x31,
            ..new_params.clone()
        };
        assert!(matches!(
            svc.update_params(&mut store, "gov", invalid),
            Err(EpochSyncError::InvalidParams { field: "validator_key_tag", .. })
        ));
        assert_eq!(svc.params(&store).unwrap(), Params::default());

        svc.update_params(&mut store, "gov", new_params.clone()).unwrap();
        assert_eq!(svc.params(&store).unwrap(), new_params);
    }

    #[tokio::test]
    async fn test_slash_request_uses_signing_key_tag() {
        let registry = Arc::new(MockRegistryClient::new());
        let svc = service(registry.clone());
        let store = InMemoryKVStore::new();

        let hash = svc
            .slash_with_infraction_reason(
                &store,
                key(1).as_bytes(),
                77,
                10_000,
                Ratio::from_bps(500),
                Infraction::DoubleSign,
            )
            .await
            .unwrap();
        assert_eq!(hash, "0xmock0");

        let signed = registry.signed_messages();
        assert_eq!(signed.len(), 1);
        assert_eq!(signed[0].0, 15);
        let body: serde_json::Value = serde_json::from_slice(&signed[0].1).unwrap();
        assert_eq!(body["infractionType"], "INFRACTION_DOUBLE_SIGN");
        assert_eq!(body["infractionHeigh"], 77);
    }

    #[tokio::test]
    async fn test_iterate_validators_stops_early() {
        let registry = Arc::new(MockRegistryClient::new());
        let svc = service(registry.clone());
        let mut store = InMemoryKVStore::new();
        genesis_with(&registry, &svc, &mut store).await;

        let mut seen = Vec::new();
        svc.iterate_validators(&store, &mut |i, v| {
            seen.push((i, v.power));
            true
        })
        .unwrap();
        assert_eq!(seen, vec![(0, 10)]);
    }
}
