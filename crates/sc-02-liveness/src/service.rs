//! Liveness Tracker - signing info bookkeeping per block
//!
//! Every call receives the store handle; the tracker itself only holds
//! configuration.

use crate::domain::{is_downtime, LivenessStore, MissedBlockBitmap, ValidatorSigningInfo};
use crate::error::{LivenessError, LivenessResult};
use crate::ports::inbound::{LivenessApi, LivenessQuery, SignatureOutcome};
use crate::ports::outbound::ValidatorSetSource;
use crate::types::{GenesisState, MissedBlock, Params, SigningInfoEntry, ValidatorMissedBlocks};
use shared_types::{BufferedStore, ConsAddress, ConsensusPubKey, Height, KeyValueStore};

/// Liveness configuration
#[derive(Clone, Debug)]
pub struct LivenessConfig {
    /// Account allowed to replace params.
    pub authority: String,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            authority: "gov".to_string(),
        }
    }
}

/// Liveness Tracker implementation
pub struct LivenessTracker {
    config: LivenessConfig,
}

impl LivenessTracker {
    pub fn new(config: LivenessConfig) -> Self {
        Self { config }
    }

    pub fn authority(&self) -> &str {
        &self.config.authority
    }

    fn missed_blocks_of(
        store: &dyn KeyValueStore,
        address: &ConsAddress,
    ) -> LivenessResult<Vec<MissedBlock>> {
        Ok(MissedBlockBitmap::missed_indices(store, address)?
            .into_iter()
            .map(|index| MissedBlock {
                index,
                missed: true,
            })
            .collect())
    }
}

impl Default for LivenessTracker {
    fn default() -> Self {
        Self::new(LivenessConfig::default())
    }
}

impl LivenessApi for LivenessTracker {
    fn init_genesis(
        &self,
        store: &mut dyn KeyValueStore,
        height: Height,
        validators: &dyn ValidatorSetSource,
        genesis: &GenesisState,
    ) -> LivenessResult<()> {
        genesis.validate()?;

        let bonded = validators.bonded_validators(store)?;
        tracing::info!(
            "[sc-02] Initializing genesis with {} bonded validators at height {}",
            bonded.len(),
            height
        );
        for record in &bonded {
            LivenessStore::add_pub_key(store, &record.pub_key)?;
            LivenessStore::set_signing_info(
                store,
                &ValidatorSigningInfo::new(record.pub_key.address(), height),
            )?;
        }

        for entry in &genesis.signing_infos {
            let mut info = entry.info.clone();
            info.address = entry.address;
            LivenessStore::set_signing_info(store, &info)?;
        }

        for entry in &genesis.missed_blocks {
            for block in &entry.missed_blocks {
                MissedBlockBitmap::set(store, &entry.address, block.index, block.missed)?;
            }
        }

        LivenessStore::set_params(store, &genesis.params)?;
        Ok(())
    }

    fn export_genesis(&self, store: &dyn KeyValueStore) -> LivenessResult<GenesisState> {
        let params = LivenessStore::params(store)?;
        let infos = LivenessStore::all_signing_infos(store)?;

        let mut missed_blocks = Vec::with_capacity(infos.len());
        for info in &infos {
            missed_blocks.push(ValidatorMissedBlocks {
                address: info.address,
                missed_blocks: Self::missed_blocks_of(store, &info.address)?,
            });
        }

        Ok(GenesisState {
            params,
            signing_infos: infos
                .into_iter()
                .map(|info| SigningInfoEntry {
                    address: info.address,
                    info,
                })
                .collect(),
            missed_blocks,
        })
    }

    fn handle_validator_signature(
        &self,
        store: &mut dyn KeyValueStore,
        address: &ConsAddress,
        signed: bool,
    ) -> LivenessResult<SignatureOutcome> {
        let params = LivenessStore::params(store)?;
        let mut info = LivenessStore::signing_info(store, address)?
            .ok_or(LivenessError::UnknownValidator { address: *address })?;

        if info.tombstoned {
            tracing::debug!("[sc-02] Skipping tombstoned validator {}", address);
            return Ok(SignatureOutcome {
                address: *address,
                recorded: false,
                index_offset: info.index_offset,
                missed_blocks_counter: info.missed_blocks_counter,
                downtime: false,
            });
        }

        let observed = info.index_offset;
        let slot = observed % params.window();
        let missed = !signed;
        let previous = MissedBlockBitmap::get(store, address, slot)?;

        match (previous, missed) {
            (false, true) => {
                MissedBlockBitmap::set(store, address, slot, true)?;
                info.missed_blocks_counter += 1;
            }
            (true, false) => {
                MissedBlockBitmap::set(store, address, slot, false)?;
                info.missed_blocks_counter = info.missed_blocks_counter.saturating_sub(1);
            }
            _ => {}
        }
        info.index_offset += 1;

        let downtime = is_downtime(&params, info.missed_blocks_counter, observed);
        LivenessStore::set_signing_info(store, &info)?;

        if missed {
            tracing::debug!(
                "[sc-02] Validator {} missed a block ({} missed in window)",
                address,
                info.missed_blocks_counter
            );
        }
        if downtime {
            tracing::warn!(
                "[sc-02] Validator {} exceeds the downtime limit ({} missed over {} observed)",
                address,
                info.missed_blocks_counter,
                params.window().min(info.index_offset)
            );
        }

        Ok(SignatureOutcome {
            address: *address,
            recorded: true,
            index_offset: info.index_offset,
            missed_blocks_counter: info.missed_blocks_counter,
            downtime,
        })
    }

    fn update_params(
        &self,
        store: &mut dyn KeyValueStore,
        authority: &str,
        params: Params,
    ) -> LivenessResult<()> {
        if authority != self.config.authority {
            return Err(LivenessError::Unauthorized {
                expected: self.config.authority.clone(),
                actual: authority.to_string(),
            });
        }
        params.validate()?;
        let previous = LivenessStore::params(store)?;

        let mut buffer = BufferedStore::new(&*store);
        if previous.signed_blocks_window != params.signed_blocks_window {
            // Slots were laid out for the old window; start every window over.
            let infos = LivenessStore::all_signing_infos(&buffer)?;
            for mut info in infos {
                MissedBlockBitmap::clear(&mut buffer, &info.address)?;
                info.index_offset = 0;
                info.missed_blocks_counter = 0;
                LivenessStore::set_signing_info(&mut buffer, &info)?;
            }
            tracing::info!(
                "[sc-02] Signed blocks window changed from {} to {}, missed-block history reset",
                previous.signed_blocks_window,
                params.signed_blocks_window
            );
        }
        LivenessStore::set_params(&mut buffer, &params)?;

        let batch = buffer.into_batch();
        store.atomic_batch_write(batch)?;
        tracing::info!("[sc-02] Params updated: {:?}", params);
        Ok(())
    }
}

impl LivenessQuery for LivenessTracker {
    fn params(&self, store: &dyn KeyValueStore) -> LivenessResult<Params> {
        Ok(LivenessStore::params(store)?)
    }

    fn signing_info(
        &self,
        store: &dyn KeyValueStore,
        address: &ConsAddress,
    ) -> LivenessResult<Option<ValidatorSigningInfo>> {
        Ok(LivenessStore::signing_info(store, address)?)
    }

    fn signing_infos(&self, store: &dyn KeyValueStore) -> LivenessResult<Vec<ValidatorSigningInfo>> {
        Ok(LivenessStore::all_signing_infos(store)?)
    }

    fn pub_key(
        &self,
        store: &dyn KeyValueStore,
        address: &ConsAddress,
    ) -> LivenessResult<Option<ConsensusPubKey>> {
        Ok(LivenessStore::pub_key(store, address)?)
    }

    fn missed_blocks(
        &self,
        store: &dyn KeyValueStore,
        address: &ConsAddress,
    ) -> LivenessResult<Vec<MissedBlock>> {
        Self::missed_blocks_of(store, address)
    }
}
