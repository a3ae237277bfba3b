//! # Local Block Driver
//!
//! Drives the validator module through the block lifecycle on a single node:
//! propose, verify, then commit with every current validator signing. Stands
//! in for a consensus engine on development nodes.

use crate::container::{BlockOutcome, ModuleError, ValidatorModule, Vote};
use crate::genesis::NodeGenesis;
use sc_01_epoch_sync::{ProposalStatus, RegistryClient};
use shared_types::codec;
use shared_types::{BufferedStore, Height, KeyValueStore, StoreError};

const HEIGHT_KEY: &[u8] = b"node/height";

/// Single-node block producer over a validator module and its store.
pub struct NodeRuntime<R: RegistryClient> {
    module: ValidatorModule<R>,
    store: Box<dyn KeyValueStore>,
    height: Height,
}

impl<R: RegistryClient> NodeRuntime<R> {
    pub fn new(module: ValidatorModule<R>, store: Box<dyn KeyValueStore>) -> Self {
        Self {
            module,
            store,
            height: 0,
        }
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn module(&self) -> &ValidatorModule<R> {
        &self.module
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Resume from the stored height, or import `genesis` on a fresh store.
    pub async fn start(&mut self, genesis: &NodeGenesis) -> Result<(), ModuleError> {
        let stored: Option<Height> = codec::load(self.store.as_ref(), HEIGHT_KEY).map_err(store_error)?;
        match stored {
            Some(height) => {
                self.height = height;
                tracing::info!("Resuming at height {}", height);
            }
            None => {
                let validators = self
                    .module
                    .init_genesis(self.store.as_mut(), 0, genesis)
                    .await?;
                codec::save(self.store.as_mut(), HEIGHT_KEY, &0u64).map_err(store_error)?;
                tracing::info!("Chain initialized with {} validators", validators.len());
            }
        }
        Ok(())
    }

    /// Produce and commit the next block.
    pub async fn produce_block(&mut self) -> Result<BlockOutcome, ModuleError> {
        let height = self.height + 1;

        let txs = self
            .module
            .prepare_proposal(self.store.as_ref(), height, Vec::new())
            .await?;

        if self.module.process_proposal(self.store.as_ref(), height, &txs)? == ProposalStatus::Reject {
            tracing::warn!("Own proposal at height {} rejected; committing an empty block", height);
            return self.commit(height, &[]).await;
        }
        self.commit(height, &txs).await
    }

    async fn commit(&mut self, height: Height, txs: &[Vec<u8>]) -> Result<BlockOutcome, ModuleError> {
        let votes: Vec<Vote> = self
            .module
            .validators(self.store.as_ref())?
            .iter()
            .filter(|v| v.power > 0)
            .map(|v| Vote {
                address: v.pub_key.address(),
                signed: true,
            })
            .collect();

        // Block state and the new height land in one write.
        let mut buffer = BufferedStore::new(self.store.as_ref());
        let outcome = self
            .module
            .finalize_block(&mut buffer, height, txs, &votes)
            .await?;
        codec::save(&mut buffer, HEIGHT_KEY, &height).map_err(store_error)?;
        let batch = buffer.into_batch();
        self.store.atomic_batch_write(batch).map_err(store_error)?;
        self.height = height;

        if let Some(epoch) = outcome.committed_epoch {
            tracing::debug!("Height {}: committed epoch {}", height, epoch);
        }
        if !outcome.validator_updates.is_empty() {
            tracing::info!(
                "Height {}: {} validator updates",
                height,
                outcome.validator_updates.len()
            );
        }
        Ok(outcome)
    }
}

fn store_error(e: StoreError) -> ModuleError {
    ModuleError::EpochSync(e.into())
}
