//! # sc-01-epoch-sync
//!
//! Epoch Sync: brings an externally sourced validator set into consensus
//! state.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Propose/Verify/Commit**: only the proposer queries the registry; every
//!   node deterministically verifies the injected epoch claim before it is
//!   committed
//! - **Validator Set Resolution**: registry records → `(pub_key, power)`,
//!   failing the whole batch on any bad record
//! - **Validator Set Diffing**: removed / added / updated between snapshots
//! - **Hook Dispatch**: ordered, fail-fast fan-out to downstream listeners
//! - **Slash Requests**: infraction evidence signed through the registry
//!
//! ## Architecture
//!
//! ```text
//! Consensus engine ──prepare_proposal──→ Epoch Sync ──get_last_all_committed──→ Registry
//!                  ──process_proposal──→     │
//!                  ──pre_block─────────→     ├── EpochStore (epoch_sync/*)
//!                  ──end_block─────────→     ├── get_validator_set ──→ Registry
//!                                            └── HookDispatcher ──→ Liveness (sc-02)
//! ```
//!
//! ## Determinism
//!
//! | Phase | Runs on | Inputs |
//! |-------|---------|--------|
//! | prepare_proposal | proposer | committed epoch + registry (untrusted) |
//! | process_proposal | every node | payload + committed epoch |
//! | pre_block | every node | payload |
//! | end_block | every node | committed epoch + registry set for it |
//!
//! ## Example
//!
//! ```rust,ignore
//! use sc_01_epoch_sync::{EpochSyncConfig, EpochSyncService};
//! use sc_01_epoch_sync::ports::inbound::EpochSyncApi;
//!
//! let service = EpochSyncService::new(EpochSyncConfig::default(), registry);
//! let txs = service.prepare_proposal(&store, height, txs).await?;
//! if service.process_proposal(&store, height, &txs)? == ProposalStatus::Accept {
//!     service.pre_block(&mut store, height, &txs)?;
//!     let updates = service.end_block(&mut store, height).await?;
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod types;

pub use domain::{
    diff, EpochClaim, EpochProposalCoordinator, EpochStore, HookDispatcher, Infraction,
    ProposalStatus, ValidatorSetDiff, ValidatorSetHooks,
};
pub use error::{EpochSyncError, EpochSyncResult, HookError, RegistryError, ResolutionError};
pub use ports::{EpochSyncApi, EpochSyncQuery, RegistryClient};
pub use service::{EpochSyncConfig, EpochSyncService};
pub use types::{GenesisState, Params};
