//! Domain layer for Epoch Sync
//!
//! Pure logic plus the epoch store accessors. No I/O beyond the store handle
//! passed into each call.

pub mod claim;
pub mod differ;
pub mod epoch_store;
pub mod hooks;
pub mod proposal;
pub mod registry;
pub mod resolver;
pub mod slash;

pub use claim::EpochClaim;
pub use differ::{diff, ValidatorSetDiff};
pub use epoch_store::EpochStore;
pub use hooks::{HookDispatcher, ValidatorSetHooks};
pub use proposal::{EpochProposalCoordinator, ProposalStatus};
pub use registry::{
    lowest_committed_epoch, ChainEpochInfo, RegistryKey, RegistryValidator, RegistryValidatorSet,
    SignReceipt,
};
pub use resolver::{extract_consensus_key, resolve_validator, resolve_validator_set};
pub use slash::{Infraction, SlashMessage};
