//! # sc-02-liveness
//!
//! Liveness: per-validator signing info over a sliding window of blocks.
//!
//! ## Overview
//!
//! - **Signing Info**: start height, observation count, missed counter,
//!   jail and tombstone markers per consensus address
//! - **Missed-Block Bitmap**: one bit per window slot, persisted in
//!   1024-bit chunks
//! - **Membership Hooks**: [`LivenessHooks`] listens to Epoch Sync and starts
//!   or stops tracking validators as the set changes
//! - **Params & Genesis**: governance-gated params, genesis import/export
//!
//! ## Architecture
//!
//! ```text
//! Epoch Sync (sc-01) ──after_validator_*──→ LivenessHooks ──┐
//!                                                             ├──→ LivenessStore (liveness/*)
//! Consensus engine ──handle_validator_signature──→ Tracker ──┘       └── MissedBlockBitmap
//! ```
//!
//! ## Sliding Window
//!
//! | Step | Effect |
//! |------|--------|
//! | slot | `index_offset mod signed_blocks_window` |
//! | bit differs from observation | flip it, counter ±1 |
//! | always | `index_offset += 1` |
//! | downtime | `missed / min(W, index_offset + 1) > 1 - min_signed_per_window` |

pub mod adapters;
pub mod domain;
pub mod error;
pub mod hooks;
pub mod ports;
pub mod service;
pub mod types;

pub use domain::{is_downtime, LivenessStore, MissedBlockBitmap, ValidatorSigningInfo};
pub use error::{LivenessError, LivenessResult};
pub use hooks::LivenessHooks;
pub use ports::{LivenessApi, LivenessQuery, SignatureOutcome, ValidatorSetSource};
pub use service::{LivenessConfig, LivenessTracker};
pub use types::{GenesisState, MissedBlock, Params, SigningInfoEntry, ValidatorMissedBlocks};
