//! # Genesis Module
//!
//! Chain initialization from a genesis document.
//!
//! ## Initialization Sequence
//!
//! 1. Epoch Sync imports params and the genesis epoch, then fetches and
//!    stores the genesis validator set
//! 2. Liveness seeds signing info for every validator of that set
//! 3. Liveness applies listed signing infos, missed blocks and params

pub mod document;

pub use document::{GenesisError, NodeGenesis};
