//! Adapters for Liveness

pub mod validator_source;

pub use validator_source::{EpochSyncValidatorSource, StaticValidatorSource};
