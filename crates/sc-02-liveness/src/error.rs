//! Error types for the Liveness subsystem

use shared_types::{ConsAddress, StoreError};
use thiserror::Error;

/// Liveness subsystem errors
#[derive(Debug, Error)]
pub enum LivenessError {
    /// Persisted state could not be read or written.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Params update sent by someone other than the governance authority.
    #[error("invalid authority; expected {expected}, got {actual}")]
    Unauthorized { expected: String, actual: String },

    /// A params field failed validation. `reason` names the field.
    #[error("{reason}")]
    InvalidParams { field: &'static str, reason: String },

    /// No signing info for this consensus address.
    #[error("no signing info found for validator consensus-address {address}")]
    UnknownValidator { address: ConsAddress },

    /// Genesis signing infos and missed blocks disagree.
    #[error("invalid liveness genesis: {reason}")]
    InvalidGenesis { reason: String },

    /// The validator set source could not be read.
    #[error("validator set unavailable: {reason}")]
    ValidatorSource { reason: String },
}

/// Result type for liveness operations
pub type LivenessResult<T> = Result<T, LivenessError>;
