//! Error types for the Epoch Sync subsystem

use shared_types::{Epoch, StoreError};
use thiserror::Error;

/// Failures talking to the external validator registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Transport-level failure (connection refused, timeout, HTTP status).
    #[error("Registry unreachable: {reason}")]
    Transport { reason: String },

    /// The registry answered with a JSON-RPC error object.
    #[error("Registry returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response body could not be interpreted.
    #[error("Malformed registry response: {reason}")]
    MalformedResponse { reason: String },

    /// Fixture file missing or unreadable.
    #[error("Fixture error: {reason}")]
    Fixture { reason: String },

    /// All retry attempts were used up.
    #[error("Registry call {method} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        method: String,
        attempts: u32,
        last_error: String,
    },
}

/// A registry validator record that cannot be turned into a consensus entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("consensus key with tag {key_tag} not found for validator {operator}")]
    MissingConsensusKey { operator: String, key_tag: u32 },

    #[error("failed to parse voting power '{value}' for validator {operator}")]
    InvalidVotingPower { operator: String, value: String },

    #[error("negative voting power {power} for validator {operator}")]
    NegativeVotingPower { operator: String, power: i64 },
}

/// Error returned by a validator set hook listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{reason}")]
    Rejected { reason: String },
}

/// Epoch Sync subsystem errors
#[derive(Debug, Error)]
pub enum EpochSyncError {
    /// Persisted state could not be read or written.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// External registry failure.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The fetched validator set could not be resolved; nothing was applied.
    #[error("Validator set resolution failed for epoch {epoch}: {source}")]
    Resolution {
        epoch: Epoch,
        #[source]
        source: ResolutionError,
    },

    /// Leading epoch claim of an accepted block could not be decoded.
    #[error("Invalid epoch claim: {reason}")]
    InvalidClaim { reason: String },

    /// Params update sent by someone other than the governance authority.
    #[error("invalid authority; expected {expected}, got {actual}")]
    Unauthorized { expected: String, actual: String },

    /// A params field failed validation.
    #[error("invalid params: {reason}")]
    InvalidParams { field: &'static str, reason: String },

    /// A hook dispatcher is already installed on the service.
    #[error("cannot set validator set hooks twice")]
    HooksAlreadySet,

    /// A listener with this name is already registered.
    #[error("hook listener '{name}' already registered")]
    DuplicateHook { name: String },

    /// A downstream hook listener failed.
    #[error("hook '{listener}' failed: {source}")]
    Hook {
        listener: String,
        #[source]
        source: HookError,
    },

    /// Slash message could not be serialized.
    #[error("could not marshal slash message: {reason}")]
    SlashEncoding { reason: String },
}

/// Result type for epoch sync operations
pub type EpochSyncResult<T> = Result<T, EpochSyncError>;
