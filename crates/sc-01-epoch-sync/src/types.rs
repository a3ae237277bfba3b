//! Configuration and genesis types for the Epoch Sync subsystem

use crate::error::{EpochSyncError, EpochSyncResult};
use serde::{Deserialize, Serialize};
use shared_types::Epoch;

/// Key type nibble identifying ed25519 keys in registry key tags.
pub const ED25519_KEY_TYPE: u32 = 2;

/// Default tag of validator consensus keys (type 2, id 11).
pub const DEFAULT_VALIDATOR_KEY_TAG: u32 = 43;

/// Default registry signing key tag.
pub const DEFAULT_SIGNING_KEY_TAG: u32 = 15;

/// Default number of blocks between epoch checks.
pub const DEFAULT_EPOCH_CHECK_INTERVAL: u64 = 10;

/// Epoch Sync parameters.
///
/// Immutable within a block; replaced only by an authority-gated update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Tag of the registry key entry carrying the consensus public key.
    pub validator_key_tag: u32,
    /// Tag of the registry key used to sign slash requests.
    pub signing_key_tag: u32,
    /// Heights divisible by this value are epoch boundaries.
    pub epoch_check_interval: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            validator_key_tag: DEFAULT_VALIDATOR_KEY_TAG,
            signing_key_tag: DEFAULT_SIGNING_KEY_TAG,
            epoch_check_interval: DEFAULT_EPOCH_CHECK_INTERVAL,
        }
    }
}

impl Params {
    pub fn validate(&self) -> EpochSyncResult<()> {
        let key_type = self.validator_key_tag >> 4;
        if key_type != ED25519_KEY_TYPE {
            return Err(EpochSyncError::InvalidParams {
                field: "validator_key_tag",
                reason: format!(
                    "expected key tag to be of type {} (indicating a ed25519 key), got {}",
                    ED25519_KEY_TYPE, key_type
                ),
            });
        }
        if self.epoch_check_interval == 0 {
            return Err(EpochSyncError::InvalidParams {
                field: "epoch_check_interval",
                reason: "epoch check interval must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Whether `height` is an epoch boundary.
    pub fn is_epoch_boundary(&self, height: u64) -> bool {
        self.epoch_check_interval != 0 && height % self.epoch_check_interval == 0
    }
}

/// Genesis state of the Epoch Sync subsystem.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    pub genesis_epoch: Epoch,
}

impl GenesisState {
    pub fn validate(&self) -> EpochSyncResult<()> {
        self.params.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert!(Params::default().validate().is_ok());
        assert!(GenesisState::default().validate().is_ok());
    }

    #[test]
    fn test_non_ed25519_key_tag_rejected() {
        let params = Params {
            validator_key_tag: 15,
            ..Params::default()
        };
        match params.validate() {
            Err(EpochSyncError::InvalidParams { field, .. }) => {
                assert_eq!(field, "validator_key_tag")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_zero_interval_rejected() {
        let params = Params {
            epoch_check_interval: 0,
            ..Params::default()
        };
        assert!(params.validate().is_err());
        assert!(!params.is_epoch_boundary(10));
    }

    #[test]
    fn test_epoch_boundary() {
        let params = Params::default();
        assert!(params.is_epoch_boundary(0));
        assert!(params.is_epoch_boundary(20));
        assert!(!params.is_epoch_boundary(21));
    }
}
