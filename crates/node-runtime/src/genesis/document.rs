//! # Genesis Document
//!
//! JSON with one section per subsystem:
//!
//! ```json
//! {
//!   "epoch_sync": { "params": { ... }, "genesis_epoch": 0 },
//!   "liveness": { "params": { ... }, "signing_infos": [], "missed_blocks": [] }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Genesis loading errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Failed to read genesis file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Invalid genesis document: {0}")]
    Parse(String),
}

/// Genesis state of every subsystem.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGenesis {
    #[serde(default)]
    pub epoch_sync: sc_01_epoch_sync::GenesisState,
    #[serde(default)]
    pub liveness: sc_02_liveness::GenesisState,
}

impl NodeGenesis {
    pub fn from_json(json: &str) -> Result<Self, GenesisError> {
        serde_json::from_str(json).map_err(|e| GenesisError::Parse(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GenesisError> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| GenesisError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, GenesisError> {
        serde_json::to_string_pretty(self).map_err(|e| GenesisError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_default_when_missing() {
        let genesis = NodeGenesis::from_json(r#"{ "epoch_sync": { "params": { "validator_key_tag": 43, "signing_key_tag": 15, "epoch_check_interval": 5 }, "genesis_epoch": 7 } }"#).unwrap();
        assert_eq!(genesis.epoch_sync.genesis_epoch, 7);
        assert_eq!(genesis.epoch_sync.params.epoch_check_interval, 5);
        assert_eq!(genesis.liveness, sc_02_liveness::GenesisState::default());
    }

    #[test]
    fn test_pretty_json_reloads() {
        let genesis = NodeGenesis::default();
        let json = genesis.to_json_pretty().unwrap();
        assert_eq!(NodeGenesis::from_json(&json).unwrap(), genesis);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            NodeGenesis::from_json("[1, 2"),
            Err(GenesisError::Parse(_))
        ));
    }
}
