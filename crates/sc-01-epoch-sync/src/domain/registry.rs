//! Registry data model
//!
//! Wire-level shapes returned by the external validator registry. These are
//! untrusted input: nothing here enters consensus state before passing
//! through the resolver.

use serde::{Deserialize, Serialize};
use shared_types::Epoch;

/// A tagged key entry of a registry validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryKey {
    pub tag: u32,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
}

/// A validator as reported by the registry for one epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryValidator {
    pub operator: String,
    /// Decimal string.
    pub voting_power: String,
    pub is_active: bool,
    pub keys: Vec<RegistryKey>,
}

/// Registry validator set response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryValidatorSet {
    pub epoch: Epoch,
    pub validators: Vec<RegistryValidator>,
}

/// Last committed epoch of one downstream settlement target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEpochInfo {
    pub last_committed_epoch: Epoch,
}

/// Receipt for a message submitted for signing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignReceipt {
    pub request_hash: String,
    pub epoch: Epoch,
}

/// Lowest committed epoch across all targets.
///
/// A target reporting 0 has not committed anything yet and is ignored unless
/// every target reports 0. `None` when no target reported at all.
pub fn lowest_committed_epoch(infos: &[ChainEpochInfo]) -> Option<Epoch> {
    let lowest_nonzero = infos
        .iter()
        .map(|info| info.last_committed_epoch)
        .filter(|epoch| *epoch != 0)
        .min();

    match lowest_nonzero {
        Some(epoch) => Some(epoch),
        None if infos.is_empty() => None,
        None => Some(0),
    }
}

/// `0x`-prefixed hex for key payloads on the wire.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infos(epochs: &[Epoch]) -> Vec<ChainEpochInfo> {
        epochs
            .iter()
            .map(|e| ChainEpochInfo {
                last_committed_epoch: *e,
            })
            .collect()
    }

    #[test]
    fn test_lowest_committed_epoch() {
        assert_eq!(lowest_committed_epoch(&infos(&[7, 5, 9])), Some(5));
        assert_eq!(lowest_committed_epoch(&infos(&[0, 5, 9])), Some(5));
        assert_eq!(lowest_committed_epoch(&infos(&[0, 0])), Some(0));
        assert_eq!(lowest_committed_epoch(&[]), None);
    }

    #[test]
    fn test_validator_wire_format() {
        let json = r#"{
            "operator": "0xValidator0",
            "votingPower": "10000",
            "isActive": true,
            "keys": [{"tag": 43, "payload": "0x0102"}]
        }"#;
        let v: RegistryValidator = serde_json::from_str(json).unwrap();
        assert_eq!(v.voting_power, "10000");
        assert_eq!(v.keys[0].payload, vec![1, 2]);
    }
}
