//! # Core Domain Entities
//!
//! Validator identity and membership types shared by the epoch-sync and
//! liveness subsystems.
//!
//! ## Clusters
//!
//! - **Identity**: `ConsensusPubKey`, `KeyAlgorithm`, `ConsAddress`
//! - **Membership**: `ValidatorRecord`, `ValidatorSetSnapshot`

use crate::errors::KeyError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Registry epoch number. Never decreases across the chain's history.
pub type Epoch = u64;

/// Block height.
pub type Height = u64;

/// Size of a consensus address in bytes.
pub const CONS_ADDRESS_SIZE: usize = 20;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Signature algorithm of a consensus key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    Ed25519,
}

impl KeyAlgorithm {
    /// Expected public key payload size in bytes.
    pub const fn key_size(self) -> usize {
        match self {
            KeyAlgorithm::Ed25519 => 32,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            KeyAlgorithm::Ed25519 => "ed25519",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validator's consensus public key.
///
/// The `Display` form (`"ed25519:<UPPER-HEX>"`) is canonical and is the
/// identity used when comparing validator sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConsensusPubKey {
    algorithm: KeyAlgorithm,
    bytes: Vec<u8>,
}

impl ConsensusPubKey {
    /// Create a key, checking the payload size against the algorithm.
    pub fn new(algorithm: KeyAlgorithm, bytes: Vec<u8>) -> Result<Self, KeyError> {
        if bytes.len() != algorithm.key_size() {
            return Err(KeyError::InvalidLength {
                algorithm: algorithm.name(),
                expected: algorithm.key_size(),
                actual: bytes.len(),
            });
        }
        Ok(Self { algorithm, bytes })
    }

    pub fn ed25519(bytes: [u8; 32]) -> Self {
        Self {
            algorithm: KeyAlgorithm::Ed25519,
            bytes: bytes.to_vec(),
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consensus address: first 20 bytes of SHA-256 over the key bytes.
    pub fn address(&self) -> ConsAddress {
        let digest = Sha256::digest(&self.bytes);
        let mut out = [0u8; CONS_ADDRESS_SIZE];
        out.copy_from_slice(&digest[..CONS_ADDRESS_SIZE]);
        ConsAddress(out)
    }
}

impl fmt::Display for ConsensusPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, hex::encode_upper(&self.bytes))
    }
}

/// Consensus address derived from a validator's consensus key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConsAddress(pub [u8; CONS_ADDRESS_SIZE]);

impl ConsAddress {
    pub fn new(bytes: [u8; CONS_ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; CONS_ADDRESS_SIZE] = bytes.try_into().map_err(|_| {
            KeyError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                CONS_ADDRESS_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; CONS_ADDRESS_SIZE] {
        &self.0
    }
}

impl fmt::Display for ConsAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ConsAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsAddress({})", self)
    }
}

impl FromStr for ConsAddress {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| KeyError::InvalidAddress(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

// =============================================================================
// CLUSTER B: MEMBERSHIP
// =============================================================================

/// A consensus-usable validator entry.
///
/// A power of 0 is an explicit removal signal to the consensus engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    pub pub_key: ConsensusPubKey,
    pub power: i64,
}

impl ValidatorRecord {
    pub fn new(pub_key: ConsensusPubKey, power: i64) -> Self {
        Self { pub_key, power }
    }

    /// The same validator with power forced to 0.
    pub fn into_removal(mut self) -> Self {
        self.power = 0;
        self
    }
}

/// The validator set applied for an epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSetSnapshot {
    pub epoch: Epoch,
    pub validators: Vec<ValidatorRecord>,
}

impl ValidatorSetSnapshot {
    pub fn new(epoch: Epoch, validators: Vec<ValidatorRecord>) -> Self {
        Self { epoch, validators }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Sum of voting power across the set.
    pub fn total_power(&self) -> i64 {
        self.validators
            .iter()
            .fold(0i64, |acc, v| acc.saturating_add(v.power))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubkey_rejects_wrong_length() {
        let err = ConsensusPubKey::new(KeyAlgorithm::Ed25519, vec![1u8; 33]).unwrap_err();
        assert_eq!(
            err,
            KeyError::InvalidLength {
                algorithm: "ed25519",
                expected: 32,
                actual: 33
            }
        );
    }

    #[test]
    fn test_pubkey_canonical_form() {
        let key = ConsensusPubKey::ed25519([0xab; 32]);
        let s = key.to_string();
        assert!(s.starts_with("ed25519:ABAB"));
        assert_eq!(s.len(), "ed25519:".len() + 64);
    }

    #[test]
    fn test_address_is_truncated_sha256() {
        let key = ConsensusPubKey::ed25519([7u8; 32]);
        let digest = Sha256::digest([7u8; 32]);
        assert_eq!(key.address().as_bytes(), &digest[..20]);
    }

    #[test]
    fn test_address_hex_roundtrip() {
        let addr = ConsensusPubKey::ed25519([9u8; 32]).address();
        let parsed: ConsAddress = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
        assert!("0x1234".parse::<ConsAddress>().is_err());
    }

    #[test]
    fn test_snapshot_total_power() {
        let snapshot = ValidatorSetSnapshot::new(
            3,
            vec![
                ValidatorRecord::new(ConsensusPubKey::ed25519([1; 32]), 10),
                ValidatorRecord::new(ConsensusPubKey::ed25519([2; 32]), 20),
            ],
        );
        assert_eq!(snapshot.total_power(), 30);
        assert_eq!(snapshot.len(), 2);
    }
}
