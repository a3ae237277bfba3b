//! # Validator Set Resolver
//!
//! Turns registry validator records into consensus `(pub_key, power)` pairs.
//!
//! The first key entry whose tag equals the configured validator key tag and
//! whose payload has the ed25519 key size is used; other entries are skipped.
//! A single unresolvable record fails the whole set so that a data problem at
//! the registry can never silently shrink the validator set.

use super::registry::{RegistryKey, RegistryValidator};
use crate::error::ResolutionError;
use shared_types::{ConsensusPubKey, KeyAlgorithm, ValidatorRecord};

/// Pick the consensus key among a validator's tagged keys.
pub fn extract_consensus_key(keys: &[RegistryKey], key_tag: u32) -> Option<ConsensusPubKey> {
    keys.iter()
        .filter(|key| key.tag == key_tag)
        .find_map(|key| ConsensusPubKey::new(KeyAlgorithm::Ed25519, key.payload.clone()).ok())
}

/// Resolve a single registry record.
pub fn resolve_validator(
    validator: &RegistryValidator,
    key_tag: u32,
) -> Result<ValidatorRecord, ResolutionError> {
    let pub_key = extract_consensus_key(&validator.keys, key_tag).ok_or_else(|| {
        ResolutionError::MissingConsensusKey {
            operator: validator.operator.clone(),
            key_tag,
        }
    })?;

    let power: i64 = validator.voting_power.trim().parse().map_err(|_| {
        ResolutionError::InvalidVotingPower {
            operator: validator.operator.clone(),
            value: validator.voting_power.clone(),
        }
    })?;
    if power < 0 {
        return Err(ResolutionError::NegativeVotingPower {
            operator: validator.operator.clone(),
            power,
        });
    }

    Ok(ValidatorRecord::new(pub_key, power))
}

/// Resolve a full set; all or nothing.
pub fn resolve_validator_set(
    validators: &[RegistryValidator],
    key_tag: u32,
) -> Result<Vec<ValidatorRecord>, ResolutionError> {
    validators
        .iter()
        .map(|v| resolve_validator(v, key_tag))
        .collect()
}
