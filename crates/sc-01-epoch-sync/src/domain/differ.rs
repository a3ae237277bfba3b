//! # Validator Set Differ
//!
//! Computes the membership and power changes between two validator sets.
//!
//! Records are keyed by the canonical string form of their consensus key.
//! Duplicate keys within one input collapse to the last occurrence; callers
//! guarantee uniqueness upstream.
//!
//! Buckets are emitted in ascending key order. Consumers notify
//! removed → added → updated.

use shared_types::ValidatorRecord;
use std::collections::BTreeMap;

/// Result of diffing two validator sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidatorSetDiff {
    /// In old but not in new; power forced to 0.
    pub removed: Vec<ValidatorRecord>,
    /// In new but not in old.
    pub added: Vec<ValidatorRecord>,
    /// In both with a different power; carries the new record.
    pub updated: Vec<ValidatorRecord>,
}

impl ValidatorSetDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.updated.is_empty()
    }

    /// Consensus updates in the order handed to the engine:
    /// updated, then added, then removed.
    pub fn into_updates(self) -> Vec<ValidatorRecord> {
        let mut merged = self.updated;
        merged.extend(self.added);
        merged.extend(self.removed);
        merged
    }
}

fn index(records: &[ValidatorRecord]) -> BTreeMap<String, &ValidatorRecord> {
    records
        .iter()
        .map(|record| (record.pub_key.to_string(), record))
        .collect()
}

/// Diff `old` against `new`.
pub fn diff(old: &[ValidatorRecord], new: &[ValidatorRecord]) -> ValidatorSetDiff {
    let old_map = index(old);
    let new_map = index(new);
    let mut result = ValidatorSetDiff::default();

    for (key, old_val) in &old_map {
        match new_map.get(key) {
            None => result.removed.push((*old_val).clone().into_removal()),
            Some(new_val) if new_val.power != old_val.power => {
                result.updated.push((*new_val).clone())
            }
            Some(_) => {}
        }
    }

    for (key, new_val) in &new_map {
        if !old_map.contains_key(key) {
            result.added.push((*new_val).clone());
        }
    }

    result
}
