//! Validator signing info and the downtime rule.

use crate::types::Params;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_types::ratio::BPS_SCALE;
use shared_types::{ConsAddress, Height};

/// Liveness record of one validator.
///
/// `missed_blocks_counter` always equals the number of set bits in the
/// validator's missed-block bitmap.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSigningInfo {
    #[serde_as(as = "DisplayFromStr")]
    pub address: ConsAddress,
    /// Height at which the validator (re)joined the set.
    pub start_height: Height,
    /// Observations recorded so far. The bitmap slot is `index_offset mod W`.
    pub index_offset: u64,
    pub missed_blocks_counter: u64,
    /// Unix seconds until which the validator is jailed.
    pub jailed_until: Option<u64>,
    pub tombstoned: bool,
}

impl ValidatorSigningInfo {
    /// Fresh info for a validator joining at `start_height`.
    pub fn new(address: ConsAddress, start_height: Height) -> Self {
        Self {
            address,
            start_height,
            index_offset: 0,
            missed_blocks_counter: 0,
            jailed_until: None,
            tombstoned: false,
        }
    }
}

/// Whether `missed` misses over the observations up to and including slot
/// `index_offset` exceed the allowed fraction.
///
/// Evaluates `missed / min(W, index_offset + 1) > 1 - min_signed_per_window`
/// in integer basis points.
pub fn is_downtime(params: &Params, missed: u64, index_offset: u64) -> bool {
    let observed = params.window().min(index_offset.saturating_add(1)) as u128;
    let min_signed = params.min_signed_per_window.bps().clamp(0, BPS_SCALE) as u128;
    let allowed_bps = BPS_SCALE as u128 - min_signed;
    (missed as u128) * (BPS_SCALE as u128) > allowed_bps * observed
}
