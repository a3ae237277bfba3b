//! Params and genesis types for the Liveness subsystem

use crate::domain::ValidatorSigningInfo;
use crate::error::{LivenessError, LivenessResult};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_types::{ConsAddress, Ratio};
use std::collections::BTreeMap;

pub const DEFAULT_SIGNED_BLOCKS_WINDOW: i64 = 100;
pub const DEFAULT_MIN_SIGNED_PER_WINDOW: Ratio = Ratio::from_bps(5_000);
pub const DEFAULT_DOWNTIME_JAIL_DURATION_SECS: i64 = 600;
pub const DEFAULT_SLASH_FRACTION_DOUBLE_SIGN: Ratio = Ratio::from_bps(500);
pub const DEFAULT_SLASH_FRACTION_DOWNTIME: Ratio = Ratio::from_bps(100);

/// Liveness parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Sliding window length `W`, in blocks.
    pub signed_blocks_window: i64,
    /// Minimum fraction of the window a validator must sign.
    pub min_signed_per_window: Ratio,
    pub downtime_jail_duration_secs: i64,
    pub slash_fraction_double_sign: Ratio,
    pub slash_fraction_downtime: Ratio,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            signed_blocks_window: DEFAULT_SIGNED_BLOCKS_WINDOW,
            min_signed_per_window: DEFAULT_MIN_SIGNED_PER_WINDOW,
            downtime_jail_duration_secs: DEFAULT_DOWNTIME_JAIL_DURATION_SECS,
            slash_fraction_double_sign: DEFAULT_SLASH_FRACTION_DOUBLE_SIGN,
            slash_fraction_downtime: DEFAULT_SLASH_FRACTION_DOWNTIME,
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> LivenessError {
    LivenessError::InvalidParams {
        field,
        reason: reason.to_string(),
    }
}

fn check_fraction(field: &'static str, name: &str, value: Ratio) -> LivenessResult<()> {
    if value.is_negative() {
        return Err(invalid(field, &format!("{} cannot be negative", name)));
    }
    if value > Ratio::ONE {
        return Err(invalid(field, &format!("{} too large: {}", name, value)));
    }
    Ok(())
}

impl Params {
    /// Checks fields in declaration order and reports the first failure.
    pub fn validate(&self) -> LivenessResult<()> {
        if self.signed_blocks_window <= 0 {
            return Err(invalid(
                "signed_blocks_window",
                "signed blocks window must be positive",
            ));
        }
        check_fraction(
            "min_signed_per_window",
            "min signed per window",
            self.min_signed_per_window,
        )?;
        if self.downtime_jail_duration_secs <= 0 {
            return Err(invalid(
                "downtime_jail_duration_secs",
                "downtime jail duration must be positive",
            ));
        }
        check_fraction(
            "slash_fraction_double_sign",
            "double sign slash fraction",
            self.slash_fraction_double_sign,
        )?;
        check_fraction(
            "slash_fraction_downtime",
            "downtime slash fraction",
            self.slash_fraction_downtime,
        )?;
        Ok(())
    }

    /// Window length as an index modulus. Only meaningful after `validate`.
    pub fn window(&self) -> u64 {
        self.signed_blocks_window.max(1) as u64
    }
}

/// Signing info of one validator in genesis.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningInfoEntry {
    #[serde_as(as = "DisplayFromStr")]
    pub address: ConsAddress,
    pub info: ValidatorSigningInfo,
}

/// One bitmap slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedBlock {
    pub index: u64,
    pub missed: bool,
}

/// Bitmap slots of one validator in genesis.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorMissedBlocks {
    #[serde_as(as = "DisplayFromStr")]
    pub address: ConsAddress,
    pub missed_blocks: Vec<MissedBlock>,
}

/// Genesis state of the Liveness subsystem.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    pub signing_infos: Vec<SigningInfoEntry>,
    pub missed_blocks: Vec<ValidatorMissedBlocks>,
}

impl GenesisState {
    /// Params must be valid, every missed-block index must fall inside the
    /// window, and each validator's missed bits must add up to its listed
    /// `missed_blocks_counter`.
    pub fn validate(&self) -> LivenessResult<()> {
        self.params.validate()?;
        let window = self.params.window();

        let mut bits: BTreeMap<ConsAddress, BTreeMap<u64, bool>> = BTreeMap::new();
        for entry in &self.missed_blocks {
            let slots = bits.entry(entry.address).or_default();
            for block in &entry.missed_blocks {
                if block.index >= window {
                    return Err(LivenessError::InvalidGenesis {
                        reason: format!(
                            "missed block index {} of {} is outside the window of {}",
                            block.index, entry.address, window
                        ),
                    });
                }
                slots.insert(block.index, block.missed);
            }
        }

        let mut counters: BTreeMap<ConsAddress, u64> = BTreeMap::new();
        for entry in &self.signing_infos {
            counters.insert(entry.address, entry.info.missed_blocks_counter);
        }

        for (address, slots) in &bits {
            let missed = slots.values().filter(|m| **m).count() as u64;
            let listed = counters.get(address).copied().unwrap_or(0);
            if missed != listed {
                return Err(LivenessError::InvalidGenesis {
                    reason: format!(
                        "{} has {} missed blocks but a counter of {}",
                        address, missed, listed
                    ),
                });
            }
        }
        for (address, listed) in &counters {
            if *listed > 0 && !bits.contains_key(address) {
                return Err(LivenessError::InvalidGenesis {
                    reason: format!(
                        "{} has no missed blocks but a counter of {}",
                        address, listed
                    ),
                });
            }
        }
        Ok(())
    }
}
