//! Epoch claim carried as the leading payload item of boundary blocks.
//!
//! Layout: `b"EPC1"` followed by the persistence-codec encoding of
//! [`EpochClaim`]. A payload item without the marker is not a claim; one with
//! the marker and an undecodable body (or trailing bytes) is malformed.

use serde::{Deserialize, Serialize};
use shared_types::{codec, Epoch};

pub const CLAIM_MAGIC: &[u8; 4] = b"EPC1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochClaim {
    pub epoch: Epoch,
}

impl EpochClaim {
    pub fn new(epoch: Epoch) -> Self {
        Self { epoch }
    }

    pub fn encode(&self) -> Result<Vec<u8>, String> {
        let body = codec::encode(self).map_err(|e| e.to_string())?;
        let mut out = Vec::with_capacity(CLAIM_MAGIC.len() + body.len());
        out.extend_from_slice(CLAIM_MAGIC);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Whether a payload item is marked as an epoch claim.
    pub fn is_claim(bytes: &[u8]) -> bool {
        bytes.starts_with(CLAIM_MAGIC)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let body = bytes
            .strip_prefix(CLAIM_MAGIC.as_slice())
            .ok_or_else(|| "missing epoch claim marker".to_string())?;
        codec::decode(body).map_err(|e| e.to_string())
    }
}
