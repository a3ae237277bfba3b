//! Slash request payload submitted to the registry for signing.

use serde::{Deserialize, Serialize};
use shared_types::{Height, Ratio};
use std::fmt;

/// Infraction category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Infraction {
    Unspecified,
    DoubleSign,
    Downtime,
}

impl Infraction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Infraction::Unspecified => "INFRACTION_UNSPECIFIED",
            Infraction::DoubleSign => "INFRACTION_DOUBLE_SIGN",
            Infraction::Downtime => "INFRACTION_DOWNTIME",
        }
    }
}

impl fmt::Display for Infraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON body signed by the registry as slashing evidence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashMessage {
    /// `0x`-prefixed hex of the consensus public key.
    pub validator_pk: String,
    pub infraction_type: String,
    /// The relay reads this field as `infractionHeigh`.
    #[serde(rename = "infractionHeigh")]
    pub infraction_height: Height,
    pub power: i64,
    pub slash_factor: Ratio,
}

impl SlashMessage {
    pub fn new(
        validator_pub_key: &[u8],
        infraction_height: Height,
        power: i64,
        slash_factor: Ratio,
        infraction: Infraction,
    ) -> Self {
        Self {
            validator_pk: format!("0x{}", hex::encode(validator_pub_key)),
            infraction_type: infraction.to_string(),
            infraction_height,
            power,
            slash_factor,
        }
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
