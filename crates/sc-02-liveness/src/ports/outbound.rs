//! Driven Ports (SPI - Outbound Dependencies)

use crate::error::LivenessResult;
use shared_types::{KeyValueStore, ValidatorRecord};

/// Read access to the currently bonded validators.
///
/// Used once, at genesis import, to seed signing info for every validator.
pub trait ValidatorSetSource: Send + Sync {
    fn bonded_validators(&self, store: &dyn KeyValueStore) -> LivenessResult<Vec<ValidatorRecord>>;
}
