//! Validator set listener that keeps signing info in step with membership.

use crate::domain::{LivenessStore, ValidatorSigningInfo};
use sc_01_epoch_sync::{HookError, ValidatorSetHooks};
use shared_types::{BlockContext, ConsensusPubKey, Height, KeyValueStore, StoreError};

/// Registered with the Epoch Sync hook dispatcher.
#[derive(Clone, Copy, Debug, Default)]
pub struct LivenessHooks;

impl LivenessHooks {
    pub fn new() -> Self {
        Self
    }
}

/// Start (or restart) tracking a bonded validator at `height`.
///
/// Existing history is kept; only `start_height` moves.
fn bond_validator(
    store: &mut dyn KeyValueStore,
    height: Height,
    pub_key: &ConsensusPubKey,
) -> Result<(), StoreError> {
    LivenessStore::add_pub_key(store, pub_key)?;

    let address = pub_key.address();
    let info = match LivenessStore::signing_info(store, &address)? {
        Some(mut info) => {
            info.start_height = height;
            info
        }
        None => ValidatorSigningInfo::new(address, height),
    };
    LivenessStore::set_signing_info(store, &info)
}

impl ValidatorSetHooks for LivenessHooks {
    fn after_validator_created(
        &self,
        ctx: &mut BlockContext<'_>,
        pub_key: &ConsensusPubKey,
    ) -> Result<(), HookError> {
        tracing::debug!(
            "[sc-02] Tracking validator {} from height {}",
            pub_key.address(),
            ctx.height
        );
        bond_validator(&mut *ctx.store, ctx.height, pub_key)?;
        Ok(())
    }

    fn after_validator_modified(
        &self,
        _ctx: &mut BlockContext<'_>,
        _pub_key: &ConsensusPubKey,
    ) -> Result<(), HookError> {
        Ok(())
    }

    fn after_validator_removed(
        &self,
        ctx: &mut BlockContext<'_>,
        pub_key: &ConsensusPubKey,
    ) -> Result<(), HookError> {
        let address = pub_key.address();
        tracing::debug!("[sc-02] Validator {} left the set", address);
        LivenessStore::delete_pub_key(&mut *ctx.store, &address)?;
        Ok(())
    }
}
