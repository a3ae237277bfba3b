//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::{ChainEpochInfo, RegistryValidatorSet, SignReceipt};
use crate::error::RegistryError;
use async_trait::async_trait;
use shared_types::Epoch;
use std::sync::Arc;

/// Typed interface to the external validator registry.
///
/// Implementations may perform network I/O. Results are untrusted and are
/// only ever consumed by the propose phase or re-validated before use.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Epoch the registry currently considers active.
    ///
    /// Mirrors `relay_getCurrentEpoch`. Block processing never reads it; the
    /// node only logs it at startup. Consensus follows committed epochs.
    async fn get_current_epoch(&self) -> Result<Epoch, RegistryError>;

    /// Validator set registered for `epoch`.
    async fn get_validator_set(&self, epoch: Epoch) -> Result<RegistryValidatorSet, RegistryError>;

    /// Last committed epoch of every downstream settlement target.
    async fn get_last_all_committed(&self) -> Result<Vec<ChainEpochInfo>, RegistryError>;

    /// Submit `message` for signing with the key identified by `key_tag`.
    async fn sign_message(&self, key_tag: u32, message: Vec<u8>)
        -> Result<SignReceipt, RegistryError>;
}

#[async_trait]
impl<T: RegistryClient + ?Sized> RegistryClient for Arc<T> {
    async fn get_current_epoch(&self) -> Result<Epoch, RegistryError> {
        (**self).get_current_epoch().await
    }

    async fn get_validator_set(&self, epoch: Epoch) -> Result<RegistryValidatorSet, RegistryError> {
        (**self).get_validator_set(epoch).await
    }

    async fn get_last_all_committed(&self) -> Result<Vec<ChainEpochInfo>, RegistryError> {
        (**self).get_last_all_committed().await
    }

    async fn sign_message(
        &self,
        key_tag: u32,
        message: Vec<u8>,
    ) -> Result<SignReceipt, RegistryError> {
        (**self).sign_message(key_tag, message).await
    }
}
