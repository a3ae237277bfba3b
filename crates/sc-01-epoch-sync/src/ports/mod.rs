//! Ports for Epoch Sync (Hexagonal Architecture)

pub mod inbound;
pub mod outbound;

pub use inbound::{EpochSyncApi, EpochSyncQuery};
pub use outbound::RegistryClient;
