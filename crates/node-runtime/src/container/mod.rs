//! # Node Container
//!
//! Startup wiring: configuration, registry selection, the state store and
//! the validator module.

pub mod config;
pub mod module;
pub mod registry;
pub mod storage;

pub use config::{ConfigError, NodeConfig, RegistrySource};
pub use module::{BlockOutcome, ModuleError, ValidatorModule, Vote, LIVENESS_HOOK};
pub use registry::{build_registry_client, RegistryBackend, SharedRegistry};
pub use storage::open_store;
