//! # Node Runtime Library
//!
//! Composition root for the validator-set node. The `main.rs` binary uses
//! these modules; the integration tests drive them directly.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration, registry selection, store, module wiring
//! - `genesis/` - Genesis document loading
//! - `runtime` - Single-node block driver
//! - `telemetry` - Tracing subscriber setup
//!
//! ## Block Flow
//!
//! ```text
//! prepare_proposal ──→ process_proposal ──→ finalize_block
//!   (claim epoch)        (verify claim)       ├── pre_block (commit epoch)
//!                                             ├── handle_validator_signature × votes
//!                                             └── end_block ──→ hooks ──→ Liveness
//! ```

pub mod container;
pub mod genesis;
pub mod runtime;
pub mod telemetry;

pub use container::{
    build_registry_client, open_store, BlockOutcome, ConfigError, ModuleError, NodeConfig,
    RegistryBackend, RegistrySource, SharedRegistry, ValidatorModule, Vote,
};
pub use genesis::NodeGenesis;
pub use runtime::NodeRuntime;
