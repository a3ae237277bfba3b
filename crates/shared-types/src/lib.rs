//! # Shared Types Crate
//!
//! Primitives shared by the validator-set subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: consensus keys, addresses and validator
//!   records are defined once and used by every subsystem.
//! - **Explicit Store Handle**: subsystems never own global state. Every
//!   operation receives the `KeyValueStore` it reads from and writes to.
//! - **Deterministic Encoding**: everything persisted goes through the
//!   bincode boundary in [`codec`], and store scans are key-ordered.

pub mod codec;
pub mod entities;
pub mod errors;
pub mod ratio;
pub mod store;

pub use entities::*;
pub use errors::*;
pub use ratio::Ratio;
pub use store::{
    BatchOperation, BlockContext, BufferedStore, FileBackedKVStore, InMemoryKVStore, KeyValueStore,
};
