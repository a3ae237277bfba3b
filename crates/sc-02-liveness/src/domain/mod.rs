//! Domain layer for Liveness

pub mod bitmap;
pub mod liveness_store;
pub mod signing_info;

pub use bitmap::{MissedBlockBitmap, CHUNK_BITS};
pub use liveness_store::LivenessStore;
pub use signing_info::{is_downtime, ValidatorSigningInfo};
