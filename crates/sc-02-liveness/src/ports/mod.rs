//! Ports for Liveness (Hexagonal Architecture)

pub mod inbound;
pub mod outbound;

pub use inbound::{LivenessApi, LivenessQuery, SignatureOutcome};
pub use outbound::ValidatorSetSource;
