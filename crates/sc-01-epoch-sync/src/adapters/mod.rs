//! Adapters for the registry port
//!
//! - `fixture_registry`: deterministic in-process registry driven by a JSON
//!   fixture, used when no live registry is configured.
//! - `json_rpc_registry`: live registry over JSON-RPC with bounded retry.
//! - `mock_registry`: scriptable registry for tests.

pub mod fixture_registry;
pub mod json_rpc_registry;
pub mod mock_registry;

pub use fixture_registry::FixtureRegistryClient;
pub use json_rpc_registry::{JsonRpcRegistryClient, RetryPolicy};
pub use mock_registry::{registry_validator, MockRegistryClient};
