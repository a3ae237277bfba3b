//! # Node Runtime
//!
//! Usage: `node-runtime [config.toml]`
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file argument, or defaults)
//! 2. Initialize tracing
//! 3. Select the registry client and open the state store
//! 4. Wire Epoch Sync and Liveness
//! 5. Import genesis on a fresh store, otherwise resume
//! 6. Produce blocks until Ctrl+C

use anyhow::{Context, Result};
use node_runtime::{
    build_registry_client, open_store, telemetry, NodeConfig, NodeGenesis, NodeRuntime,
    ValidatorModule,
};
use sc_01_epoch_sync::RegistryClient;
use tracing::{error, info, warn};

fn load_config() -> Result<NodeConfig> {
    match std::env::args().nth(1) {
        Some(path) => NodeConfig::load(&path).with_context(|| format!("loading config {}", path)),
        None => Ok(NodeConfig::default()),
    }
}

fn load_genesis(config: &NodeConfig) -> Result<NodeGenesis> {
    match &config.node.genesis {
        Some(path) => NodeGenesis::load(path)
            .with_context(|| format!("loading genesis {}", path.display())),
        None => Ok(NodeGenesis::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    telemetry::init_tracing(&config.logging)?;

    info!("===========================================");
    info!("  Validator Node Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let registry = build_registry_client(&config.registry).context("building registry client")?;
    match registry.get_current_epoch().await {
        Ok(epoch) => info!("Registry reports epoch {}", epoch),
        Err(e) => warn!("Registry unreachable at startup: {}", e),
    }
    let store = open_store(&config.storage).context("opening state store")?;
    let module = ValidatorModule::builder(registry)
        .governance(config.governance.clone())
        .hooks(config.hooks.clone())
        .build()?;

    let genesis = load_genesis(&config)?;
    let mut node = NodeRuntime::new(module, store);
    node.start(&genesis).await?;

    info!("Node is running. Press Ctrl+C to stop.");
    let mut ticker = tokio::time::interval(config.node.block_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = node.produce_block().await {
                    error!("Block {} failed: {}", node.height() + 1, e);
                    return Err(e.into());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down at height {}", node.height());
                break;
            }
        }
    }

    Ok(())
}
