//! # Node Configuration
//!
//! Loaded from a TOML file. Every section and field is optional and falls
//! back to the defaults below.
//!
//! ```toml
//! [registry]
//! source = "fixture"            # or "live"
//! path = "fixtures/validators.json"
//! # endpoint = "http://127.0.0.1:8080/rpc"
//! max_attempts = 3
//! backoff_ms = 200
//!
//! [logging]
//! level = "info"
//! json = false
//!
//! [storage]
//! path = "./data/state.bin"     # omitted => in-memory
//!
//! [governance]
//! authority = "gov"
//!
//! [hooks]
//! order = ["liveness"]
//!
//! [node]
//! block_interval_ms = 1000
//! genesis = "genesis.json"
//! ```

use sc_01_epoch_sync::adapters::RetryPolicy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_FIXTURE_PATH: &str = "fixtures/validators.json";
pub const DEFAULT_AUTHORITY: &str = "gov";
pub const DEFAULT_BLOCK_INTERVAL_MS: u64 = 1_000;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Where validator sets come from. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// JSON-RPC relay endpoint.
    Live { endpoint: String },
    /// Local fixture file.
    Fixture { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub source: RegistrySource,
    pub retry: RetryPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            source: RegistrySource::Fixture {
                path: PathBuf::from(DEFAULT_FIXTURE_PATH),
            },
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`.
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    /// State file; `None` keeps state in memory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceConfig {
    pub authority: String,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            authority: DEFAULT_AUTHORITY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HooksConfig {
    /// Listener names in dispatch order; empty keeps registration order.
    pub order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub block_interval: Duration,
    /// Genesis JSON; defaults are used when absent.
    pub genesis: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            block_interval: Duration::from_millis(DEFAULT_BLOCK_INTERVAL_MS),
            genesis: None,
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConfig {
    pub registry: RegistryConfig,
    pub logging: LogConfig,
    pub storage: StorageConfig,
    pub governance: GovernanceConfig,
    pub hooks: HooksConfig,
    pub node: RunConfig,
}

// Raw file layout. Everything optional so partial files work.

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    registry: RegistryFile,
    #[serde(default)]
    logging: LoggingFile,
    #[serde(default)]
    storage: StorageFile,
    #[serde(default)]
    governance: GovernanceFile,
    #[serde(default)]
    hooks: HooksFile,
    #[serde(default)]
    node: NodeFile,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    source: Option<String>,
    path: Option<PathBuf>,
    endpoint: Option<String>,
    max_attempts: Option<u32>,
    backoff_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingFile {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct StorageFile {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct GovernanceFile {
    authority: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HooksFile {
    #[serde(default)]
    order: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NodeFile {
    block_interval_ms: Option<u64>,
    genesis: Option<PathBuf>,
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let config = Self::from_file(file)?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let defaults = NodeConfig::default();

        let reg = file.registry;
        let source = match reg.source.as_deref().unwrap_or("fixture") {
            "live" => RegistrySource::Live {
                endpoint: reg
                    .endpoint
                    .ok_or_else(|| invalid("registry.endpoint", "required when source = \"live\""))?,
            },
            "fixture" => RegistrySource::Fixture {
                path: reg.path.unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURE_PATH)),
            },
            other => {
                return Err(invalid(
                    "registry.source",
                    format!("expected \"live\" or \"fixture\", got \"{}\"", other),
                ))
            }
        };
        let retry = RetryPolicy {
            max_attempts: reg.max_attempts.unwrap_or(defaults.registry.retry.max_attempts),
            base_delay: reg
                .backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.registry.retry.base_delay),
        };

        Ok(Self {
            registry: RegistryConfig { source, retry },
            logging: LogConfig {
                level: file.logging.level.unwrap_or(defaults.logging.level),
                json: file.logging.json.unwrap_or(defaults.logging.json),
            },
            storage: StorageConfig {
                path: file.storage.path,
            },
            governance: GovernanceConfig {
                authority: file
                    .governance
                    .authority
                    .unwrap_or(defaults.governance.authority),
            },
            hooks: HooksConfig {
                order: file.hooks.order,
            },
            node: RunConfig {
                block_interval: file
                    .node
                    .block_interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.node.block_interval),
                genesis: file.node.genesis,
            },
        })
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let RegistrySource::Live { endpoint } = &self.registry.source {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(invalid(
                    "registry.endpoint",
                    format!("expected an http(s) URL, got \"{}\"", endpoint),
                ));
            }
        }
        if self.registry.retry.max_attempts == 0 {
            return Err(invalid("registry.max_attempts", "must be at least 1"));
        }
        if self.governance.authority.trim().is_empty() {
            return Err(invalid("governance.authority", "must not be empty"));
        }
        if self.node.block_interval.is_zero() {
            return Err(invalid("node.block_interval_ms", "must be positive"));
        }
        let mut seen = std::collections::HashSet::new();
        for name in &self.hooks.order {
            if !seen.insert(name.as_str()) {
                return Err(invalid("hooks.order", format!("duplicate listener \"{}\"", name)));
            }
        }
        Ok(())
    }
}
