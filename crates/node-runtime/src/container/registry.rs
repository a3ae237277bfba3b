//! Registry client selection.

use super::config::{RegistryConfig, RegistrySource};
use async_trait::async_trait;
use sc_01_epoch_sync::adapters::{FixtureRegistryClient, JsonRpcRegistryClient};
use sc_01_epoch_sync::domain::{ChainEpochInfo, RegistryValidatorSet, SignReceipt};
use sc_01_epoch_sync::{RegistryClient, RegistryError};
use shared_types::Epoch;
use std::sync::Arc;

/// Registry client chosen by configuration.
pub enum RegistryBackend {
    Live(JsonRpcRegistryClient),
    Fixture(FixtureRegistryClient),
}

impl RegistryBackend {
    fn client(&self) -> &dyn RegistryClient {
        match self {
            RegistryBackend::Live(client) => client,
            RegistryBackend::Fixture(client) => client,
        }
    }
}

#[async_trait]
impl RegistryClient for RegistryBackend {
    async fn get_current_epoch(&self) -> Result<Epoch, RegistryError> {
        self.client().get_current_epoch().await
    }

    async fn get_validator_set(&self, epoch: Epoch) -> Result<RegistryValidatorSet, RegistryError> {
        self.client().get_validator_set(epoch).await
    }

    async fn get_last_all_committed(&self) -> Result<Vec<ChainEpochInfo>, RegistryError> {
        self.client().get_last_all_committed().await
    }

    async fn sign_message(
        &self,
        key_tag: u32,
        message: Vec<u8>,
    ) -> Result<SignReceipt, RegistryError> {
        self.client().sign_message(key_tag, message).await
    }
}

pub type SharedRegistry = Arc<RegistryBackend>;

/// Build the registry client named by `config.source`.
pub fn build_registry_client(config: &RegistryConfig) -> Result<SharedRegistry, RegistryError> {
    match &config.source {
        RegistrySource::Live { endpoint } => {
            tracing::info!(
                "Using live registry at {} ({} attempts, {:?} base backoff)",
                endpoint,
                config.retry.max_attempts,
                config.retry.base_delay
            );
            Ok(Arc::new(RegistryBackend::Live(JsonRpcRegistryClient::new(
                endpoint.clone(),
                config.retry.clone(),
            )?)))
        }
        RegistrySource::Fixture { path } => {
            tracing::info!("Using registry fixture {}", path.display());
            Ok(Arc::new(RegistryBackend::Fixture(
                FixtureRegistryClient::from_path(path)?,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_01_epoch_sync::adapters::RetryPolicy;
    use std::io::Write;

    #[tokio::test]
    async fn test_fixture_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"0\": [\"{}\"]}}", hex::encode([1u8; 32])).unwrap();

        let client = build_registry_client(&RegistryConfig {
            source: RegistrySource::Fixture {
                path: file.path().to_path_buf(),
            },
            retry: RetryPolicy::default(),
        })
        .unwrap();

        let set = client.get_validator_set(0).await.unwrap();
        assert_eq!(set.validators.len(), 1);
    }

    #[test]
    fn test_missing_fixture_fails() {
        let result = build_registry_client(&RegistryConfig {
            source: RegistrySource::Fixture {
                path: "/no/such/fixture.json".into(),
            },
            retry: RetryPolicy::default(),
        });
        assert!(matches!(result, Err(RegistryError::Fixture { .. })));
    }

    #[test]
    fn test_live_source_builds_without_connecting() {
        let result = build_registry_client(&RegistryConfig {
            source: RegistrySource::Live {
                endpoint: "http://127.0.0.1:9/rpc".to_string(),
            },
            retry: RetryPolicy::default(),
        });
        assert!(matches!(result.as_deref(), Ok(RegistryBackend::Live(_))));
    }
}
