//! JSON-RPC registry client.
//!
//! Talks JSON-RPC 2.0 over HTTP to a relay sidecar. Every call is retried a
//! bounded number of times with linear backoff (`attempt × base delay`);
//! after the last attempt the error is returned to the caller.

use crate::domain::{ChainEpochInfo, RegistryValidatorSet, SignReceipt};
use crate::error::RegistryError;
use crate::ports::outbound::RegistryClient;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared_types::Epoch;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const METHOD_CURRENT_EPOCH: &str = "relay_getCurrentEpoch";
pub const METHOD_VALIDATOR_SET: &str = "relay_getValidatorSet";
pub const METHOD_LAST_ALL_COMMITTED: &str = "relay_getLastAllCommitted";
pub const METHOD_SIGN_MESSAGE: &str = "relay_signMessage";

/// Retry budget for registry calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// JSON-RPC request structure.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

/// JSON-RPC response structure.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidatorSetParams {
    epoch: Epoch,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignMessageParams {
    key_tag: u32,
    /// `0x`-prefixed hex.
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentEpochResult {
    epoch: Epoch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LastAllCommittedResult {
    epoch_infos: Vec<ChainEpochInfo>,
}

/// Registry client over JSON-RPC.
pub struct JsonRpcRegistryClient {
    http_client: reqwest::Client,
    endpoint: String,
    retry: RetryPolicy,
    request_id: AtomicU64,
}

impl JsonRpcRegistryClient {
    pub fn new(endpoint: impl Into<String>, retry: RetryPolicy) -> Result<Self, RegistryError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RegistryError::Transport {
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            retry,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call_once<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, RegistryError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RegistryError::Transport {
                reason: e.to_string(),
            })?;

        let rpc_response: JsonRpcResponse<R> =
            response
                .json()
                .await
                .map_err(|e| RegistryError::MalformedResponse {
                    reason: e.to_string(),
                })?;

        if let Some(error) = rpc_response.error {
            return Err(RegistryError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| RegistryError::MalformedResponse {
                reason: "RPC response missing result".to_string(),
            })
    }

    async fn call<P: Serialize + Sync, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, RegistryError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.call_once(method, &params).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(
                        "[sc-01] Registry call {} failed (attempt {}/{}): {}",
                        method,
                        attempt,
                        attempts,
                        e
                    );
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.retry.delay_for(attempt)).await;
                    }
                }
            }
        }

        Err(RegistryError::RetriesExhausted {
            method: method.to_string(),
            attempts,
            last_error,
        })
    }
}

#[async_trait]
impl RegistryClient for JsonRpcRegistryClient {
    async fn get_current_epoch(&self) -> Result<Epoch, RegistryError> {
        let result: CurrentEpochResult = self.call(METHOD_CURRENT_EPOCH, ()).await?;
        Ok(result.epoch)
    }

    async fn get_validator_set(&self, epoch: Epoch) -> Result<RegistryValidatorSet, RegistryError> {
        self.call(METHOD_VALIDATOR_SET, ValidatorSetParams { epoch })
            .await
    }

    async fn get_last_all_committed(&self) -> Result<Vec<ChainEpochInfo>, RegistryError> {
        let result: LastAllCommittedResult = self.call(METHOD_LAST_ALL_COMMITTED, ()).await?;
        Ok(result.epoch_infos)
    }

    async fn sign_message(
        &self,
        key_tag: u32,
        message: Vec<u8>,
    ) -> Result<SignReceipt, RegistryError> {
        let params = SignMessageParams {
            key_tag,
            message: format!("0x{}", hex::encode(message)),
        };
        self.call(METHOD_SIGN_MESSAGE, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
    }

    #[test]
    fn test_request_shape() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: METHOD_SIGN_MESSAGE,
            params: SignMessageParams {
                key_tag: 15,
                message: "0xab".to_string(),
            },
            id: 7,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["method"], "relay_signMessage");
        assert_eq!(json["params"]["keyTag"], 15);
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn test_response_parsing() {
        let ok: JsonRpcResponse<LastAllCommittedResult> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"result":{"epochInfos":[{"lastCommittedEpoch":4}]}}"#,
        )
        .unwrap();
        assert_eq!(ok.result.unwrap().epoch_infos[0].last_committed_epoch, 4);

        let err: JsonRpcResponse<CurrentEpochResult> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"not ready"}}"#,
        )
        .unwrap();
        assert!(err.result.is_none());
        assert_eq!(err.error.unwrap().code, -32000);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_exhausts_retries() {
        // Port 9 (discard) on localhost is not expected to serve HTTP.
        let client = JsonRpcRegistryClient::new(
            "http://127.0.0.1:9/rpc",
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(10),
            },
        )
        .unwrap();

        match client.get_current_epoch().await {
            Err(RegistryError::RetriesExhausted { attempts, method, .. }) => {
                assert_eq!(attempts, 3);
                assert_eq!(method, METHOD_CURRENT_EPOCH);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
