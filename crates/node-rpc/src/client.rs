use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::RpcConfig;
use crate::error::{ConfigError, RpcError};
use crate::method::Method;

/// Generic JSON-RPC invocation against a node.
///
/// Implementations own connection state (endpoint, credentials); callers
/// only see method names and JSON values. Errors always name the method.
#[async_trait]
pub trait RpcClient: Send + Sync {
    async fn call(&self, method: Method, params: Vec<Value>) -> Result<Value, RpcError>;
}

#[derive(Deserialize)]
struct NodeErrorObject {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<NodeErrorObject>,
}

/// HTTP transport speaking the bitcoind-style JSON-RPC 1.0 dialect with
/// basic authentication.
pub struct HttpRpcClient {
    http: Client,
    config: RpcConfig,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    pub fn new(config: RpcConfig) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ConfigError::Client)?;
        Ok(Self {
            http,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }
}

#[async_trait]
impl RpcClient for HttpRpcClient {
    async fn call(&self, method: Method, params: Vec<Value>) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        // params are not logged: signing calls carry the private key
        log::debug!("rpc -> {method} (id {id})");

        let request = json!({
            "jsonrpc": "1.0",
            "id": id,
            "method": method.as_str(),
            "params": params,
        });

        let response = self
            .http
            .post(self.config.url())
            .basic_auth(&self.config.user, Some(self.config.password.expose_secret()))
            .json(&request)
            .send()
            .await
            .map_err(|source| RpcError::Transport { method, source })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|source| RpcError::Transport { method, source })?;

        // bitcoind-style nodes report errors with HTTP 500 and a JSON body,
        // so the body is parsed before looking at the status.
        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) => {
                log::warn!("rpc <- {method}: HTTP {status}, non-JSON body");
                return Err(RpcError::Http {
                    method,
                    status,
                    body,
                });
            }
        };

        if let Some(error) = envelope.error {
            log::warn!(
                "rpc <- {method}: node error {}: {}",
                error.code,
                error.message
            );
            return Err(RpcError::Node {
                method,
                code: error.code,
                message: error.message,
            });
        }

        log::debug!("rpc <- {method} (id {id}) ok");
        Ok(envelope.result)
    }
}

/// Deserialize a call's result into `T`.
pub async fn call_as<T, C>(client: &C, method: Method, params: Vec<Value>) -> Result<T, RpcError>
where
    T: serde::de::DeserializeOwned,
    C: RpcClient + ?Sized,
{
    let value = client.call(method, params).await?;
    serde_json::from_value(value).map_err(|source| RpcError::Decode { method, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_error_object() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"result":null,"error":{"code":-5,"message":"Invalid address"},"id":1}"#,
        )
        .unwrap();
        let error = envelope.error.unwrap();
        assert_eq!(error.code, -5);
        assert_eq!(error.message, "Invalid address");
    }

    #[test]
    fn envelope_with_null_error() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"result":"00ab","error":null,"id":1}"#).unwrap();
        assert!(envelope.error.is_none());
        assert_eq!(envelope.result, json!("00ab"));
    }

    #[test]
    fn client_builds_from_config() {
        let client = HttpRpcClient::new(RpcConfig::new("127.0.0.1", 19444, "u", "p")).unwrap();
        assert_eq!(client.config().url(), "http://127.0.0.1:19444");
    }

    #[tokio::test]
    async fn unreachable_node_is_transport_error() {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = RpcConfig::new("127.0.0.1", 1, "u", "p")
            .with_timeout(std::time::Duration::from_secs(2));
        let client = HttpRpcClient::new(config).unwrap();

        let err = client
            .call(Method::GetBestBlockHash, Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Transport { .. }));
        assert_eq!(err.method(), Method::GetBestBlockHash);
    }
}
