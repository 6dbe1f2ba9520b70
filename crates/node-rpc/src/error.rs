use thiserror::Error;

use crate::method::Method;

/// Failure of a single node RPC call. Every variant names the method.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The node answered with a JSON-RPC error object.
    #[error("RPC call {method} failed: code {code}, message: {message}")]
    Node {
        method: Method,
        code: i64,
        message: String,
    },

    #[error("RPC call {method} failed: {source}")]
    Transport {
        method: Method,
        #[source]
        source: reqwest::Error,
    },

    /// Non-JSON reply, e.g. an authentication failure page.
    #[error("RPC call {method} failed: HTTP {status}: {body}")]
    Http {
        method: Method,
        status: u16,
        body: String,
    },

    #[error("RPC call {method} returned an unexpected result: {source}")]
    Decode {
        method: Method,
        #[source]
        source: serde_json::Error,
    },
}

impl RpcError {
    /// The RPC method whose call failed.
    pub fn method(&self) -> Method {
        match self {
            RpcError::Node { method, .. }
            | RpcError::Transport { method, .. }
            | RpcError::Http { method, .. }
            | RpcError::Decode { method, .. } => *method,
        }
    }

    /// Node-reported error code, if the node produced one.
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Node { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Connection configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    #[error("invalid configuration value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
