//! Node connection settings.
//!
//! Built explicitly with [`RpcConfig::new`], or from the environment (and an
//! optional `.env` file) with [`RpcConfig::from_env`]:
//!
//! - `RTM_RPC_HOST` (default `127.0.0.1`)
//! - `RTM_RPC_PORT` (default: the caller-supplied network port)
//! - `RTM_RPC_USER`, `RTM_RPC_PASSWORD` (required)
//! - `RTM_RPC_TIMEOUT_SECS` (default 30)

use std::env;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct RpcConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
}

impl RpcConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: SecretString::from(password.into()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint URL for JSON-RPC requests.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Load from `RTM_RPC_*` environment variables, reading `.env` first.
    pub fn from_env(default_port: u16) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok(), default_port)
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F, default_port: u16) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("RTM_RPC_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("RTM_RPC_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "RTM_RPC_PORT",
                value: raw,
            })?,
            None => default_port,
        };

        let user = lookup("RTM_RPC_USER").ok_or(ConfigError::Missing("RTM_RPC_USER"))?;
        let password = lookup("RTM_RPC_PASSWORD").ok_or(ConfigError::Missing("RTM_RPC_PASSWORD"))?;

        let timeout = match lookup("RTM_RPC_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                ConfigError::Invalid {
                    key: "RTM_RPC_TIMEOUT_SECS",
                    value: raw,
                }
            })?),
            None => DEFAULT_TIMEOUT,
        };

        log::debug!("node RPC endpoint {host}:{port} as {user}");

        Ok(Self::new(host, port, user, password).with_timeout(timeout))
    }
}
