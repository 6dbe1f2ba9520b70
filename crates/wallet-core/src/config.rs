//! Wallet settings: active network, node connection, fee and poll interval.
//!
//! Read from the environment (after loading `.env`) by
//! [`WalletConfig::from_env`]:
//!
//! - `RTM_NETWORK`: `mainnet`, `testnet` or `regtest` (required)
//! - `RTM_FEE_SAT`: flat fee per transfer (default 10000)
//! - `RTM_POLL_INTERVAL_MS`: confirmation poll interval (default 1000)
//! - the `RTM_RPC_*` keys read by [`RpcConfig`], with the port defaulting to
//!   the network's standard RPC port

use std::env;
use std::time::Duration;

use chain_rtm::{RtmNetwork, DEFAULT_FEE_SAT};
use node_rpc::{ConfigError, RpcConfig};

use crate::error::WalletError;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);

#[derive(Clone, Debug)]
pub struct WalletConfig {
    pub network: RtmNetwork,
    pub rpc: RpcConfig,
    pub fee_sat: u64,
    pub poll_interval: Duration,
}

impl WalletConfig {
    pub fn new(network: RtmNetwork, rpc: RpcConfig) -> Self {
        Self {
            network,
            rpc,
            fee_sat: DEFAULT_FEE_SAT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn from_env() -> Result<Self, WalletError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, WalletError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network: RtmNetwork = lookup("RTM_NETWORK")
            .ok_or(ConfigError::Missing("RTM_NETWORK"))?
            .parse()?;

        let rpc = RpcConfig::from_lookup(&lookup, network.default_rpc_port())?;

        let fee_sat = parse_or(&lookup, "RTM_FEE_SAT", DEFAULT_FEE_SAT)?;
        let poll_interval = Duration::from_millis(parse_or(
            &lookup,
            "RTM_POLL_INTERVAL_MS",
            DEFAULT_POLL_INTERVAL_MS,
        )?);

        log::info!("wallet configured for {network}");

        Ok(Self {
            network,
            rpc,
            fee_sat,
            poll_interval,
        })
    }
}

fn parse_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
