use std::time::Duration;

use chain_rtm::RtmError;
use node_rpc::{ConfigError, InputSigningError, RpcError};
use thiserror::Error;

use crate::issuance::IssuanceStep;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("insufficient funds: need {needed} sat, have {available} sat (short {shortfall} sat)")]
    InsufficientFunds {
        needed: u64,
        available: u64,
        shortfall: u64,
    },

    #[error("no spendable output for asset {asset_id}{}", .unique_id.map(|id| format!("#{id}")).unwrap_or_default())]
    NoMatchingAssetOutput {
        asset_id: String,
        unique_id: Option<u64>,
    },

    /// The signer could not sign every input. `errors` is the node's
    /// per-input report, unmodified.
    #[error("incomplete signature: {}", describe_signing_errors(.errors))]
    IncompleteSignature { errors: Vec<InputSigningError> },

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("transaction {txid} not confirmed after {ticks} polls ({elapsed:?})")]
    Timeout {
        txid: String,
        ticks: u32,
        elapsed: Duration,
    },

    /// Key or address failure.
    #[error(transparent)]
    Chain(RtmError),

    #[error("asset issuance failed at {stage}: {source}")]
    Issuance {
        stage: IssuanceStep,
        #[source]
        source: Box<WalletError>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("checkpoint storage failed: {0}")]
    Storage(#[source] std::io::Error),

    #[error("checkpoint is unreadable: {0}")]
    CorruptCheckpoint(#[source] serde_json::Error),
}

impl From<RtmError> for WalletError {
    fn from(e: RtmError) -> Self {
        match e {
            RtmError::InsufficientFunds {
                needed,
                available,
                shortfall,
            } => WalletError::InsufficientFunds {
                needed,
                available,
                shortfall,
            },
            RtmError::NoMatchingAssetOutput {
                asset_id,
                unique_id,
            } => WalletError::NoMatchingAssetOutput {
                asset_id,
                unique_id,
            },
            RtmError::InvalidParameters(msg) => WalletError::InvalidParameters(msg),
            other => WalletError::Chain(other),
        }
    }
}

fn describe_signing_errors(errors: &[InputSigningError]) -> String {
    if errors.is_empty() {
        return "no detail from signer".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{}:{} {}", e.txid, e.vout, e.error))
        .collect::<Vec<_>>()
        .join("; ")
}
