use thiserror::Error;

/// Raptoreum chain operation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RtmError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

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
}

impl RtmError {
    pub(crate) fn insufficient(needed: u64, available: u64) -> Self {
        RtmError::InsufficientFunds {
            needed,
            available,
            shortfall: needed.saturating_sub(available),
        }
    }
}
