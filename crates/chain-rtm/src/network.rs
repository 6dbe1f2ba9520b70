use std::str::FromStr;

use crate::error::RtmError;

/// Extended-key (BIP-32) version words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bip32Versions {
    pub public: u32,
    pub private: u32,
}

/// Static constants that define one Raptoreum chain variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    /// Prefix prepended to messages before signing.
    pub message_prefix: &'static str,
    /// Bech32 human-readable part.
    pub bech32_hrp: &'static str,
    pub bip32: Bip32Versions,
    /// Base58 version byte for P2PKH addresses.
    pub pubkey_hash: u8,
    /// Base58 version byte for P2SH addresses.
    pub script_hash: u8,
    /// Version byte of WIF-encoded private keys.
    pub wif: u8,
}

const MESSAGE_PREFIX: &str = "\x18Raptoreum Signed Message:\n";

// All three variants share the tpub/tprv version words.
const BIP32_VERSIONS: Bip32Versions = Bip32Versions {
    public: 0x0435_87cf,
    private: 0x0435_8394,
};

/// Mainnet: P2PKH addresses start with `R`, WIF keys with `5`/`K`/`L`.
pub const MAINNET_PARAMS: NetworkParams = NetworkParams {
    message_prefix: MESSAGE_PREFIX,
    bech32_hrp: "rtm",
    bip32: BIP32_VERSIONS,
    pubkey_hash: 0x3c,
    script_hash: 0x10,
    wif: 0x80,
};

/// Testnet: P2PKH addresses start with `r`, WIF keys with `c`/`9`.
pub const TESTNET_PARAMS: NetworkParams = NetworkParams {
    message_prefix: MESSAGE_PREFIX,
    bech32_hrp: "trtm",
    bip32: BIP32_VERSIONS,
    pubkey_hash: 0x7b,
    script_hash: 0x13,
    wif: 0xef,
};

pub const REGTEST_PARAMS: NetworkParams = NetworkParams {
    message_prefix: MESSAGE_PREFIX,
    bech32_hrp: "rrtm",
    bip32: BIP32_VERSIONS,
    pubkey_hash: 0x7a,
    script_hash: 0xbe,
    wif: 0xf0,
};

/// Supported Raptoreum networks.
///
/// Every codec entry point takes the network explicitly; there is no
/// process-wide default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RtmNetwork {
    Mainnet,
    Testnet,
    Regtest,
}

impl RtmNetwork {
    /// Return the constant parameter set for this network.
    pub fn params(self) -> &'static NetworkParams {
        match self {
            RtmNetwork::Mainnet => &MAINNET_PARAMS,
            RtmNetwork::Testnet => &TESTNET_PARAMS,
            RtmNetwork::Regtest => &REGTEST_PARAMS,
        }
    }

    /// Default JSON-RPC port of a node on this network.
    pub fn default_rpc_port(self) -> u16 {
        match self {
            RtmNetwork::Mainnet => 10225,
            RtmNetwork::Testnet => 10229,
            RtmNetwork::Regtest => 19444,
        }
    }
}

impl std::fmt::Display for RtmNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RtmNetwork::Mainnet => write!(f, "mainnet"),
            RtmNetwork::Testnet => write!(f, "testnet"),
            RtmNetwork::Regtest => write!(f, "regtest"),
        }
    }
}

impl FromStr for RtmNetwork {
    type Err = RtmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(RtmNetwork::Mainnet),
            "testnet" | "test" => Ok(RtmNetwork::Testnet),
            "regtest" => Ok(RtmNetwork::Regtest),
            other => Err(RtmError::InvalidNetwork(other.to_string())),
        }
    }
}
