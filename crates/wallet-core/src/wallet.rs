use std::fmt;
use std::sync::Arc;

use chain_rtm::{address_from_wif, generate_key_pair, RtmNetwork};
use node_rpc::RpcClient;
use secrecy::SecretString;

use crate::error::WalletError;
use crate::provider::Provider;

/// A single-key wallet: one WIF, the address it controls, and optionally a
/// provider to reach the node through.
pub struct Wallet<C> {
    wif: SecretString,
    address: String,
    network: RtmNetwork,
    provider: Option<Arc<Provider<C>>>,
}

impl<C> fmt::Debug for Wallet<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("network", &self.network)
            .field("connected", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}

impl<C: RpcClient> Wallet<C> {
    /// Wallet with a freshly generated key.
    pub fn create_random(network: RtmNetwork) -> Result<Self, WalletError> {
        let pair = generate_key_pair(network)?;
        Ok(Self {
            wif: SecretString::from(pair.wif.as_str()),
            address: pair.address,
            network,
            provider: None,
        })
    }

    /// Wallet for an existing WIF key on `network`.
    pub fn from_wif(wif: &str, network: RtmNetwork) -> Result<Self, WalletError> {
        let address = address_from_wif(wif, network)?;
        Ok(Self {
            wif: SecretString::from(wif),
            address,
            network,
            provider: None,
        })
    }

    /// Attach a provider. Its network must match the wallet's.
    pub fn connect(mut self, provider: Arc<Provider<C>>) -> Result<Self, WalletError> {
        if provider.network() != self.network {
            return Err(WalletError::InvalidParameters(format!(
                "wallet is on {}, provider on {}",
                self.network,
                provider.network()
            )));
        }
        self.provider = Some(provider);
        Ok(self)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn network(&self) -> RtmNetwork {
        self.network
    }

    /// The private key in WIF. Handle with care.
    pub fn wif(&self) -> &SecretString {
        &self.wif
    }

    pub fn is_connected(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> Result<&Provider<C>, WalletError> {
        self.provider
            .as_deref()
            .ok_or_else(|| WalletError::InvalidParameters("wallet is not connected to a node".into()))
    }

    pub async fn balance(&self) -> Result<u64, WalletError> {
        self.provider()?.get_balance(&self.address).await
    }

    /// Pay `amount_sat` to `to`. `fee_sat` defaults to the provider's fee.
    pub async fn send(
        &self,
        to: &str,
        amount_sat: u64,
        fee_sat: Option<u64>,
    ) -> Result<String, WalletError> {
        let provider = self.provider()?;
        let fee_sat = fee_sat.unwrap_or_else(|| provider.default_fee_sat());
        provider
            .send_native_transfer(&self.address, to, &self.wif, amount_sat, fee_sat)
            .await
    }

    /// Transfer one instance of `asset_id` to `to`.
    pub async fn send_asset(
        &self,
        to: &str,
        asset_id: &str,
        unique_id: Option<u64>,
        fee_sat: Option<u64>,
    ) -> Result<String, WalletError> {
        let provider = self.provider()?;
        let fee_sat = fee_sat.unwrap_or_else(|| provider.default_fee_sat());
        provider
            .send_asset_transfer(&self.address, to, &self.wif, asset_id, unique_id, fee_sat)
            .await
    }

    /// Node-side check of `address`.
    pub async fn is_valid_address(&self, address: &str) -> Result<bool, WalletError> {
        self.provider()?.validate_address(address).await
    }
}
