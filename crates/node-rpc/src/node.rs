//! Typed wrappers over the node methods the wallet uses.

use async_trait::async_trait;
use chain_rtm::{PreviousOutputDescriptor, TransactionPlan, UnspentOutput};
use serde_json::{json, Map, Value};

use crate::client::{call_as, RpcClient};
use crate::error::RpcError;
use crate::method::Method;
use crate::types::{
    AddressBalance, AssetDetails, AssetMetadata, BlockInfo, BlockchainInfo, BroadcastOptions,
    RawTransaction, SignedTransaction, TxidResult, UtxoListing, ValidateAddressResult,
};

/// Node calls with typed parameters and results, available on every
/// [`RpcClient`].
#[async_trait]
pub trait NodeApi: RpcClient {
    /// Spendable outputs of `address`, optionally filtered by asset.
    async fn get_address_utxos(
        &self,
        address: &str,
        asset: Option<&str>,
    ) -> Result<Vec<UnspentOutput>, RpcError> {
        let mut query = json!({ "addresses": [address] });
        if let Some(asset) = asset {
            query["asset"] = json!(asset);
        }
        let listing: UtxoListing = call_as(self, Method::GetAddressUtxos, vec![query]).await?;
        Ok(listing.into_vec())
    }

    async fn get_address_balance(&self, address: &str) -> Result<AddressBalance, RpcError> {
        call_as(
            self,
            Method::GetAddressBalance,
            vec![json!({ "addresses": [address] })],
        )
        .await
    }

    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError> {
        call_as(self, Method::GetBlockchainInfo, Vec::new()).await
    }

    async fn get_best_block_hash(&self) -> Result<String, RpcError> {
        call_as(self, Method::GetBestBlockHash, Vec::new()).await
    }

    async fn get_block(&self, hash: &str) -> Result<BlockInfo, RpcError> {
        call_as(self, Method::GetBlock, vec![json!(hash)]).await
    }

    /// Verbose transaction lookup.
    async fn get_raw_transaction(&self, txid: &str) -> Result<RawTransaction, RpcError> {
        call_as(self, Method::GetRawTransaction, vec![json!(txid), json!(true)]).await
    }

    /// Have the node encode `plan` into an unsigned transaction hex.
    async fn create_raw_transaction(&self, plan: &TransactionPlan) -> Result<String, RpcError> {
        let method = Method::CreateRawTransaction;
        let inputs =
            serde_json::to_value(&plan.inputs).map_err(|source| RpcError::Decode { method, source })?;
        let outputs = serde_json::to_value(&plan.outputs)
            .map_err(|source| RpcError::Decode { method, source })?;
        call_as(self, method, vec![inputs, outputs]).await
    }

    async fn sign_raw_transaction_with_key(
        &self,
        unsigned_hex: &str,
        wif: &str,
        previous_outputs: &[PreviousOutputDescriptor],
    ) -> Result<SignedTransaction, RpcError> {
        let method = Method::SignRawTransactionWithKey;
        let prev_txs = serde_json::to_value(previous_outputs)
            .map_err(|source| RpcError::Decode { method, source })?;
        call_as(
            self,
            method,
            vec![json!(unsigned_hex), json!([wif]), prev_txs],
        )
        .await
    }

    /// Broadcast a signed transaction; returns the node's txid.
    async fn send_raw_transaction(
        &self,
        signed_hex: &str,
        options: Option<BroadcastOptions>,
    ) -> Result<String, RpcError> {
        let mut params = vec![json!(signed_hex)];
        if let Some(options) = options {
            params.extend(options.to_params());
        }
        call_as(self, Method::SendRawTransaction, params).await
    }

    async fn validate_address(&self, address: &str) -> Result<ValidateAddressResult, RpcError> {
        call_as(self, Method::ValidateAddress, vec![json!(address)]).await
    }

    async fn get_asset_details_by_name(&self, name: &str) -> Result<AssetDetails, RpcError> {
        call_as(self, Method::GetAssetDetailsByName, vec![json!(name)]).await
    }

    async fn get_asset_details_by_id(&self, asset_id: &str) -> Result<AssetDetails, RpcError> {
        call_as(self, Method::GetAssetDetailsById, vec![json!(asset_id)]).await
    }

    /// Holders of an asset, keyed by address.
    async fn list_addresses_by_asset(&self, name: &str) -> Result<Map<String, Value>, RpcError> {
        call_as(self, Method::ListAddressesByAsset, vec![json!(name)]).await
    }

    /// Asset balances held by `address`, keyed by asset.
    async fn list_asset_balances_by_address(
        &self,
        address: &str,
    ) -> Result<Map<String, Value>, RpcError> {
        call_as(self, Method::ListAssetBalancesByAddress, vec![json!(address)]).await
    }

    async fn create_asset(&self, metadata: &AssetMetadata) -> Result<String, RpcError> {
        let method = Method::CreateAsset;
        let params =
            serde_json::to_value(metadata).map_err(|source| RpcError::Decode { method, source })?;
        let result: TxidResult = call_as(self, method, vec![params]).await?;
        Ok(result.txid)
    }

    /// Mint an asset by name or creation txid.
    async fn mint_asset(&self, identifier: &str) -> Result<String, RpcError> {
        let result: TxidResult = call_as(self, Method::MintAsset, vec![json!(identifier)]).await?;
        Ok(result.txid)
    }

    /// Node-wallet transfer of `amount` units of `asset_id`.
    async fn send_asset(
        &self,
        asset_id: &str,
        amount: u64,
        address: &str,
    ) -> Result<String, RpcError> {
        let result: TxidResult = call_as(
            self,
            Method::SendAsset,
            vec![json!(asset_id), json!(amount), json!(address)],
        )
        .await?;
        Ok(result.txid)
    }
}

impl<C: RpcClient + ?Sized> NodeApi for C {}
