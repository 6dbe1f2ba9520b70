//! Caller-facing surface over a node: transfers, balance and chain queries,
//! confirmation waits, and the node-wallet asset primitives.

use chain_rtm::{
    build_asset_transfer, build_native_transfer, select_fee_inputs, select_filtered_asset_output,
    select_for_amount, validate_address, RtmNetwork, UnspentOutput, DEFAULT_FEE_SAT,
    DUST_THRESHOLD_SAT,
};
use node_rpc::{
    AssetDetails, AssetMetadata, BlockInfo, BlockchainInfo, BroadcastOptions, HttpRpcClient,
    NodeApi, RawTransaction, RpcClient,
};
use secrecy::SecretString;
use serde_json::{Map, Value};

use crate::broadcast::submit;
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::poller::{wait_for_confirmation, ConfirmationResult, PollPolicy};

pub struct Provider<C> {
    client: C,
    network: RtmNetwork,
    default_fee_sat: u64,
    poll_policy: PollPolicy,
}

impl Provider<HttpRpcClient> {
    /// Provider talking HTTP to the node described by `config`.
    pub fn connect(config: &WalletConfig) -> Result<Self, WalletError> {
        let client = HttpRpcClient::new(config.rpc.clone())?;
        Ok(Provider::new(client, config.network)
            .with_default_fee(config.fee_sat)
            .with_poll_policy(PollPolicy::default().with_interval(config.poll_interval)))
    }
}

impl<C: RpcClient> Provider<C> {
    pub fn new(client: C, network: RtmNetwork) -> Self {
        Self {
            client,
            network,
            default_fee_sat: DEFAULT_FEE_SAT,
            poll_policy: PollPolicy::default(),
        }
    }

    pub fn with_default_fee(mut self, fee_sat: u64) -> Self {
        self.default_fee_sat = fee_sat;
        self
    }

    /// Policy used when a caller waits without supplying one.
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn network(&self) -> RtmNetwork {
        self.network
    }

    pub fn default_fee_sat(&self) -> u64 {
        self.default_fee_sat
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }

    // ─── Transfers ───────────────────────────────────────────────────

    /// Pay `amount_sat` from `from` to `to`, returning the broadcast txid.
    ///
    /// Native outputs of `from` are spent first-fit in node order until
    /// `amount_sat + fee_sat` is covered; the remainder returns to `from`.
    pub async fn send_native_transfer(
        &self,
        from: &str,
        to: &str,
        wif: &SecretString,
        amount_sat: u64,
        fee_sat: u64,
    ) -> Result<String, WalletError> {
        self.check_address(from, "source")?;
        self.check_address(to, "destination")?;
        if amount_sat == 0 {
            return Err(WalletError::InvalidParameters("amount must be positive".into()));
        }

        let spendable: Vec<UnspentOutput> = self
            .client
            .get_address_utxos(from, None)
            .await?
            .into_iter()
            .filter(UnspentOutput::is_native)
            .collect();

        let selection = select_for_amount(&spendable, amount_sat.saturating_add(fee_sat))?;
        log::debug!(
            "selected {} outputs worth {} sat for {amount_sat} sat to {to}",
            selection.selected.len(),
            selection.total_sat
        );

        let plan = build_native_transfer(&selection.selected, to, amount_sat, from, fee_sat)?;
        let unsigned = self.client.create_raw_transaction(&plan).await?;

        submit(&self.client, &unsigned, &plan.previous_outputs, wif, None).await
    }

    /// Move one instance of `asset_id` from `from` to `to`.
    ///
    /// `asset_id` is the node's asset filter: either the hex id or the
    /// ticker. The output is encoded with the id carried by the spent row.
    /// The asset output is looked up before anything is built or signed; a
    /// missing asset fails with [`WalletError::NoMatchingAssetOutput`].
    /// Native outputs cover `fee_sat` plus the dust threshold, and change
    /// above the threshold returns to `from`.
    pub async fn send_asset_transfer(
        &self,
        from: &str,
        to: &str,
        wif: &SecretString,
        asset_id: &str,
        unique_id: Option<u64>,
        fee_sat: u64,
    ) -> Result<String, WalletError> {
        self.check_address(from, "source")?;
        self.check_address(to, "destination")?;
        if asset_id.trim().is_empty() {
            return Err(WalletError::InvalidParameters("asset id is required".into()));
        }

        let holdings = self.client.get_address_utxos(from, Some(asset_id)).await?;
        let asset_input = select_filtered_asset_output(&holdings, asset_id, unique_id)?;

        let spendable = self.client.get_address_utxos(from, None).await?;
        let fee_inputs = select_fee_inputs(
            &spendable,
            asset_input,
            fee_sat.saturating_add(DUST_THRESHOLD_SAT),
        )?;

        let plan = build_asset_transfer(
            asset_input,
            &fee_inputs.selected,
            to,
            unique_id,
            from,
            fee_sat,
        )?;
        log::debug!(
            "asset transfer of {asset_id} spends {} inputs, fee {} sat",
            plan.inputs.len(),
            plan.fee_sat
        );

        let unsigned = self.client.create_raw_transaction(&plan).await?;
        submit(
            &self.client,
            &unsigned,
            &plan.previous_outputs,
            wif,
            Some(BroadcastOptions::ASSET),
        )
        .await
    }

    /// Poll until `txid` reaches the depth `policy` asks for.
    pub async fn wait_for_confirmation(
        &self,
        txid: &str,
        policy: PollPolicy,
    ) -> Result<ConfirmationResult, WalletError> {
        wait_for_confirmation(&self.client, txid, policy).await
    }

    // ─── Queries ─────────────────────────────────────────────────────

    /// Confirmed balance of `address` in satoshis.
    pub async fn get_balance(&self, address: &str) -> Result<u64, WalletError> {
        require(address, "address")?;
        Ok(self.client.get_address_balance(address).await?.balance)
    }

    /// Spendable outputs of `address`, optionally only those of one asset.
    pub async fn list_unspent(
        &self,
        address: &str,
        asset_id: Option<&str>,
    ) -> Result<Vec<UnspentOutput>, WalletError> {
        require(address, "address")?;
        Ok(self.client.get_address_utxos(address, asset_id).await?)
    }

    pub async fn get_blockchain_info(&self) -> Result<BlockchainInfo, WalletError> {
        Ok(self.client.get_blockchain_info().await?)
    }

    pub async fn get_transaction(&self, txid: &str) -> Result<RawTransaction, WalletError> {
        require(txid, "txid")?;
        Ok(self.client.get_raw_transaction(txid).await?)
    }

    pub async fn get_best_block_hash(&self) -> Result<String, WalletError> {
        Ok(self.client.get_best_block_hash().await?)
    }

    pub async fn get_block(&self, hash: &str) -> Result<BlockInfo, WalletError> {
        require(hash, "block hash")?;
        Ok(self.client.get_block(hash).await?)
    }

    /// Txids of the transactions in block `hash`.
    pub async fn get_block_transactions(&self, hash: &str) -> Result<Vec<String>, WalletError> {
        Ok(self.get_block(hash).await?.tx)
    }

    pub async fn get_asset_details_by_name(&self, name: &str) -> Result<AssetDetails, WalletError> {
        require(name, "asset name")?;
        Ok(self.client.get_asset_details_by_name(name).await?)
    }

    pub async fn get_asset_details_by_id(&self, asset_id: &str) -> Result<AssetDetails, WalletError> {
        require(asset_id, "asset id")?;
        Ok(self.client.get_asset_details_by_id(asset_id).await?)
    }

    pub async fn list_addresses_by_asset(
        &self,
        name: &str,
    ) -> Result<Map<String, Value>, WalletError> {
        require(name, "asset name")?;
        Ok(self.client.list_addresses_by_asset(name).await?)
    }

    pub async fn list_asset_balances_by_address(
        &self,
        address: &str,
    ) -> Result<Map<String, Value>, WalletError> {
        require(address, "address")?;
        Ok(self.client.list_asset_balances_by_address(address).await?)
    }

    /// Ask the node whether it accepts `address`.
    pub async fn validate_address(&self, address: &str) -> Result<bool, WalletError> {
        require(address, "address")?;
        Ok(self.client.validate_address(address).await?.isvalid)
    }

    // ─── Asset issuance (node wallet) ────────────────────────────────

    /// Submit `createasset`; returns the creation txid.
    pub async fn initiate_asset_creation(
        &self,
        metadata: &AssetMetadata,
    ) -> Result<String, WalletError> {
        require(&metadata.name, "asset name")?;
        require(&metadata.owner_address, "owner address")?;
        require(&metadata.target_address, "target address")?;
        if metadata.is_unique && metadata.decimal_point != 0 {
            return Err(WalletError::InvalidParameters(
                "unique assets must have decimal point 0".into(),
            ));
        }
        if metadata.decimal_point > 8 {
            return Err(WalletError::InvalidParameters(format!(
                "decimal point {} is out of range 0..=8",
                metadata.decimal_point
            )));
        }

        let txid = self.client.create_asset(metadata).await?;
        log::info!("asset {} creation submitted: {txid}", metadata.name);
        Ok(txid)
    }

    /// Mint a created asset, by name or creation txid.
    pub async fn mint_created_asset(&self, identifier: &str) -> Result<String, WalletError> {
        require(identifier, "asset identifier")?;
        let txid = self.client.mint_asset(identifier).await?;
        log::info!("asset {identifier} mint submitted: {txid}");
        Ok(txid)
    }

    /// Send minted units from the node wallet to `to`.
    pub async fn transfer_minted_asset(
        &self,
        asset_id: &str,
        amount: u64,
        to: &str,
    ) -> Result<String, WalletError> {
        require(asset_id, "asset id")?;
        require(to, "destination address")?;
        if amount == 0 {
            return Err(WalletError::InvalidParameters("amount must be positive".into()));
        }
        let txid = self.client.send_asset(asset_id, amount, to).await?;
        log::info!("asset {asset_id} x{amount} sent to {to}: {txid}");
        Ok(txid)
    }

    fn check_address(&self, address: &str, role: &str) -> Result<(), WalletError> {
        require(address, &format!("{role} address"))?;
        match validate_address(address, self.network) {
            Ok(true) => Ok(()),
            Ok(false) => Err(WalletError::InvalidParameters(format!(
                "{role} address {address} is not a {} address",
                self.network
            ))),
            Err(e) => Err(WalletError::InvalidParameters(format!(
                "{role} address {address}: {e}"
            ))),
        }
    }
}

fn require(value: &str, what: &str) -> Result<(), WalletError> {
    if value.trim().is_empty() {
        return Err(WalletError::InvalidParameters(format!("{what} is required")));
    }
    Ok(())
}
