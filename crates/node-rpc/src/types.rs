//! Typed views of the node's JSON replies and of the structured request
//! parameters the wallet sends.

use std::collections::BTreeMap;

use chain_rtm::UnspentOutput;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `getaddressutxos` reply.
///
/// Unfiltered queries return a flat array. Asset-filtered queries may come
/// back grouped by asset instead.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UtxoListing {
    Flat(Vec<UnspentOutput>),
    Grouped(BTreeMap<String, Vec<UnspentOutput>>),
}

impl UtxoListing {
    /// All rows as one list. Grouped replies are concatenated in key order.
    pub fn into_vec(self) -> Vec<UnspentOutput> {
        match self {
            UtxoListing::Flat(rows) => rows,
            UtxoListing::Grouped(groups) => groups.into_values().flatten().collect(),
        }
    }
}

/// `getaddressbalance` reply, in satoshis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AddressBalance {
    pub balance: u64,
    #[serde(default)]
    pub received: u64,
}

/// `getblock` reply (verbosity 1).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockInfo {
    pub hash: String,
    pub height: u64,
    /// `-1` when the block is not on the main chain.
    #[serde(default)]
    pub confirmations: i64,
    #[serde(default)]
    pub tx: Vec<String>,
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub previousblockhash: Option<String>,
}

/// `getrawtransaction <txid> true` reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTransaction {
    pub txid: String,
    #[serde(default)]
    pub hex: String,
    /// Present once the transaction is in a block.
    #[serde(default)]
    pub blockhash: Option<String>,
    #[serde(default)]
    pub confirmations: Option<u64>,
    #[serde(default)]
    pub time: Option<u64>,
    #[serde(default)]
    pub blocktime: Option<u64>,
    /// Inputs, outputs and any node-specific fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-input failure reported by `signrawtransactionwithkey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSigningError {
    pub txid: String,
    pub vout: u32,
    #[serde(rename = "scriptSig", default)]
    pub script_sig: String,
    #[serde(default)]
    pub sequence: u32,
    pub error: String,
}

/// `signrawtransactionwithkey` reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignedTransaction {
    pub hex: String,
    pub complete: bool,
    #[serde(default)]
    pub errors: Vec<InputSigningError>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockchainInfo {
    pub chain: String,
    pub blocks: u64,
    #[serde(default)]
    pub headers: u64,
    pub bestblockhash: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `getassetdetailsbyname` / `getassetdetailsbyid` reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssetDetails {
    #[serde(rename = "Asset_id")]
    pub asset_id: String,
    #[serde(rename = "Asset_name", default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TxidResult {
    pub txid: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValidateAddressResult {
    pub isvalid: bool,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How newly minted units are distributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DistributionType {
    #[default]
    Manual,
    Coinbase,
    Address,
    Schedule,
}

impl From<DistributionType> for u8 {
    fn from(kind: DistributionType) -> u8 {
        match kind {
            DistributionType::Manual => 0,
            DistributionType::Coinbase => 1,
            DistributionType::Address => 2,
            DistributionType::Schedule => 3,
        }
    }
}

impl TryFrom<u8> for DistributionType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DistributionType::Manual),
            1 => Ok(DistributionType::Coinbase),
            2 => Ok(DistributionType::Address),
            3 => Ok(DistributionType::Schedule),
            other => Err(format!("unknown distribution type {other}")),
        }
    }
}

/// `createasset` parameter object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub name: String,
    /// Can be changed later through reissue.
    pub updatable: bool,
    pub is_root: bool,
    /// Parent asset name, for sub-assets.
    pub root_name: String,
    /// One identity per token. Requires `decimal_point == 0`.
    pub is_unique: bool,
    #[serde(rename = "decimalpoint")]
    pub decimal_point: u8,
    /// Hash of the underlying asset, e.g. an IPFS CID.
    #[serde(rename = "referenceHash")]
    pub reference_hash: String,
    #[serde(rename = "maxMintCount")]
    pub max_mint_count: u64,
    #[serde(rename = "type")]
    pub distribution: DistributionType,
    #[serde(rename = "targetAddress")]
    pub target_address: String,
    /// Mint every this many blocks when distribution is not manual.
    #[serde(rename = "issueFrequency")]
    pub issue_frequency: u64,
    pub amount: u64,
    #[serde(rename = "ownerAddress")]
    pub owner_address: String,
}

impl AssetMetadata {
    /// A single-instance unique asset owned by and issued to `owner_address`.
    pub fn unique(name: impl Into<String>, owner_address: impl Into<String>) -> Self {
        let owner_address = owner_address.into();
        Self {
            name: name.into(),
            updatable: false,
            is_root: true,
            root_name: String::new(),
            is_unique: true,
            decimal_point: 0,
            reference_hash: String::new(),
            max_mint_count: 1,
            distribution: DistributionType::Manual,
            target_address: owner_address.clone(),
            issue_frequency: 0,
            amount: 1,
            owner_address,
        }
    }

    pub fn with_reference_hash(mut self, hash: impl Into<String>) -> Self {
        self.reference_hash = hash.into();
        self
    }
}

/// Extra arguments passed to `sendrawtransaction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BroadcastOptions {
    /// Highest fee rate accepted, in coins per kilobyte.
    pub max_fee_rate: f64,
    pub instant_send: bool,
    pub bypass_limits: bool,
}

impl BroadcastOptions {
    /// Options used for asset transfers.
    pub const ASSET: BroadcastOptions = BroadcastOptions {
        max_fee_rate: 0.1,
        instant_send: false,
        bypass_limits: true,
    };

    /// Trailing parameters after the transaction hex.
    pub fn to_params(&self) -> Vec<Value> {
        vec![
            Value::from(self.max_fee_rate),
            Value::Bool(self.instant_send),
            Value::Bool(self.bypass_limits),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_accepts_flat_and_grouped() {
        let row = json!({"txid": "aa", "outputIndex": 0, "script": "76", "satoshis": 5});
        let flat: UtxoListing = serde_json::from_value(json!([row.clone()])).unwrap();
        assert_eq!(flat.into_vec().len(), 1);

        let mut second = row.clone();
        second["txid"] = json!("bb");
        let grouped: UtxoListing =
            serde_json::from_value(json!({ "B": [second], "A": [row] })).unwrap();
        let txids: Vec<String> = grouped.into_vec().into_iter().map(|u| u.txid).collect();
        assert_eq!(txids, ["aa", "bb"]);
    }

    #[test]
    fn signed_transaction_errors_default_to_empty() {
        let signed: SignedTransaction =
            serde_json::from_value(json!({"hex": "0100", "complete": true})).unwrap();
        assert!(signed.errors.is_empty());

        let partial: SignedTransaction = serde_json::from_value(json!({
            "hex": "0100",
            "complete": false,
            "errors": [{
                "txid": "aa", "vout": 1, "scriptSig": "", "sequence": 4294967295u32,
                "error": "Input not found or already spent"
            }]
        }))
        .unwrap();
        assert_eq!(partial.errors[0].vout, 1);
        assert_eq!(partial.errors[0].error, "Input not found or already spent");
    }

    #[test]
    fn raw_transaction_without_block() {
        let tx: RawTransaction =
            serde_json::from_value(json!({"txid": "aa", "hex": "01", "vin": [], "vout": []}))
                .unwrap();
        assert!(tx.blockhash.is_none());
        assert!(tx.extra.contains_key("vout"));
    }

    #[test]
    fn asset_details_read_node_field_names() {
        let details: AssetDetails = serde_json::from_value(json!({
            "Asset_id": "2f1c",
            "Asset_name": "ART",
            "Isunique": true
        }))
        .unwrap();
        assert_eq!(details.asset_id, "2f1c");
        assert_eq!(details.extra["Isunique"], json!(true));
    }

    #[test]
    fn metadata_uses_node_field_names() {
        let metadata = AssetMetadata::unique("ART", "RKxTdfmtxtfLDKZBgx6SvNkBtNu9jRYnLh");
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["decimalpoint"], 0);
        assert_eq!(value["maxMintCount"], 1);
        assert_eq!(value["type"], 0);
        assert_eq!(value["ownerAddress"], value["targetAddress"]);
        assert_eq!(value["is_unique"], true);
    }

    #[test]
    fn distribution_type_rejects_unknown_code() {
        assert!(serde_json::from_value::<DistributionType>(json!(2)).is_ok());
        assert!(serde_json::from_value::<DistributionType>(json!(9)).is_err());
    }

    #[test]
    fn asset_broadcast_params() {
        assert_eq!(
            BroadcastOptions::ASSET.to_params(),
            vec![json!(0.1), json!(false), json!(true)]
        );
    }
}
