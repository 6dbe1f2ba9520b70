use serde::{Deserialize, Serialize};

use crate::error::RtmError;

/// A single unspent transaction output, as reported by the node's address
/// index (`getaddressutxos`).
///
/// This is a snapshot: the node or another client may spend it at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    /// Transaction ID as a hex string (display order).
    pub txid: String,
    /// Output index within the transaction.
    #[serde(rename = "outputIndex")]
    pub output_index: u32,
    /// Native value in satoshis.
    #[serde(rename = "satoshis")]
    pub value_sat: u64,
    /// Hex-encoded locking script (scriptPubKey).
    pub script: String,
    /// Asset carried by this output; absent (or empty) for plain RTM.
    #[serde(rename = "assetId", default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    /// Instance number, only present for unique (NFT) assets.
    #[serde(rename = "uniqueId", default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<u64>,
}

impl UnspentOutput {
    /// Reference to this output as a transaction input.
    pub fn outpoint(&self) -> TransactionInput {
        TransactionInput {
            txid: self.txid.clone(),
            vout: self.output_index,
        }
    }

    /// `true` when the output carries only native coin.
    pub fn is_native(&self) -> bool {
        self.asset_id.as_deref().map_or(true, str::is_empty)
    }

    fn same_outpoint(&self, other: &UnspentOutput) -> bool {
        self.txid == other.txid && self.output_index == other.output_index
    }
}

/// Reference to an output being spent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionInput {
    pub txid: String,
    pub vout: u32,
}

/// Result of coin selection: the chosen outputs and their aggregate value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoSelection {
    pub selected: Vec<UnspentOutput>,
    pub total_sat: u64,
}

/// Select outputs covering `target_sat`, first-fit in the given order.
///
/// Outputs are taken in list order (no sorting) until the running total
/// reaches the target, so the result is the shortest prefix whose sum is
/// `>= target_sat`. Overshoot becomes change. Fails with
/// [`RtmError::InsufficientFunds`] carrying the shortfall when the whole list
/// is not enough.
pub fn select_for_amount(
    spendable: &[UnspentOutput],
    target_sat: u64,
) -> Result<UtxoSelection, RtmError> {
    if target_sat == 0 {
        return Err(RtmError::InvalidParameters(
            "selection target must be positive".into(),
        ));
    }

    let mut selected = Vec::new();
    let mut total_sat: u64 = 0;

    for utxo in spendable {
        selected.push(utxo.clone());
        total_sat = total_sat.saturating_add(utxo.value_sat);
        if total_sat >= target_sat {
            return Ok(UtxoSelection {
                selected,
                total_sat,
            });
        }
    }

    Err(RtmError::insufficient(target_sat, total_sat))
}

/// Pick the first output carrying `asset_id` (and `unique_id`, when given).
pub fn select_asset_output<'a>(
    spendable: &'a [UnspentOutput],
    asset_id: &str,
    unique_id: Option<u64>,
) -> Result<&'a UnspentOutput, RtmError> {
    if asset_id.is_empty() {
        return Err(RtmError::InvalidParameters("asset id is required".into()));
    }

    spendable
        .iter()
        .find(|u| {
            u.asset_id.as_deref() == Some(asset_id)
                && unique_id.map_or(true, |id| u.unique_id == Some(id))
        })
        .ok_or_else(|| RtmError::NoMatchingAssetOutput {
            asset_id: asset_id.to_string(),
            unique_id,
        })
}

/// Pick the asset output from a listing the node already filtered by
/// `requested`, which may be the asset's hex id or its ticker.
///
/// A row whose `assetId` equals `requested` wins. Otherwise the node has
/// resolved the ticker, and the first asset row holding `unique_id` (when
/// given) is taken. The chosen row's `assetId` is what gets spent.
pub fn select_filtered_asset_output<'a>(
    holdings: &'a [UnspentOutput],
    requested: &str,
    unique_id: Option<u64>,
) -> Result<&'a UnspentOutput, RtmError> {
    if let Ok(exact) = select_asset_output(holdings, requested, unique_id) {
        return Ok(exact);
    }

    holdings
        .iter()
        .find(|u| !u.is_native() && unique_id.map_or(true, |id| u.unique_id == Some(id)))
        .ok_or_else(|| RtmError::NoMatchingAssetOutput {
            asset_id: requested.to_string(),
            unique_id,
        })
}

/// Select native outputs to pay the fee of an asset transfer.
///
/// Runs [`select_for_amount`] over the native outputs of `spendable`,
/// skipping the already chosen `asset_input`.
pub fn select_fee_inputs(
    spendable: &[UnspentOutput],
    asset_input: &UnspentOutput,
    target_sat: u64,
) -> Result<UtxoSelection, RtmError> {
    let remainder: Vec<UnspentOutput> = spendable
        .iter()
        .filter(|u| u.is_native() && !u.same_outpoint(asset_input))
        .cloned()
        .collect();

    select_for_amount(&remainder, target_sat)
}
