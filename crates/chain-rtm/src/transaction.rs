use std::collections::HashSet;

use bitcoin::{Amount, Txid};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::RtmError;
use crate::utxo::{TransactionInput, UnspentOutput};

/// Default flat fee, in satoshis, for a transfer.
pub const DEFAULT_FEE_SAT: u64 = 10_000;

/// Native change at or below this value is left to the miner on asset
/// transfers.
pub const DUST_THRESHOLD_SAT: u64 = 1_000;

/// One output of a transaction, in the shape `createrawtransaction` takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutput {
    /// Plain RTM payment. Serialized in whole coins.
    NativeTransfer { address: String, amount_sat: u64 },
    /// Asset payment, counted in asset units.
    AssetTransfer {
        address: String,
        asset_id: String,
        unique_id: Option<u64>,
        amount: u64,
    },
}

impl TransactionOutput {
    pub fn address(&self) -> &str {
        match self {
            TransactionOutput::NativeTransfer { address, .. }
            | TransactionOutput::AssetTransfer { address, .. } => address,
        }
    }

    /// Native value carried by the output (zero for asset outputs).
    pub fn native_sat(&self) -> u64 {
        match self {
            TransactionOutput::NativeTransfer { amount_sat, .. } => *amount_sat,
            TransactionOutput::AssetTransfer { .. } => 0,
        }
    }
}

#[derive(Serialize)]
struct AssetAmount<'a> {
    assetid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    uniqueid: Option<u64>,
    amount: u64,
}

// `{address: coins}` or `{address: {assetid, uniqueid?, amount}}`
impl Serialize for TransactionOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            TransactionOutput::NativeTransfer {
                address,
                amount_sat,
            } => map.serialize_entry(address, &sat_to_coins(*amount_sat))?,
            TransactionOutput::AssetTransfer {
                address,
                asset_id,
                unique_id,
                amount,
            } => map.serialize_entry(
                address,
                &AssetAmount {
                    assetid: asset_id,
                    uniqueid: *unique_id,
                    amount: *amount,
                },
            )?,
        }
        map.end()
    }
}

/// What the signer needs to know about each spent output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviousOutputDescriptor {
    pub txid: String,
    pub vout: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: String,
    #[serde(rename = "amount", serialize_with = "serialize_sat_as_coins")]
    pub amount_sat: u64,
}

impl From<&UnspentOutput> for PreviousOutputDescriptor {
    fn from(utxo: &UnspentOutput) -> Self {
        PreviousOutputDescriptor {
            txid: utxo.txid.clone(),
            vout: utxo.output_index,
            script_pub_key: utxo.script.clone(),
            amount_sat: utxo.value_sat,
        }
    }
}

/// A fully specified transaction: inputs, outputs, and the per-input
/// descriptors the signer needs, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPlan {
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub previous_outputs: Vec<PreviousOutputDescriptor>,
    /// Native value left to the miner.
    pub fee_sat: u64,
}

impl TransactionPlan {
    /// Sum of native value across all outputs.
    pub fn native_output_sat(&self) -> u64 {
        self.outputs.iter().map(TransactionOutput::native_sat).sum()
    }
}

/// Convert satoshis to whole coins.
pub fn sat_to_coins(sat: u64) -> f64 {
    Amount::from_sat(sat).to_btc()
}

fn serialize_sat_as_coins<S: Serializer>(sat: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(sat_to_coins(*sat))
}

fn require(value: &str, what: &str) -> Result<(), RtmError> {
    if value.trim().is_empty() {
        return Err(RtmError::InvalidParameters(format!("{what} is required")));
    }
    Ok(())
}

/// Total value of `utxos`, failing instead of wrapping.
fn sum_value(utxos: &[UnspentOutput]) -> Result<u64, RtmError> {
    utxos
        .iter()
        .try_fold(0u64, |acc, u| acc.checked_add(u.value_sat))
        .ok_or_else(|| RtmError::InvalidParameters("input value overflows u64".into()))
}

type CollectedInputs = (Vec<TransactionInput>, Vec<PreviousOutputDescriptor>);

/// Check that every input is a well-formed, distinct outpoint.
fn collect_inputs<'a, I>(utxos: I) -> Result<CollectedInputs, RtmError>
where
    I: IntoIterator<Item = &'a UnspentOutput>,
{
    let mut seen = HashSet::new();
    let mut inputs = Vec::new();
    let mut previous_outputs = Vec::new();

    for utxo in utxos {
        utxo.txid
            .parse::<Txid>()
            .map_err(|e| RtmError::InvalidParameters(format!("invalid txid {}: {e}", utxo.txid)))?;

        let outpoint = utxo.outpoint();
        if !seen.insert(outpoint.clone()) {
            return Err(RtmError::InvalidParameters(format!(
                "output {}:{} spent twice",
                outpoint.txid, outpoint.vout
            )));
        }
        inputs.push(outpoint);
        previous_outputs.push(PreviousOutputDescriptor::from(utxo));
    }

    if inputs.is_empty() {
        return Err(RtmError::InvalidParameters("no inputs selected".into()));
    }

    Ok((inputs, previous_outputs))
}

/// Assemble a native RTM payment.
///
/// One output pays `amount_sat` to `destination`; the remainder after
/// `fee_sat` goes back to `change_address` when it is positive and is
/// omitted otherwise.
pub fn build_native_transfer(
    inputs: &[UnspentOutput],
    destination: &str,
    amount_sat: u64,
    change_address: &str,
    fee_sat: u64,
) -> Result<TransactionPlan, RtmError> {
    require(destination, "destination address")?;
    require(change_address, "change address")?;
    if amount_sat == 0 {
        return Err(RtmError::InvalidParameters("amount must be positive".into()));
    }

    let (tx_inputs, previous_outputs) = collect_inputs(inputs)?;

    let total_sat = sum_value(inputs)?;
    let needed = amount_sat.saturating_add(fee_sat);
    if total_sat < needed {
        return Err(RtmError::insufficient(needed, total_sat));
    }

    let mut outputs = vec![TransactionOutput::NativeTransfer {
        address: destination.to_string(),
        amount_sat,
    }];

    let change_sat = total_sat - needed;
    if change_sat > 0 {
        outputs.push(TransactionOutput::NativeTransfer {
            address: change_address.to_string(),
            amount_sat: change_sat,
        });
    }

    Ok(TransactionPlan {
        inputs: tx_inputs,
        outputs,
        previous_outputs,
        fee_sat,
    })
}

/// Assemble a transfer of one unique asset instance.
///
/// The asset output comes first among the inputs, followed by the native
/// `fee_inputs`. Native change `sum(fee_inputs) - fee_sat` is returned to
/// `change_address` only when it exceeds [`DUST_THRESHOLD_SAT`]; a smaller
/// remainder is absorbed into the fee.
pub fn build_asset_transfer(
    asset_input: &UnspentOutput,
    fee_inputs: &[UnspentOutput],
    destination: &str,
    unique_id: Option<u64>,
    change_address: &str,
    fee_sat: u64,
) -> Result<TransactionPlan, RtmError> {
    require(destination, "destination address")?;
    require(change_address, "change address")?;

    let asset_id = asset_input
        .asset_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| RtmError::InvalidParameters("asset input carries no asset".into()))?;

    if let (Some(wanted), Some(held)) = (unique_id, asset_input.unique_id) {
        if wanted != held {
            return Err(RtmError::InvalidParameters(format!(
                "asset input holds instance {held}, not {wanted}"
            )));
        }
    }

    let (tx_inputs, previous_outputs) =
        collect_inputs(std::iter::once(asset_input).chain(fee_inputs))?;

    let rtm_in = sum_value(fee_inputs)?;
    if rtm_in < fee_sat {
        return Err(RtmError::insufficient(fee_sat, rtm_in));
    }

    let mut outputs = vec![TransactionOutput::AssetTransfer {
        address: destination.to_string(),
        asset_id: asset_id.to_string(),
        unique_id: unique_id.or(asset_input.unique_id),
        amount: 1,
    }];

    let change_sat = rtm_in - fee_sat;
    let fee_sat = if change_sat > DUST_THRESHOLD_SAT {
        outputs.push(TransactionOutput::NativeTransfer {
            address: change_address.to_string(),
            amount_sat: change_sat,
        });
        fee_sat
    } else {
        rtm_in
    };

    Ok(TransactionPlan {
        inputs: tx_inputs,
        outputs,
        previous_outputs,
        fee_sat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DEST: &str = "RKxTdfmtxtfLDKZBgx6SvNkBtNu9jRYnLh";
    const SOURCE: &str = "RNZZecHLuoqUzNc9oE8ErkPFV1zJdvDBAH";

    fn make_utxo(fill: char, vout: u32, value_sat: u64) -> UnspentOutput {
        UnspentOutput {
            txid: fill.to_string().repeat(64),
            output_index: vout,
            value_sat,
            script: format!("76a914{}88ac", "ab".repeat(20)),
            asset_id: None,
            unique_id: None,
        }
    }

    fn make_asset(fill: char, unique_id: Option<u64>) -> UnspentOutput {
        UnspentOutput {
            asset_id: Some("9f3c".repeat(16)),
            unique_id,
            ..make_utxo(fill, 0, 0)
        }
    }

    #[test]
    fn native_transfer_with_change() {
        let inputs = vec![make_utxo('a', 0, 600_000_000)];
        let plan = build_native_transfer(&inputs, DEST, 500_000_000, SOURCE, 10_000).unwrap();

        assert_eq!(plan.inputs.len(), 1);
        assert_eq!(
            plan.outputs,
            vec![
                TransactionOutput::NativeTransfer {
                    address: DEST.into(),
                    amount_sat: 500_000_000,
                },
                TransactionOutput::NativeTransfer {
                    address: SOURCE.into(),
                    amount_sat: 99_990_000,
                },
            ]
        );
        assert_eq!(plan.native_output_sat(), 600_000_000 - 10_000);
    }

    #[test]
    fn native_transfer_exact_amount_omits_change() {
        let inputs = vec![make_utxo('a', 0, 60_000), make_utxo('b', 1, 50_000)];
        let plan = build_native_transfer(&inputs, DEST, 100_000, SOURCE, 10_000).unwrap();
        assert_eq!(plan.outputs.len(), 1);
        assert_eq!(plan.inputs.len(), 2);
    }

    #[test]
    fn native_transfer_insufficient() {
        let inputs = vec![make_utxo('a', 0, 1_000)];
        let err = build_native_transfer(&inputs, DEST, 5_000, SOURCE, 10_000).unwrap_err();
        assert!(matches!(err, RtmError::InsufficientFunds { shortfall: 14_000, .. }));
    }

    #[test]
    fn native_transfer_rejects_missing_fields() {
        let inputs = vec![make_utxo('a', 0, 100_000)];
        assert!(matches!(
            build_native_transfer(&inputs, "", 5_000, SOURCE, 10),
            Err(RtmError::InvalidParameters(_))
        ));
        assert!(matches!(
            build_native_transfer(&inputs, DEST, 0, SOURCE, 10),
            Err(RtmError::InvalidParameters(_))
        ));
        assert!(matches!(
            build_native_transfer(&[], DEST, 5_000, SOURCE, 10),
            Err(RtmError::InvalidParameters(_))
        ));
    }

    #[test]
    fn duplicate_inputs_rejected() {
        let inputs = vec![make_utxo('a', 0, 100_000), make_utxo('a', 0, 100_000)];
        let err = build_native_transfer(&inputs, DEST, 5_000, SOURCE, 10).unwrap_err();
        assert!(err.to_string().contains("spent twice"));
    }

    #[test]
    fn malformed_txid_rejected() {
        let mut utxo = make_utxo('a', 0, 100_000);
        utxo.txid = "zz".into();
        assert!(build_native_transfer(&[utxo], DEST, 5_000, SOURCE, 10).is_err());
    }

    #[test]
    fn previous_outputs_follow_input_order() {
        let inputs = vec![make_utxo('c', 2, 30_000), make_utxo('a', 0, 40_000)];
        let plan = build_native_transfer(&inputs, DEST, 50_000, SOURCE, 1_000).unwrap();
        for (input, prev) in plan.inputs.iter().zip(&plan.previous_outputs) {
            assert_eq!(input.txid, prev.txid);
            assert_eq!(input.vout, prev.vout);
        }
        assert_eq!(plan.previous_outputs[0].amount_sat, 30_000);
    }

    #[test]
    fn asset_transfer_with_change() {
        let asset = make_asset('a', Some(7));
        let fees = vec![make_utxo('b', 0, 25_000)];
        let plan = build_asset_transfer(&asset, &fees, DEST, Some(7), SOURCE, 10_000).unwrap();

        assert_eq!(plan.inputs[0], asset.outpoint());
        assert_eq!(plan.inputs.len(), 2);
        assert_eq!(plan.outputs.len(), 2);
        assert_eq!(plan.outputs[1].native_sat(), 15_000);
        assert_eq!(plan.fee_sat, 10_000);
    }

    #[test]
    fn asset_transfer_dust_change_absorbed() {
        let asset = make_asset('a', None);
        // rtm_in - fee == 1_000 is not above the threshold.
        let fees = vec![make_utxo('b', 0, 11_000)];
        let plan = build_asset_transfer(&asset, &fees, DEST, None, SOURCE, 10_000).unwrap();
        assert_eq!(plan.outputs.len(), 1);
        assert_eq!(plan.native_output_sat(), 0);
        assert_eq!(plan.fee_sat, 11_000);

        let fees = vec![make_utxo('b', 0, 11_001)];
        let plan = build_asset_transfer(&asset, &fees, DEST, None, SOURCE, 10_000).unwrap();
        assert_eq!(plan.outputs.len(), 2);
    }

    #[test]
    fn asset_transfer_takes_unique_id_from_input() {
        let asset = make_asset('a', Some(3));
        let fees = vec![make_utxo('b', 0, 20_000)];
        let plan = build_asset_transfer(&asset, &fees, DEST, None, SOURCE, 10_000).unwrap();
        match &plan.outputs[0] {
            TransactionOutput::AssetTransfer { unique_id, amount, .. } => {
                assert_eq!(*unique_id, Some(3));
                assert_eq!(*amount, 1);
            }
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn asset_transfer_rejects_wrong_instance_and_native_input() {
        let fees = vec![make_utxo('b', 0, 20_000)];
        let asset = make_asset('a', Some(3));
        assert!(build_asset_transfer(&asset, &fees, DEST, Some(4), SOURCE, 10_000).is_err());

        let native = make_utxo('c', 0, 20_000);
        assert!(matches!(
            build_asset_transfer(&native, &fees, DEST, None, SOURCE, 10_000),
            Err(RtmError::InvalidParameters(_))
        ));
    }

    #[test]
    fn asset_transfer_fee_not_covered() {
        let asset = make_asset('a', None);
        let fees = vec![make_utxo('b', 0, 4_000)];
        let err = build_asset_transfer(&asset, &fees, DEST, None, SOURCE, 10_000).unwrap_err();
        assert!(matches!(err, RtmError::InsufficientFunds { shortfall: 6_000, .. }));
    }

    #[test]
    fn overflowing_inputs_rejected() {
        let huge = vec![make_utxo('a', 0, u64::MAX), make_utxo('b', 0, 1)];
        assert!(matches!(
            build_native_transfer(&huge, DEST, 1, SOURCE, 0),
            Err(RtmError::InvalidParameters(_))
        ));
        assert!(matches!(
            build_asset_transfer(&make_asset('c', None), &huge, DEST, None, SOURCE, 10_000),
            Err(RtmError::InvalidParameters(_))
        ));
    }

    #[test]
    fn outputs_serialize_in_node_format() {
        let native = TransactionOutput::NativeTransfer {
            address: DEST.into(),
            amount_sat: 99_990_000,
        };
        assert_eq!(serde_json::to_value(&native).unwrap(), json!({ DEST: 0.9999 }));

        let asset = TransactionOutput::AssetTransfer {
            address: DEST.into(),
            asset_id: "ab12".into(),
            unique_id: Some(5),
            amount: 1,
        };
        assert_eq!(
            serde_json::to_value(&asset).unwrap(),
            json!({ DEST: { "assetid": "ab12", "uniqueid": 5, "amount": 1 } })
        );

        let fungible = TransactionOutput::AssetTransfer {
            address: DEST.into(),
            asset_id: "ab12".into(),
            unique_id: None,
            amount: 1,
        };
        assert_eq!(
            serde_json::to_value(&fungible).unwrap(),
            json!({ DEST: { "assetid": "ab12", "amount": 1 } })
        );
    }

    #[test]
    fn previous_output_serializes_amount_in_coins() {
        let prev = PreviousOutputDescriptor::from(&make_utxo('a', 1, 150_000_000));
        let value = serde_json::to_value(&prev).unwrap();
        assert_eq!(value["vout"], 1);
        assert_eq!(value["amount"], 1.5);
        assert!(value["scriptPubKey"].as_str().unwrap().starts_with("76a914"));
    }
}
