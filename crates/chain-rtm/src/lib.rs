//! Raptoreum chain support for the wallet.
//!
//! Provides the per-network parameter table, P2PKH/WIF key and address
//! codec, first-fit coin selection, and native/asset transaction assembly.
//! Everything here is pure; talking to a node lives in `node-rpc`.

pub mod address;
pub mod error;
pub mod network;
pub mod transaction;
pub mod utxo;

pub use address::{
    address_from_wif, generate_key_pair, pubkey_to_address, validate_address, KeyPair,
};
pub use error::RtmError;
pub use network::{NetworkParams, RtmNetwork};
pub use transaction::{
    build_asset_transfer, build_native_transfer, PreviousOutputDescriptor, TransactionOutput,
    TransactionPlan, DEFAULT_FEE_SAT, DUST_THRESHOLD_SAT,
};
pub use utxo::{
    select_asset_output, select_fee_inputs, select_filtered_asset_output, select_for_amount,
    TransactionInput, UnspentOutput, UtxoSelection,
};
