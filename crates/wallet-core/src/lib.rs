//! Raptoreum wallet engine.
//!
//! Selects outputs, builds native and asset transfers, has a node sign and
//! broadcast them, and waits for confirmations. All node access goes through
//! a [`node_rpc::RpcClient`].

pub mod broadcast;
pub mod config;
pub mod error;
pub mod issuance;
pub mod poller;
pub mod provider;
pub mod wallet;

pub use broadcast::submit;
pub use config::WalletConfig;
pub use error::WalletError;
pub use issuance::{
    CheckpointStore, FileCheckpointStore, IssuanceCheckpoint, IssuanceStage, IssuanceStep,
    IssuanceWorkflow,
};
pub use poller::{wait_for_confirmation, ConfirmationResult, PollPolicy};
pub use provider::Provider;
pub use wallet::Wallet;

pub use chain_rtm::{RtmNetwork, DEFAULT_FEE_SAT, DUST_THRESHOLD_SAT};
pub use node_rpc::{AssetMetadata, BroadcastOptions, HttpRpcClient, RpcClient, RpcConfig};
