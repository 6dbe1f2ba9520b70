//! JSON-RPC access to a Raptoreum full node.
//!
//! [`RpcClient`] is the single generic call seam; [`HttpRpcClient`] is the
//! reqwest transport and [`NodeApi`] adds typed wrappers for every method in
//! [`Method`].

pub mod client;
pub mod config;
pub mod error;
pub mod method;
pub mod node;
pub mod types;

pub use client::{call_as, HttpRpcClient, RpcClient};
pub use config::RpcConfig;
pub use error::{ConfigError, RpcError};
pub use method::Method;
pub use node::NodeApi;
pub use types::{
    AddressBalance, AssetDetails, AssetMetadata, BlockInfo, BlockchainInfo, BroadcastOptions,
    DistributionType, InputSigningError, RawTransaction, SignedTransaction,
    ValidateAddressResult,
};
