/// JSON-RPC methods of a Raptoreum full node used by the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GetAddressUtxos,
    GetAddressBalance,
    GetBlock,
    GetBestBlockHash,
    GetBlockchainInfo,
    GetRawTransaction,
    CreateRawTransaction,
    SignRawTransactionWithKey,
    SendRawTransaction,
    ValidateAddress,
    GetAssetDetailsByName,
    GetAssetDetailsById,
    ListAddressesByAsset,
    ListAssetBalancesByAddress,
    CreateAsset,
    MintAsset,
    SendAsset,
}

impl Method {
    /// Wire name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::GetAddressUtxos => "getaddressutxos",
            Method::GetAddressBalance => "getaddressbalance",
            Method::GetBlock => "getblock",
            Method::GetBestBlockHash => "getbestblockhash",
            Method::GetBlockchainInfo => "getblockchaininfo",
            Method::GetRawTransaction => "getrawtransaction",
            Method::CreateRawTransaction => "createrawtransaction",
            Method::SignRawTransactionWithKey => "signrawtransactionwithkey",
            Method::SendRawTransaction => "sendrawtransaction",
            Method::ValidateAddress => "validateaddress",
            Method::GetAssetDetailsByName => "getassetdetailsbyname",
            Method::GetAssetDetailsById => "getassetdetailsbyid",
            Method::ListAddressesByAsset => "listaddressesbyasset",
            Method::ListAssetBalancesByAddress => "listassetbalancesbyaddress",
            Method::CreateAsset => "createasset",
            Method::MintAsset => "mintasset",
            Method::SendAsset => "sendasset",
        }
    }

    /// `true` for calls that change node or chain state.
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Method::SendRawTransaction | Method::CreateAsset | Method::MintAsset | Method::SendAsset
        )
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_lowercase() {
        for method in [
            Method::GetAddressUtxos,
            Method::SignRawTransactionWithKey,
            Method::ListAssetBalancesByAddress,
        ] {
            let name = method.to_string();
            assert_eq!(name, name.to_lowercase());
        }
        assert_eq!(Method::GetBestBlockHash.to_string(), "getbestblockhash");
    }

    #[test]
    fn only_broadcast_and_asset_calls_mutate() {
        assert!(Method::SendRawTransaction.is_mutating());
        assert!(Method::MintAsset.is_mutating());
        assert!(!Method::CreateRawTransaction.is_mutating());
        assert!(!Method::SignRawTransactionWithKey.is_mutating());
    }
}
