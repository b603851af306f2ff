//! Network entity for the bridge core

use crate::shared::constants::*;
use crate::shared::utils::chain_id_hex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer: String,
    pub native_currency: NativeCurrency,
}

impl NetworkInfo {
    pub fn fantom() -> Self {
        Self {
            chain_id: FANTOM_CHAIN_ID,
            name: FANTOM_NAME.to_string(),
            rpc_url: FANTOM_RPC_URL.to_string(),
            explorer: FANTOM_EXPLORER.to_string(),
            native_currency: NativeCurrency {
                name: "Fantom".to_string(),
                symbol: "FTM".to_string(),
                decimals: NATIVE_DECIMALS,
            },
        }
    }

    pub fn ethereum() -> Self {
        Self {
            chain_id: ETHEREUM_CHAIN_ID,
            name: ETHEREUM_NAME.to_string(),
            rpc_url: ETHEREUM_RPC_URL.to_string(),
            explorer: ETHEREUM_EXPLORER.to_string(),
            native_currency: NativeCurrency {
                name: "Ether".to_string(),
                symbol: "ETH".to_string(),
                decimals: NATIVE_DECIMALS,
            },
        }
    }

    /// Parameters for `wallet_addEthereumChain`
    pub fn add_chain_params(&self) -> serde_json::Value {
        serde_json::json!({
            "chainId": chain_id_hex(self.chain_id),
            "chainName": self.name,
            "rpcUrls": [self.rpc_url],
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "blockExplorerUrls": [self.explorer],
        })
    }

    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer.trim_end_matches('/'), tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_chain_params_use_hex_chain_id() {
        let params = NetworkInfo::fantom().add_chain_params();
        assert_eq!(params["chainId"], "0xfa");
        assert_eq!(params["chainName"], "Fantom Opera");
        assert_eq!(params["nativeCurrency"]["symbol"], "FTM");
        assert_eq!(params["blockExplorerUrls"][0], "https://ftmscan.com");
    }

    #[test]
    fn test_tx_url() {
        let url = NetworkInfo::ethereum().tx_url("0xabc");
        assert_eq!(url, "https://etherscan.io/tx/0xabc");
    }
}
