//! Token entity for the bridge core

use crate::shared::types::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
    pub chain_id: u64,
}

impl TokenInfo {
    pub fn new(symbol: impl Into<String>, address: Address, decimals: u8, chain_id: u64) -> Self {
        Self {
            symbol: symbol.into(),
            address,
            decimals,
            chain_id,
        }
    }
}

/// Tokens the client knows how to quote, swap and display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCatalogue {
    pub jefe: TokenInfo,
    pub usdc_source: TokenInfo,
    pub wrapped_native: TokenInfo,
    pub usdc_destination: TokenInfo,
    pub weth: TokenInfo,
}

impl TokenCatalogue {
    pub fn all(&self) -> [&TokenInfo; 5] {
        [
            &self.jefe,
            &self.usdc_source,
            &self.wrapped_native,
            &self.usdc_destination,
            &self.weth,
        ]
    }

    pub fn by_address(&self, chain_id: u64, address: Address) -> Option<&TokenInfo> {
        self.all()
            .into_iter()
            .find(|token| token.chain_id == chain_id && token.address == address)
    }

    pub fn by_symbol(&self, chain_id: u64, symbol: &str) -> Option<&TokenInfo> {
        self.all()
            .into_iter()
            .find(|token| token.chain_id == chain_id && token.symbol.eq_ignore_ascii_case(symbol))
    }
}
