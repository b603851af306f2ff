use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use ethers::types::{Address, H256, U256};

pub type TransactionHash = H256;
pub type ChainId = u64;

/// Human-readable balance per asset, already scaled by the token decimals
pub type Balances = BTreeMap<Asset, String>;

/// Assets tracked in the connected wallet's balance sheet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Asset {
    Jefe,
    Ftm,
    Eth,
    Usdc,
}

impl Asset {
    pub const ALL: [Asset; 4] = [Asset::Jefe, Asset::Ftm, Asset::Eth, Asset::Usdc];

    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Jefe => "JEFE",
            Asset::Ftm => "FTM",
            Asset::Eth => "ETH",
            Asset::Usdc => "USDC",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// How the current wallet was connected
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WalletKind {
    MetaMask,
    Coinbase,
    PrivateKey,
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WalletKind::MetaMask => "MetaMask",
            WalletKind::Coinbase => "Coinbase Wallet",
            WalletKind::PrivateKey => "Private key",
        };
        f.write_str(name)
    }
}

/// Balance sheet with every tracked asset at zero
pub fn zero_balances() -> Balances {
    Asset::ALL.iter().map(|asset| (*asset, "0".to_string())).collect()
}
