//! Wallet entity and related value objects

use crate::infrastructure::blockchain::SigningHandle;
use crate::shared::types::{Address, Asset, Balances, WalletKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The connected wallet
///
/// Carries the signing handle, so it has no `Serialize`; use
/// [`WalletState::summary`] for anything that leaves the process.
#[derive(Clone)]
pub struct WalletState {
    pub address: Address,
    pub balances: Balances,
    pub chain_id: u64,
    pub signer: SigningHandle,
    pub kind: WalletKind,
}

impl WalletState {
    pub fn balance(&self, asset: Asset) -> &str {
        self.balances.get(&asset).map(String::as_str).unwrap_or("0")
    }

    pub fn summary(&self) -> WalletSummary {
        WalletSummary {
            address: self.address,
            balances: self.balances.clone(),
            chain_id: self.chain_id,
            kind: self.kind,
        }
    }
}

impl fmt::Debug for WalletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletState")
            .field("address", &self.address)
            .field("balances", &self.balances)
            .field("chain_id", &self.chain_id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Safe wallet information for display and serialization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletSummary {
    pub address: Address,
    pub balances: Balances,
    pub chain_id: u64,
    pub kind: WalletKind,
}

impl WalletSummary {
    pub fn short_address(&self) -> String {
        let full = format!("{:?}", self.address);
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}
