//! Chain access
//!
//! The components above this layer only see the traits declared here; the
//! ethers-backed implementations live in [`gateway`].

pub mod abi;
#[cfg(test)]
pub(crate) mod fake;
pub mod gateway;

use crate::shared::error::ChainError;
use crate::shared::types::{Address, TransactionHash, U256};
use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::LocalWallet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use gateway::{EvmGateway, EvmReader};

pub type LocalSigner = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Addresses of the contracts used on the source chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    pub router: Address,
    pub bridge: Address,
}

/// Receipt fields needed to count confirmations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptStatus {
    pub block_number: u64,
    pub success: bool,
}

/// Router entry point chosen from the ends of the path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapMethod {
    ExactTokensForTokens,
    ExactEthForTokens,
    ExactTokensForEth,
}

impl SwapMethod {
    pub fn function_name(&self) -> &'static str {
        match self {
            SwapMethod::ExactTokensForTokens => "swapExactTokensForTokens",
            SwapMethod::ExactEthForTokens => "swapExactETHForTokens",
            SwapMethod::ExactTokensForEth => "swapExactTokensForETH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCall {
    pub method: SwapMethod,
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub to: Address,
    pub deadline: U256,
}

/// Read-only chain queries
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError>;
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError>;
    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError>;
    async fn gas_price(&self) -> Result<U256, ChainError>;
}

/// Transaction-status queries used for confirmation polling
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    async fn receipt(&self, tx_hash: TransactionHash) -> Result<Option<ReceiptStatus>, ChainError>;
    async fn block_number(&self) -> Result<u64, ChainError>;
}

#[async_trait]
pub trait TokenGateway: Send + Sync {
    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256, ChainError>;
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<TransactionHash, ChainError>;
}

#[async_trait]
pub trait RouterGateway: Send + Sync {
    fn router_address(&self) -> Address;
    async fn get_amounts_out(&self, amount_in: U256, path: Vec<Address>) -> Result<Vec<U256>, ChainError>;
    async fn swap(&self, call: SwapCall) -> Result<TransactionHash, ChainError>;
}

#[async_trait]
pub trait BridgeGateway: Send + Sync {
    fn bridge_address(&self) -> Address;
    async fn bridge_out(
        &self,
        token: Address,
        recipient: Address,
        amount: U256,
        destination_chain_id: u64,
    ) -> Result<TransactionHash, ChainError>;
}

/// Everything the orchestrator needs from the source chain
#[derive(Clone)]
pub struct ChainBackends {
    pub tokens: Arc<dyn TokenGateway>,
    pub router: Arc<dyn RouterGateway>,
    pub bridge: Arc<dyn BridgeGateway>,
    pub receipts: Arc<dyn ReceiptSource>,
}

impl ChainBackends {
    pub fn from_gateway<G>(gateway: Arc<G>) -> Self
    where
        G: TokenGateway + RouterGateway + BridgeGateway + ReceiptSource + 'static,
    {
        Self {
            tokens: gateway.clone(),
            router: gateway.clone(),
            bridge: gateway.clone(),
            receipts: gateway,
        }
    }
}

/// Signing side of a connected wallet
///
/// `Local` signs in-process from a raw key; `Provider` forwards
/// `eth_sendTransaction` to the wallet application, which holds the keys.
#[derive(Clone)]
pub enum SigningHandle {
    Local(Arc<LocalSigner>),
    Provider(Arc<Provider<Http>>),
}

impl SigningHandle {
    pub fn backends(&self, contracts: ContractAddresses) -> ChainBackends {
        match self {
            SigningHandle::Local(client) => {
                ChainBackends::from_gateway(Arc::new(EvmGateway::new(client.clone(), contracts)))
            }
            SigningHandle::Provider(client) => {
                ChainBackends::from_gateway(Arc::new(EvmGateway::new(client.clone(), contracts)))
            }
        }
    }
}

// Key material stays out of logs
impl fmt::Debug for SigningHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningHandle::Local(_) => f.write_str("SigningHandle::Local"),
            SigningHandle::Provider(_) => f.write_str("SigningHandle::Provider"),
        }
    }
}
