//! Error handling for the bridge core
//!
//! One error enum per component, plus [`BridgeError`] which wraps all of them
//! for callers that drive several components at once.

use ethers::types::{Address, H256};
use std::fmt;
use thiserror::Error;

/// EIP-1193 error returned by a wallet provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("provider error {code}: {message}")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
}

impl ProviderRpcError {
    /// The user rejected the request in the wallet UI
    pub const USER_REJECTED: i64 = 4001;
    /// The wallet does not know the requested chain
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    /// Transport level failure, no EIP-1193 code available
    pub const TRANSPORT: i64 = -1;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(Self::TRANSPORT, message)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Self::USER_REJECTED
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Self::UNRECOGNIZED_CHAIN
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to switch wallet to chain {chain_id}: {reason}")]
pub struct NetworkSwitchError {
    pub chain_id: u64,
    pub reason: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Wallet provider not available: {0}")]
    ProviderMissing(String),

    #[error("Connection request rejected by user")]
    UserRejected,

    #[error("No accounts found. Please unlock the wallet.")]
    NoAccounts,

    #[error("Wallet connection timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("Wallet connection cancelled")]
    Cancelled,

    #[error("Invalid private key format: {0}")]
    MalformedKey(String),

    #[error("No wallet connected")]
    NotConnected,

    #[error("Wallet provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    NetworkSwitch(#[from] NetworkSwitchError),
}

impl From<ProviderRpcError> for ConnectionError {
    fn from(err: ProviderRpcError) -> Self {
        if err.is_user_rejection() {
            Self::UserRejected
        } else {
            Self::Provider(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Malformed swap path: {0}")]
    MalformedPath(String),

    #[error("Router call failed: {0}")]
    Router(String),
}

/// A single price source failed; absorbed by the aggregator
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{source_name} price unavailable: {reason}")]
pub struct PriceSourceError {
    pub source_name: String,
    pub reason: String,
}

impl PriceSourceError {
    pub fn new(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Failure talking to a chain node or contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract call failed: {0}")]
    Call(String),

    #[error("ABI error: {0}")]
    Abi(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStep {
    Quote,
    Approve,
    Swap,
    Bridge,
}

impl fmt::Display for SwapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwapStep::Quote => "Quote",
            SwapStep::Approve => "Approval",
            SwapStep::Swap => "Swap",
            SwapStep::Bridge => "Bridge",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapStepError {
    #[error("A swap is already in progress")]
    AlreadyInProgress,

    #[error("Invalid swap request: {0}")]
    InvalidRequest(String),

    #[error("{step} failed: {reason}")]
    Failed { step: SwapStep, reason: String },

    #[error("{step} transaction {tx_hash:?} reverted")]
    Reverted { step: SwapStep, tx_hash: H256 },

    #[error("{step} transaction {tx_hash:?} not confirmed within {waited_secs}s")]
    ConfirmationTimeout {
        step: SwapStep,
        tx_hash: H256,
        waited_secs: u64,
    },
}

impl SwapStepError {
    pub fn failed(step: SwapStep, reason: impl fmt::Display) -> Self {
        Self::Failed {
            step,
            reason: reason.to_string(),
        }
    }
}

/// Umbrella error for the bridge client facade
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown token {0:?}")]
    UnknownToken(Address),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    PriceSource(#[from] PriceSourceError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Swap(#[from] SwapStepError),
}

impl BridgeError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<NetworkSwitchError> for BridgeError {
    fn from(err: NetworkSwitchError) -> Self {
        Self::Connection(ConnectionError::NetworkSwitch(err))
    }
}

impl From<anyhow::Error> for BridgeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rejection_maps_to_connection_error() {
        let err: ConnectionError = ProviderRpcError::new(4001, "User denied").into();
        assert_eq!(err, ConnectionError::UserRejected);

        let err: ConnectionError = ProviderRpcError::new(-32603, "internal").into();
        assert!(matches!(err, ConnectionError::Provider(_)));
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        let err = SwapStepError::failed(SwapStep::Bridge, "execution reverted");
        assert_eq!(err.to_string(), "Bridge failed: execution reverted");

        let err = BridgeError::from(NetworkSwitchError {
            chain_id: 250,
            reason: "rejected".to_string(),
        });
        assert_eq!(err.to_string(), "Failed to switch wallet to chain 250: rejected");
    }
}
