//! Swap progress and receipt entities

use crate::shared::types::{Address, TransactionHash, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SwapStage {
    Idle,
    ApprovingAndSwapping,
    Bridging,
    Finalizing,
}

impl fmt::Display for SwapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SwapStage::Idle => "Idle",
            SwapStage::ApprovingAndSwapping => "Swapping JEFE to USDC",
            SwapStage::Bridging => "Bridging USDC to Ethereum",
            SwapStage::Finalizing => "Finalizing",
        };
        f.write_str(label)
    }
}

/// Progress of the current swap attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwapProgress {
    pub stage: SwapStage,
    pub percent: u8,
    pub error: Option<String>,
    pub tx_hashes: Vec<TransactionHash>,
}

impl SwapProgress {
    pub fn idle() -> Self {
        Self {
            stage: SwapStage::Idle,
            percent: 0,
            error: None,
            tx_hashes: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.stage != SwapStage::Idle
    }
}

impl Default for SwapProgress {
    fn default() -> Self {
        Self::idle()
    }
}

/// Destination-side conversion is left to the bridge relayer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RelayerStatus {
    PendingRelayer,
}

/// Swap-then-bridge request built by the swap form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwapRequest {
    pub amount_in: String,
    pub recipient: Address,
    /// Locally estimated output, used when the router cannot quote
    pub estimated_output: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwapReceipt {
    pub attempt_id: Uuid,
    pub swap_tx: TransactionHash,
    pub bridge_tx: TransactionHash,
    pub bridged_amount: U256,
    pub recipient: Address,
    pub destination_chain_id: u64,
    pub relayer: RelayerStatus,
    pub completed_at: DateTime<Utc>,
}
