//! Session transaction history entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionKind {
    Swap,
    Bridge,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub amount: String,
    pub from: String,
    pub to: String,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: Option<String>,
}

impl TransactionRecord {
    pub fn pending(kind: TransactionKind, amount: String, from: &str, to: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: TransactionStatus::Pending,
            amount,
            from: from.to_string(),
            to: to.to_string(),
            timestamp: Utc::now(),
            tx_hash: None,
        }
    }
}
