use crate::domain::entities::{TransactionRecord, TransactionStatus};
use crate::shared::types::TransactionHash;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Transactions of the current session, newest first
#[derive(Clone, Default)]
pub struct TransactionHistory {
    records: Arc<RwLock<Vec<TransactionRecord>>>,
}

impl TransactionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, record: TransactionRecord) -> Uuid {
        let id = record.id;
        self.records.write().await.insert(0, record);
        id
    }

    pub async fn set_tx_hash(&self, id: Uuid, tx_hash: TransactionHash) {
        if let Some(record) = self.records.write().await.iter_mut().find(|r| r.id == id) {
            record.tx_hash = Some(format!("{:?}", tx_hash));
        }
    }

    pub async fn set_status(&self, id: Uuid, status: TransactionStatus) {
        if let Some(record) = self.records.write().await.iter_mut().find(|r| r.id == id) {
            record.status = status;
        }
    }

    pub async fn all(&self) -> Vec<TransactionRecord> {
        self.records.read().await.clone()
    }

    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}
