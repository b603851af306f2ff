use crate::infrastructure::blockchain::{ReceiptSource, ReceiptStatus};
use crate::shared::constants::{
    CONFIRMATION_MAX_WAIT_SECS, CONFIRMATION_POLL_INTERVAL_MS, REQUIRED_CONFIRMATIONS,
};
use crate::shared::error::{SwapStep, SwapStepError};
use crate::shared::types::TransactionHash;
use log::debug;
use std::time::Duration;
use tokio::time::{sleep, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub required_confirmations: u64,
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            required_confirmations: REQUIRED_CONFIRMATIONS,
            poll_interval: Duration::from_millis(CONFIRMATION_POLL_INTERVAL_MS),
            max_wait: Duration::from_secs(CONFIRMATION_MAX_WAIT_SECS),
        }
    }
}

/// Poll the receipt until the transaction has enough confirmations
///
/// A reverted receipt fails the step at once; so does an RPC error.
pub async fn wait_for_confirmation(
    receipts: &dyn ReceiptSource,
    tx_hash: TransactionHash,
    step: SwapStep,
    policy: &ConfirmationPolicy,
) -> Result<ReceiptStatus, SwapStepError> {
    let started = Instant::now();
    let required = policy.required_confirmations.max(1);

    loop {
        let receipt = receipts
            .receipt(tx_hash)
            .await
            .map_err(|e| SwapStepError::failed(step, e))?;

        if let Some(receipt) = receipt {
            if !receipt.success {
                return Err(SwapStepError::Reverted { step, tx_hash });
            }
            let head = receipts
                .block_number()
                .await
                .map_err(|e| SwapStepError::failed(step, e))?;
            let confirmations = head.saturating_sub(receipt.block_number) + 1;
            if confirmations >= required {
                debug!("{} transaction {:?} confirmed ({} confirmations)", step, tx_hash, confirmations);
                return Ok(receipt);
            }
        }

        if started.elapsed() >= policy.max_wait {
            return Err(SwapStepError::ConfirmationTimeout {
                step,
                tx_hash,
                waited_secs: started.elapsed().as_secs(),
            });
        }
        sleep(policy.poll_interval).await;
    }
}
