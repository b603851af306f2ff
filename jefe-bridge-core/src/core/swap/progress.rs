use crate::domain::entities::{SwapProgress, SwapStage};
use crate::shared::error::SwapStepError;
use crate::shared::types::TransactionHash;
use std::sync::Arc;
use tokio::sync::watch;

/// Publishes the progress of the current swap attempt
///
/// Within an attempt the percentage only moves forward. It drops to 0 when
/// the attempt fails, or after the reset delay once it has completed.
#[derive(Clone)]
pub struct ProgressTracker {
    tx: Arc<watch::Sender<SwapProgress>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SwapProgress::idle());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<SwapProgress> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> SwapProgress {
        self.tx.borrow().clone()
    }

    /// Start a new attempt at 10%; rejected while another one is running
    pub fn begin(&self) -> Result<(), SwapStepError> {
        let started = self.tx.send_if_modified(|progress| {
            if progress.is_running() {
                return false;
            }
            *progress = SwapProgress {
                stage: SwapStage::ApprovingAndSwapping,
                percent: 10,
                error: None,
                tx_hashes: Vec::new(),
            };
            true
        });
        if started {
            Ok(())
        } else {
            Err(SwapStepError::AlreadyInProgress)
        }
    }

    pub fn advance(&self, stage: SwapStage, percent: u8) {
        let percent = percent.min(100);
        self.tx.send_if_modified(|progress| {
            if !progress.is_running() || percent < progress.percent {
                return false;
            }
            progress.stage = stage;
            progress.percent = percent;
            true
        });
    }

    pub fn record_tx(&self, tx_hash: TransactionHash) {
        self.tx.send_modify(|progress| progress.tx_hashes.push(tx_hash));
    }

    /// End the attempt with an error; hashes sent so far stay visible
    pub fn fail(&self, error: impl Into<String>) {
        let error = error.into();
        self.tx.send_modify(|progress| {
            progress.stage = SwapStage::Idle;
            progress.percent = 0;
            progress.error = Some(error);
        });
    }

    /// Back to idle after a completed attempt
    pub fn reset_completed(&self) {
        self.tx.send_if_modified(|progress| {
            if progress.stage == SwapStage::Finalizing && progress.percent == 100 {
                *progress = SwapProgress::idle();
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_rejected() {
        let tracker = ProgressTracker::new();
        tracker.begin().unwrap();
        assert_eq!(tracker.begin(), Err(SwapStepError::AlreadyInProgress));

        tracker.fail("Swap failed: reverted");
        assert!(tracker.begin().is_ok());
        assert_eq!(tracker.current().error, None);
    }

    #[test]
    fn test_progress_never_moves_backwards() {
        let tracker = ProgressTracker::new();
        tracker.begin().unwrap();
        tracker.advance(SwapStage::Bridging, 40);
        tracker.advance(SwapStage::ApprovingAndSwapping, 30);
        assert_eq!(tracker.current().percent, 40);
        assert_eq!(tracker.current().stage, SwapStage::Bridging);
    }

    #[test]
    fn test_advance_ignored_when_idle() {
        let tracker = ProgressTracker::new();
        tracker.advance(SwapStage::Bridging, 40);
        assert_eq!(tracker.current(), SwapProgress::idle());
    }

    #[test]
    fn test_failure_drops_to_zero_and_keeps_hashes() {
        let tracker = ProgressTracker::new();
        tracker.begin().unwrap();
        tracker.record_tx(TransactionHash::repeat_byte(7));
        tracker.advance(SwapStage::ApprovingAndSwapping, 30);
        tracker.fail("Bridge failed: rejected");

        let progress = tracker.current();
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.stage, SwapStage::Idle);
        assert_eq!(progress.error.as_deref(), Some("Bridge failed: rejected"));
        assert_eq!(progress.tx_hashes.len(), 1);
    }

    #[test]
    fn test_reset_only_after_completion() {
        let tracker = ProgressTracker::new();
        tracker.begin().unwrap();
        tracker.advance(SwapStage::Bridging, 70);
        tracker.reset_completed();
        assert_eq!(tracker.current().percent, 70);

        tracker.advance(SwapStage::Finalizing, 100);
        tracker.reset_completed();
        assert_eq!(tracker.current(), SwapProgress::idle());
    }
}
