use super::PriceAggregator;
use crate::domain::entities::{PegRatio, PriceSnapshot};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Running price poller; dropping the handle stops it
pub struct PollerHandle {
    snapshots: watch::Receiver<Option<PriceSnapshot>>,
    peg_ratio: watch::Sender<PegRatio>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<Option<PriceSnapshot>> {
        self.snapshots.clone()
    }

    pub fn latest(&self) -> Option<PriceSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn peg_ratio(&self) -> PegRatio {
        *self.peg_ratio.borrow()
    }

    /// Replace the ratio and refresh immediately
    pub fn set_peg_ratio(&self, ratio: PegRatio) {
        info!("Peg ratio set to {}", ratio);
        self.peg_ratio.send_replace(ratio);
    }

    pub fn stop(self) {}
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Publish a fresh snapshot every `every`, and whenever the peg ratio changes
pub fn spawn_poller(aggregator: Arc<PriceAggregator>, ratio: PegRatio, every: Duration) -> PollerHandle {
    let (snapshot_tx, snapshot_rx) = watch::channel(None);
    let (peg_tx, mut peg_rx) = watch::channel(ratio);

    let task = tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = peg_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let ratio = *peg_rx.borrow_and_update();
            let snapshot = aggregator.snapshot(ratio).await;
            debug!(
                "Price snapshot: reference {:.2} USD, pegged {:.2} USD",
                snapshot.reference_usd, snapshot.pegged_usd
            );
            snapshot_tx.send_replace(Some(snapshot));
        }
        debug!("Price poller stopped");
    });

    PollerHandle {
        snapshots: snapshot_rx,
        peg_ratio: peg_tx,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prices::tests::source;
    use crate::domain::entities::PriceSourceKind;

    fn aggregator() -> Arc<PriceAggregator> {
        Arc::new(PriceAggregator::new(
            vec![source(PriceSourceKind::Binance, Some(3000.0))],
            3000.0,
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_publishes_on_each_tick() {
        let handle = spawn_poller(aggregator(), PegRatio::default(), Duration::from_secs(30));
        let mut updates = handle.subscribe();

        updates.changed().await.unwrap();
        let first = updates.borrow_and_update().clone().unwrap();
        assert_eq!(first.pegged_usd, 3000.0);

        let started = tokio::time::Instant::now();
        updates.changed().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(30));
        assert!(handle.latest().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_peg_ratio_change_refreshes_immediately() {
        let handle = spawn_poller(aggregator(), PegRatio::default(), Duration::from_secs(30));
        let mut updates = handle.subscribe();
        updates.changed().await.unwrap();
        updates.borrow_and_update();

        let started = tokio::time::Instant::now();
        handle.set_peg_ratio(PegRatio::new(0.25).unwrap());
        updates.changed().await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(30));
        assert_eq!(handle.peg_ratio().value(), 0.25);
        assert_eq!(updates.borrow().as_ref().unwrap().pegged_usd, 750.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_the_loop() {
        let handle = spawn_poller(aggregator(), PegRatio::default(), Duration::from_secs(30));
        let mut updates = handle.subscribe();
        updates.changed().await.unwrap();

        handle.stop();
        assert!(updates.changed().await.is_err());
    }
}
