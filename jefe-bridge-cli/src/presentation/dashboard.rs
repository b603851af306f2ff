use super::render::{render_balances, render_prices, render_progress, render_wallet};
use jefe_bridge_core::domain::entities::{PriceSnapshot, SwapProgress, WalletState};
use std::future::Future;
use std::io::{self, Write};
use tokio::sync::watch;

/// Re-renders the whole view whenever wallet, prices or progress change
pub struct Dashboard {
    wallet: watch::Receiver<Option<WalletState>>,
    prices: watch::Receiver<Option<PriceSnapshot>>,
    progress: watch::Receiver<SwapProgress>,
    clear_screen: bool,
}

impl Dashboard {
    pub fn new(
        wallet: watch::Receiver<Option<WalletState>>,
        prices: watch::Receiver<Option<PriceSnapshot>>,
        progress: watch::Receiver<SwapProgress>,
    ) -> Self {
        Self {
            wallet,
            prices,
            progress,
            clear_screen: false,
        }
    }

    /// Redraw in place instead of appending frames
    pub fn clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn frame(&self) -> String {
        let wallet = self.wallet.borrow().as_ref().map(WalletState::summary);
        let mut sections = vec![render_wallet(wallet.as_ref())];
        if let Some(wallet) = &wallet {
            sections.push(render_balances(&wallet.balances));
        }
        if let Some(prices) = self.prices.borrow().as_ref() {
            sections.push(render_prices(prices));
        }
        sections.push(render_progress(&self.progress.borrow()));
        sections.join("\n")
    }

    fn draw<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let _ = self.wallet.borrow_and_update();
        let _ = self.prices.borrow_and_update();
        let _ = self.progress.borrow_and_update();
        if self.clear_screen {
            write!(out, "\x1b[2J\x1b[H")?;
        }
        writeln!(out, "{}\n", self.frame())?;
        out.flush()
    }

    /// Draw once, then on every change until `stop` resolves or every sender is gone
    pub async fn run<W, F>(mut self, mut out: W, stop: F) -> io::Result<W>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        self.draw(&mut out)?;

        let (mut wallet_open, mut prices_open, mut progress_open) = (true, true, true);
        while wallet_open || prices_open || progress_open {
            tokio::select! {
                _ = &mut stop => break,
                changed = self.wallet.changed(), if wallet_open => {
                    wallet_open = changed.is_ok();
                    if !wallet_open {
                        continue;
                    }
                }
                changed = self.prices.changed(), if prices_open => {
                    prices_open = changed.is_ok();
                    if !prices_open {
                        continue;
                    }
                }
                changed = self.progress.changed(), if progress_open => {
                    progress_open = changed.is_ok();
                    if !progress_open {
                        continue;
                    }
                }
            }
            self.draw(&mut out)?;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jefe_bridge_core::core::swap::ProgressTracker;
    use jefe_bridge_core::domain::entities::{PegRatio, PriceOrigin, SwapStage};
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn snapshot() -> PriceSnapshot {
        PriceSnapshot::new(3000.0, PegRatio::default(), Vec::new(), PriceOrigin::Fallback)
    }

    #[test]
    fn test_frame_without_wallet() {
        colored::control::set_override(false);
        let (_wallet_tx, wallet_rx) = watch::channel(None);
        let (_prices_tx, prices_rx) = watch::channel(Some(snapshot()));
        let progress = ProgressTracker::new();

        let frame = Dashboard::new(wallet_rx, prices_rx, progress.subscribe()).frame();
        assert!(frame.starts_with("Wallet: not connected"));
        assert!(frame.contains("JEFE  $3000.00"));
        assert!(frame.contains("0% Idle"));
    }

    #[tokio::test]
    async fn test_redraws_on_progress_change() {
        colored::control::set_override(false);
        let (_wallet_tx, wallet_rx) = watch::channel(None);
        let (_prices_tx, prices_rx) = watch::channel(None);
        let progress = ProgressTracker::new();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let dashboard = Dashboard::new(wallet_rx, prices_rx, progress.subscribe());
        let task = tokio::spawn(dashboard.run(Vec::new(), async move {
            let _ = stop_rx.await;
        }));

        tokio::time::sleep(Duration::from_millis(10)).await;
        progress.begin().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        progress.advance(SwapStage::Bridging, 40);
        tokio::time::sleep(Duration::from_millis(10)).await;
        stop_tx.send(()).unwrap();

        let out = String::from_utf8(task.await.unwrap().unwrap()).unwrap();
        assert!(out.contains("0% Idle"));
        assert!(out.contains("40% Bridging USDC to Ethereum"));
        assert!(!out.contains("\x1b[2J"));
    }

    #[tokio::test]
    async fn test_stops_when_every_sender_is_gone() {
        let (wallet_tx, wallet_rx) = watch::channel(None);
        let (prices_tx, prices_rx) = watch::channel(None);
        let (progress_tx, progress_rx) = watch::channel(SwapProgress::idle());
        drop((wallet_tx, prices_tx, progress_tx));

        let out = Dashboard::new(wallet_rx, prices_rx, progress_rx)
            .run(Vec::new(), std::future::pending())
            .await
            .unwrap();
        assert_eq!(out.iter().filter(|b| **b == b'\n').count(), 3);
    }
}
