//! Swap/bridge orchestrator
//!
//! Runs the three steps of an attempt in order: swap the input token on the
//! source chain router, bridge the output to the destination chain, then
//! hand over to the bridge relayer. Each step waits for its transactions to
//! confirm before the next one starts.

pub mod confirmation;
pub mod history;
pub mod progress;

pub use confirmation::{wait_for_confirmation, ConfirmationPolicy};
pub use history::TransactionHistory;
pub use progress::ProgressTracker;

use crate::core::quotes::{QuoteFetcher, RouteTable};
use crate::domain::entities::{
    RelayerStatus, SwapReceipt, SwapRequest, SwapStage, TokenInfo, TransactionKind, TransactionRecord,
    TransactionStatus,
};
use crate::infrastructure::blockchain::{ChainBackends, SwapCall, SwapMethod};
use crate::shared::constants::{
    DEFAULT_SLIPPAGE_BPS, ETHEREUM_CHAIN_ID, PROGRESS_RESET_DELAY_MS, SWAP_DEADLINE_SECS,
};
use crate::shared::error::{SwapStep, SwapStepError};
use crate::shared::types::{Address, TransactionHash, U256};
use crate::shared::utils::{apply_slippage, current_timestamp, format_token_amount, parse_token_amount};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapSettings {
    pub slippage_bps: u32,
    pub deadline: Duration,
    pub destination_chain_id: u64,
    pub reset_delay: Duration,
    pub confirmation: ConfirmationPolicy,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            deadline: Duration::from_secs(SWAP_DEADLINE_SECS),
            destination_chain_id: ETHEREUM_CHAIN_ID,
            reset_delay: Duration::from_millis(PROGRESS_RESET_DELAY_MS),
            confirmation: ConfirmationPolicy::default(),
        }
    }
}

/// Tokens and parties of one attempt
struct Attempt<'a> {
    id: Uuid,
    sender: Address,
    recipient: Address,
    token_in: &'a TokenInfo,
    token_out: &'a TokenInfo,
    amount_in: U256,
    estimated_output: Option<f64>,
}

pub struct SwapOrchestrator {
    routes: RouteTable,
    settings: SwapSettings,
    progress: ProgressTracker,
    history: TransactionHistory,
}

impl SwapOrchestrator {
    pub fn new(routes: RouteTable, settings: SwapSettings) -> Self {
        Self {
            routes,
            settings,
            progress: ProgressTracker::new(),
            history: TransactionHistory::new(),
        }
    }

    pub fn settings(&self) -> &SwapSettings {
        &self.settings
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn history(&self) -> &TransactionHistory {
        &self.history
    }

    /// Swap `token_in` for `token_out`, then bridge the output to `request.recipient`
    pub async fn execute(
        &self,
        backends: &ChainBackends,
        sender: Address,
        token_in: &TokenInfo,
        token_out: &TokenInfo,
        request: SwapRequest,
    ) -> Result<SwapReceipt, SwapStepError> {
        let amount_in = parse_token_amount(&request.amount_in, token_in.decimals)
            .map_err(|e| SwapStepError::InvalidRequest(e.to_string()))?;
        if request.recipient.is_zero() {
            return Err(SwapStepError::InvalidRequest("recipient is the zero address".to_string()));
        }

        self.progress.begin()?;

        let attempt = Attempt {
            id: Uuid::new_v4(),
            sender,
            recipient: request.recipient,
            token_in,
            token_out,
            amount_in,
            estimated_output: request.estimated_output,
        };
        info!(
            "Swap attempt {}: {} {} to {:?} on chain {}",
            attempt.id,
            request.amount_in.trim(),
            token_in.symbol,
            attempt.recipient,
            self.settings.destination_chain_id
        );

        let swap_record = self
            .history
            .record(TransactionRecord::pending(
                TransactionKind::Swap,
                format!("{} {}", request.amount_in.trim(), token_in.symbol),
                &token_in.symbol,
                &token_out.symbol,
            ))
            .await;

        match self.run(backends, &attempt, swap_record).await {
            Ok(receipt) => {
                self.history.set_status(swap_record, TransactionStatus::Completed).await;
                info!("Swap attempt {} completed", attempt.id);
                self.schedule_reset();
                Ok(receipt)
            }
            Err(e) => {
                error!("Swap attempt {} failed: {}", attempt.id, e);
                self.history.set_status(swap_record, TransactionStatus::Failed).await;
                self.progress.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        backends: &ChainBackends,
        attempt: &Attempt<'_>,
        swap_record: Uuid,
    ) -> Result<SwapReceipt, SwapStepError> {
        // Step 1: approve and swap on the source chain
        let (swap_tx, min_out) = self.swap_step(backends, attempt, swap_record).await?;
        self.progress.advance(SwapStage::ApprovingAndSwapping, 30);

        // Step 2: approve and bridge the swapped token
        self.progress.advance(SwapStage::Bridging, 40);
        let bridge_tx = self.bridge_step(backends, attempt, min_out).await?;
        self.progress.advance(SwapStage::Bridging, 70);

        // Step 3: the relayer finishes on the destination chain
        self.progress.advance(SwapStage::Finalizing, 80);
        info!(
            "{} {} bridged to chain {}; final conversion is left to the bridge relayer",
            format_token_amount(min_out, attempt.token_out.decimals),
            attempt.token_out.symbol,
            self.settings.destination_chain_id
        );
        self.progress.advance(SwapStage::Finalizing, 100);

        Ok(SwapReceipt {
            attempt_id: attempt.id,
            swap_tx,
            bridge_tx,
            bridged_amount: min_out,
            recipient: attempt.recipient,
            destination_chain_id: self.settings.destination_chain_id,
            relayer: RelayerStatus::PendingRelayer,
            completed_at: Utc::now(),
        })
    }

    async fn swap_step(
        &self,
        backends: &ChainBackends,
        attempt: &Attempt<'_>,
        swap_record: Uuid,
    ) -> Result<(TransactionHash, U256), SwapStepError> {
        let path = self.routes.path(attempt.token_in.address, attempt.token_out.address);
        let expected = self.expected_output(backends, attempt, &path).await?;
        let min_out = apply_slippage(expected, self.settings.slippage_bps);
        debug!(
            "Expected {} {}, minimum {} at {} bps slippage",
            format_token_amount(expected, attempt.token_out.decimals),
            attempt.token_out.symbol,
            format_token_amount(min_out, attempt.token_out.decimals),
            self.settings.slippage_bps
        );

        let wrapped_native = self.routes.wrapped_native();
        let method = if attempt.token_in.address == wrapped_native {
            SwapMethod::ExactEthForTokens
        } else if attempt.token_out.address == wrapped_native {
            SwapMethod::ExactTokensForEth
        } else {
            SwapMethod::ExactTokensForTokens
        };

        if method != SwapMethod::ExactEthForTokens {
            self.ensure_allowance(
                backends,
                attempt.token_in.address,
                attempt.sender,
                backends.router.router_address(),
                attempt.amount_in,
            )
            .await?;
        }

        let deadline = U256::from(current_timestamp().saturating_add(self.settings.deadline.as_secs()));
        let swap_tx = backends
            .router
            .swap(SwapCall {
                method,
                amount_in: attempt.amount_in,
                amount_out_min: min_out,
                path,
                to: attempt.sender,
                deadline,
            })
            .await
            .map_err(|e| SwapStepError::failed(SwapStep::Swap, e))?;
        info!("Swap transaction sent: {:?}", swap_tx);
        self.progress.record_tx(swap_tx);
        self.history.set_tx_hash(swap_record, swap_tx).await;

        wait_for_confirmation(
            backends.receipts.as_ref(),
            swap_tx,
            SwapStep::Swap,
            &self.settings.confirmation,
        )
        .await?;

        Ok((swap_tx, min_out))
    }

    /// Router quote, else the caller's local estimate
    async fn expected_output(
        &self,
        backends: &ChainBackends,
        attempt: &Attempt<'_>,
        path: &[Address],
    ) -> Result<U256, SwapStepError> {
        let fetcher = QuoteFetcher::new(backends.router.clone(), self.routes.clone());
        match fetcher.amount_out(attempt.amount_in, path).await {
            Ok(amount) => Ok(amount),
            Err(e) => {
                warn!("Router quote failed, using local estimate: {}", e);
                let estimate = attempt
                    .estimated_output
                    .filter(|estimate| estimate.is_finite() && *estimate > 0.0)
                    .ok_or_else(|| SwapStepError::failed(SwapStep::Quote, &e))?;
                let decimals = attempt.token_out.decimals;
                parse_token_amount(&format!("{:.*}", decimals as usize, estimate), decimals)
                    .map_err(|e| SwapStepError::failed(SwapStep::Quote, e))
            }
        }
    }

    async fn bridge_step(
        &self,
        backends: &ChainBackends,
        attempt: &Attempt<'_>,
        amount: U256,
    ) -> Result<TransactionHash, SwapStepError> {
        let token = attempt.token_out;
        self.ensure_allowance(
            backends,
            token.address,
            attempt.sender,
            backends.bridge.bridge_address(),
            amount,
        )
        .await?;

        let bridge_record = self
            .history
            .record(TransactionRecord::pending(
                TransactionKind::Bridge,
                format!("{} {}", format_token_amount(amount, token.decimals), token.symbol),
                &token.symbol,
                &format!("{:?}", attempt.recipient),
            ))
            .await;

        let result = async {
            let bridge_tx = backends
                .bridge
                .bridge_out(token.address, attempt.recipient, amount, self.settings.destination_chain_id)
                .await
                .map_err(|e| SwapStepError::failed(SwapStep::Bridge, e))?;
            info!("Bridge transaction sent: {:?}", bridge_tx);
            self.progress.record_tx(bridge_tx);
            self.history.set_tx_hash(bridge_record, bridge_tx).await;

            wait_for_confirmation(
                backends.receipts.as_ref(),
                bridge_tx,
                SwapStep::Bridge,
                &self.settings.confirmation,
            )
            .await?;
            Ok::<_, SwapStepError>(bridge_tx)
        }
        .await;

        let status = if result.is_ok() {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        };
        self.history.set_status(bridge_record, status).await;
        result
    }

    /// Approve `spender` for `amount` unless the current allowance already covers it
    async fn ensure_allowance(
        &self,
        backends: &ChainBackends,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), SwapStepError> {
        let allowance = backends
            .tokens
            .allowance(token, owner, spender)
            .await
            .map_err(|e| SwapStepError::failed(SwapStep::Approve, e))?;
        if allowance >= amount {
            debug!("Allowance for {:?} already covers {}", spender, amount);
            return Ok(());
        }

        let approve_tx = backends
            .tokens
            .approve(token, spender, amount)
            .await
            .map_err(|e| SwapStepError::failed(SwapStep::Approve, e))?;
        debug!("Approval transaction sent: {:?}", approve_tx);
        self.progress.record_tx(approve_tx);

        wait_for_confirmation(
            backends.receipts.as_ref(),
            approve_tx,
            SwapStep::Approve,
            &self.settings.confirmation,
        )
        .await?;
        Ok(())
    }

    fn schedule_reset(&self) {
        let progress = self.progress.clone();
        let delay = self.settings.reset_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            progress.reset_completed();
        });
    }
}
