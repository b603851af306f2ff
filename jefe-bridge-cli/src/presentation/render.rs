//! Text rendering of client state
//!
//! Pure functions from state to colored text; the dashboard and the one-shot
//! commands print what these return.

use colored::*;
use jefe_bridge_core::domain::entities::{
    NetworkInfo, PriceOrigin, PriceSnapshot, QuoteOutcome, SwapProgress, SwapReceipt, SwapStage,
    TransactionRecord, TransactionStatus, WalletSummary,
};
use jefe_bridge_core::shared::types::{Asset, Balances};
use jefe_bridge_core::shared::utils::format_token_amount;

const BAR_WIDTH: usize = 30;

pub fn render_wallet(wallet: Option<&WalletSummary>) -> String {
    match wallet {
        Some(wallet) => format!(
            "{} {} ({}, chain {})",
            "Wallet:".bold(),
            wallet.short_address().green(),
            wallet.kind,
            wallet.chain_id
        ),
        None => format!("{} {}", "Wallet:".bold(), "not connected".yellow()),
    }
}

pub fn render_balances(balances: &Balances) -> String {
    let mut lines = vec![format!("{}", "Balances".bold())];
    for asset in Asset::ALL {
        let amount = balances.get(&asset).map(String::as_str).unwrap_or("0");
        lines.push(format!("  {:<5} {}", asset.symbol(), amount));
    }
    lines.join("\n")
}

fn usd(value: f64) -> String {
    format!("${value:.2}")
}

pub fn render_prices(prices: &PriceSnapshot) -> String {
    let origin = match prices.origin {
        PriceOrigin::Live { sources } => format!("live, {sources} source(s)").green(),
        PriceOrigin::Cached => "cached".yellow(),
        PriceOrigin::Fallback => "fallback".red(),
    };
    let mut lines = vec![
        format!("{} ({})", "Prices".bold(), origin),
        format!("  ETH   {}", usd(prices.reference_usd)),
        format!("  JEFE  {} (peg ratio {})", usd(prices.pegged_usd), prices.peg_ratio),
    ];
    for source in &prices.sources {
        let value = match source.usd {
            Some(value) => usd(value).normal(),
            None => "unavailable".dimmed(),
        };
        lines.push(format!("    {:<10} {}", source.source.to_string(), value));
    }
    lines.join("\n")
}

/// Quote line plus the fiat value of the input, when prices are known
pub fn render_quote(amount_in: &str, outcome: &QuoteOutcome, prices: Option<&PriceSnapshot>) -> String {
    let fiat = amount_in
        .trim()
        .parse::<f64>()
        .ok()
        .zip(prices)
        .map(|(amount, prices)| format!(" ({})", usd(prices.fiat_value(amount))))
        .unwrap_or_default();

    match outcome {
        QuoteOutcome::Quoted(quote) => format!(
            "{} {} JEFE{} -> {} {} via {} hop(s)",
            "Quote:".bold(),
            amount_in.trim(),
            fiat,
            quote.amount_out_display().green(),
            quote.token_out.symbol,
            quote.hops()
        ),
        QuoteOutcome::Estimated { amount_out, reason } => format!(
            "{} {} JEFE{} -> ~{} USDC {}",
            "Quote:".bold(),
            amount_in.trim(),
            fiat,
            format!("{amount_out:.6}").yellow(),
            format!("(estimated: {reason})").dimmed()
        ),
        QuoteOutcome::Unavailable { reason } => {
            format!("{} {}", "Quote:".bold(), format!("unavailable ({reason})").red())
        }
    }
}

pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = width * usize::from(percent.min(100)) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn render_progress(progress: &SwapProgress) -> String {
    let bar = progress_bar(progress.percent, BAR_WIDTH);
    let bar = match progress.stage {
        SwapStage::Finalizing if progress.percent == 100 => bar.green(),
        SwapStage::Idle => bar.dimmed(),
        _ => bar.cyan(),
    };
    let mut line = format!("{} {} {:>3}% {}", "Swap:".bold(), bar, progress.percent, progress.stage);
    if let Some(error) = &progress.error {
        line.push_str(&format!("\n  {}", error.red()));
    }
    line
}

pub fn render_receipt(receipt: &SwapReceipt, source: &NetworkInfo) -> String {
    let swap_tx = format!("{:?}", receipt.swap_tx);
    let bridge_tx = format!("{:?}", receipt.bridge_tx);
    [
        format!("{}", "Swap and bridge submitted".green().bold()),
        format!("  attempt   {}", receipt.attempt_id),
        format!("  swap      {}", source.tx_url(&swap_tx)),
        format!("  bridge    {}", source.tx_url(&bridge_tx)),
        format!(
            "  amount    {} USDC to {:?} on chain {}",
            format_token_amount(receipt.bridged_amount, 6),
            receipt.recipient,
            receipt.destination_chain_id
        ),
        format!("  relayer   {}", "pending; the bridge relayer completes delivery".yellow()),
    ]
    .join("\n")
}

pub fn render_history(records: &[TransactionRecord]) -> String {
    if records.is_empty() {
        return format!("{} {}", "History:".bold(), "no transactions".dimmed());
    }
    let mut lines = vec![format!("{}", "History".bold())];
    for record in records {
        let status = match record.status {
            TransactionStatus::Pending => "pending".yellow(),
            TransactionStatus::Completed => "completed".green(),
            TransactionStatus::Failed => "failed".red(),
        };
        lines.push(format!(
            "  {} {:?} {} ({} -> {}) {}",
            record.timestamp.format("%H:%M:%S"),
            record.kind,
            record.amount,
            record.from,
            record.to,
            status
        ));
    }
    lines.join("\n")
}
