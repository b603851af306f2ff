use crate::cli::{Args, BridgeCommand, WalletArgs, WalletChoice};
use crate::presentation::render::{
    render_balances, render_history, render_prices, render_quote, render_receipt, render_wallet,
};
use crate::presentation::Dashboard;
use anyhow::{anyhow, Result};
use colored::*;
use jefe_bridge_core::core::prices::spawn_poller;
use jefe_bridge_core::core::wallet::{detect_mobile_wallet, InjectedFlags};
use jefe_bridge_core::shared::utils::parse_address;
use jefe_bridge_core::{Address, BridgeClient, BridgeConfig, PegRatio, SwapRequest};
use log::{info, warn};
use std::future::Future;
use std::path::Path;
use tokio::sync::{oneshot, watch};

/// Configuration from `--config-file`, or the usual `.env`/file/defaults chain
pub fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    match path {
        Some(path) => {
            let config = BridgeConfig::load_from_file(&path.to_string_lossy())?;
            config.validate()?;
            Ok(config)
        }
        None => BridgeConfig::new(),
    }
}

/// `--recipient` when given, else the first configured recipient
pub fn resolve_recipient(recipient: Option<&str>, config: &BridgeConfig) -> Result<Address> {
    match recipient {
        Some(recipient) => {
            parse_address(recipient).ok_or_else(|| anyhow!("Invalid recipient address: '{}'", recipient))
        }
        None => config
            .recipients()?
            .first()
            .copied()
            .ok_or_else(|| anyhow!("No recipient given and none configured")),
    }
}

fn ctrl_c() -> impl Future<Output = ()> {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

pub async fn run(args: Args, config: BridgeConfig) -> Result<()> {
    match args.command {
        BridgeCommand::DeepLink { wallet, dapp_url } => deep_link(wallet, &dapp_url),
        BridgeCommand::DetectWallet {
            user_agent,
            is_metamask,
            is_coinbase_wallet,
        } => {
            detect_wallet(&user_agent, is_metamask, is_coinbase_wallet);
            Ok(())
        }
        BridgeCommand::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if let Some(path) = save {
                config.save_to_file(&path.to_string_lossy())?;
                println!("{} {}", "Saved to".green(), path.display());
            }
            Ok(())
        }
        command => {
            let client = BridgeClient::new(config)?;
            match command {
                BridgeCommand::Prices { watch, peg_ratio } => prices(&client, watch, peg_ratio).await,
                BridgeCommand::Balances => balances(&client, &args.wallet).await,
                BridgeCommand::Quote { amount } => quote(&client, &amount).await,
                BridgeCommand::Swap { amount, recipient } => {
                    swap(&client, &args.wallet, &amount, recipient.as_deref()).await
                }
                _ => Ok(()),
            }
        }
    }
}

async fn connect(client: &BridgeClient, wallet: &WalletArgs) -> Result<()> {
    let request = wallet
        .connect_request(client.config())?
        .ok_or_else(|| anyhow!("No wallet configured: pass --private-key or --wallet-rpc-url"))?;
    let summary = client.connect(request).await?;
    println!("{}", render_wallet(Some(&summary)));
    Ok(())
}

async fn prices(client: &BridgeClient, watch: bool, peg_ratio: Option<f64>) -> Result<()> {
    let ratio = match peg_ratio {
        Some(ratio) => PegRatio::new(ratio)?,
        None => client.config().peg_ratio()?,
    };

    if !watch {
        let snapshot = client.price_aggregator().snapshot(ratio).await;
        println!("{}", render_prices(&snapshot));
        return Ok(());
    }

    let poller = spawn_poller(client.price_aggregator(), ratio, client.config().poll_interval());
    info!("Watching prices every {:?}; Ctrl-C to stop", client.config().poll_interval());
    Dashboard::new(
        client.session().subscribe(),
        poller.subscribe(),
        client.orchestrator().progress().subscribe(),
    )
    .clear_screen(true)
    .run(std::io::stdout(), ctrl_c())
    .await?;
    poller.stop();
    Ok(())
}

async fn balances(client: &BridgeClient, wallet: &WalletArgs) -> Result<()> {
    connect(client, wallet).await?;
    let balances = client.refresh_balances().await?;
    println!("{}", render_balances(&balances));
    Ok(())
}

async fn quote(client: &BridgeClient, amount: &str) -> Result<()> {
    let prices = client.price_snapshot().await.ok();
    let outcome = client.quote(amount, prices.as_ref()).await;
    println!("{}", render_quote(amount, &outcome, prices.as_ref()));

    match client.gas_price_gwei().await {
        Ok(gwei) => println!("{} {} gwei", "Gas price:".bold(), gwei),
        Err(e) => warn!("Gas price unavailable: {}", e),
    }
    Ok(())
}

async fn swap(client: &BridgeClient, wallet: &WalletArgs, amount: &str, recipient: Option<&str>) -> Result<()> {
    let recipient = resolve_recipient(recipient, client.config())?;
    connect(client, wallet).await?;

    let prices = client.price_snapshot().await.ok();
    let outcome = client.quote(amount, prices.as_ref()).await;
    println!("{}", render_quote(amount, &outcome, prices.as_ref()));

    let (_prices_tx, prices_rx) = watch::channel(prices);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let dashboard = tokio::spawn(
        Dashboard::new(
            client.session().subscribe(),
            prices_rx,
            client.orchestrator().progress().subscribe(),
        )
        .run(std::io::stdout(), async move {
            let _ = stop_rx.await;
        }),
    );

    let result = client
        .swap(SwapRequest {
            amount_in: amount.to_string(),
            recipient,
            estimated_output: outcome.expected_output(),
        })
        .await;

    let _ = stop_tx.send(());
    if let Err(e) = dashboard.await {
        warn!("Dashboard task ended abnormally: {}", e);
    }

    let outcome = match result {
        Ok(receipt) => {
            println!("{}", render_receipt(&receipt, &client.config().source_network));
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "Swap failed:".red().bold(), e);
            Err(e.into())
        }
    };
    println!("{}", render_history(&client.orchestrator().history().all().await));
    outcome
}

fn deep_link(wallet: WalletChoice, dapp_url: &str) -> Result<()> {
    let link = wallet.mobile().deep_link(dapp_url)?;
    println!("{link}");
    Ok(())
}

fn detect_wallet(user_agent: &str, is_metamask: bool, is_coinbase_wallet: bool) {
    let flags = InjectedFlags {
        is_metamask,
        is_coinbase_wallet,
    };
    match detect_mobile_wallet(user_agent, flags) {
        Some(wallet) => println!("{} {}", "Mobile wallet:".bold(), wallet),
        None => println!("{} {}", "Mobile wallet:".bold(), "not a mobile browser".dimmed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_recipient_defaults_to_first_configured() {
        let config = BridgeConfig::default();
        let recipient = resolve_recipient(None, &config).unwrap();
        assert_eq!(recipient, config.recipients().unwrap()[0]);

        let explicit = resolve_recipient(Some("0x2dFB4845d9cc2DBD3CcA9bFAC34989796042d616"), &config).unwrap();
        assert_eq!(explicit, config.recipients().unwrap()[1]);

        assert!(resolve_recipient(Some("0x12"), &config).is_err());
    }

    #[test]
    fn test_no_recipient_anywhere_is_an_error() {
        let mut config = BridgeConfig::default();
        config.swap.recipients.clear();
        assert!(resolve_recipient(None, &config).is_err());
    }

    #[test]
    fn test_config_file_is_validated() {
        let mut config = BridgeConfig::default();
        config.prices.peg_ratio = 0.0;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&config).unwrap()).unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Peg ratio"));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jefe-bridge.json");
        let mut config = BridgeConfig::default();
        config.swap.slippage_bps = 100;
        config.save_to_file(&path.to_string_lossy()).unwrap();

        assert_eq!(load_config(Some(path.as_path())).unwrap(), config);
    }
}
