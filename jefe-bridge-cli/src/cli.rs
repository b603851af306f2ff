use clap::{Parser, Subcommand, ValueEnum};
use jefe_bridge_core::core::wallet::{HttpWalletProvider, MobileWallet};
use jefe_bridge_core::shared::types::WalletKind;
use jefe_bridge_core::{BridgeConfig, ConnectRequest};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[clap(
    name = "jefe-bridge",
    version,
    about = "Swap JEFE to USDC on Fantom and bridge it to Ethereum",
    rename_all = "kebab-case"
)]
pub struct Args {
    /// JSON configuration file; defaults to CONFIG_FILE or jefe-bridge.json
    #[clap(long = "config-file", global = true)]
    pub config_file: Option<PathBuf>,
    #[clap(flatten)]
    pub wallet: WalletArgs,
    #[clap(subcommand)]
    pub command: BridgeCommand,
}

#[derive(clap::Args, Clone, Default)]
pub struct WalletArgs {
    /// 0x-prefixed hex key, signed locally
    #[clap(long = "private-key", env = "JEFE_PRIVATE_KEY", hide_env_values = true, global = true)]
    pub private_key: Option<String>,
    /// JSON-RPC endpoint of a wallet application holding the keys
    #[clap(long = "wallet-rpc-url", global = true)]
    pub wallet_rpc_url: Option<String>,
    #[clap(long = "wallet", value_enum, default_value = "metamask", global = true)]
    pub wallet: WalletChoice,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WalletChoice {
    #[default]
    #[value(name = "metamask")]
    MetaMask,
    #[value(name = "coinbase")]
    Coinbase,
}

impl WalletChoice {
    pub fn kind(self) -> WalletKind {
        match self {
            WalletChoice::MetaMask => WalletKind::MetaMask,
            WalletChoice::Coinbase => WalletKind::Coinbase,
        }
    }

    pub fn mobile(self) -> MobileWallet {
        match self {
            WalletChoice::MetaMask => MobileWallet::MetaMask,
            WalletChoice::Coinbase => MobileWallet::Coinbase,
        }
    }
}

#[derive(Subcommand)]
#[clap(rename_all = "kebab-case")]
pub enum BridgeCommand {
    /// Reference and pegged prices
    #[clap(name = "prices")]
    Prices {
        /// Keep polling and re-render on every new snapshot
        #[clap(long = "watch")]
        watch: bool,
        #[clap(long = "peg-ratio")]
        peg_ratio: Option<f64>,
    },
    /// Balances of the connected wallet on both chains
    #[clap(name = "balances")]
    Balances,
    /// Router quote for a JEFE amount
    #[clap(name = "quote")]
    Quote { amount: String },
    /// Swap JEFE to USDC and bridge it to Ethereum
    #[clap(name = "swap")]
    Swap {
        amount: String,
        /// Destination address; the first configured recipient when omitted
        #[clap(long = "recipient")]
        recipient: Option<String>,
    },
    /// Link that opens a dapp inside a mobile wallet
    #[clap(name = "deep-link")]
    DeepLink {
        #[clap(value_enum)]
        wallet: WalletChoice,
        dapp_url: String,
    },
    /// Guess the mobile wallet from a user agent
    #[clap(name = "detect-wallet")]
    DetectWallet {
        user_agent: String,
        #[clap(long = "is-metamask")]
        is_metamask: bool,
        #[clap(long = "is-coinbase-wallet")]
        is_coinbase_wallet: bool,
    },
    /// Print the effective configuration
    #[clap(name = "config")]
    Config {
        /// Also write it to this file
        #[clap(long = "save")]
        save: Option<PathBuf>,
    },
}

impl WalletArgs {
    /// Connection request from the flags, falling back to the configured wallet endpoint
    pub fn connect_request(&self, config: &BridgeConfig) -> anyhow::Result<Option<ConnectRequest>> {
        if let Some(key) = self.private_key.as_deref().filter(|key| !key.trim().is_empty()) {
            return Ok(Some(ConnectRequest::private_key(key.trim())));
        }

        let url = self
            .wallet_rpc_url
            .as_deref()
            .or(config.wallet_rpc_url.as_deref())
            .filter(|url| !url.trim().is_empty());
        match url {
            Some(url) => {
                let provider = HttpWalletProvider::connect(url, self.wallet.kind())?;
                Ok(Some(ConnectRequest::Injected(Arc::new(provider))))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_swap_command() {
        let args = Args::try_parse_from([
            "jefe-bridge",
            "swap",
            "12.5",
            "--recipient",
            "0x3b80a92F4c4c99A4d561F289DFD307c4d5f811cD",
            "--wallet",
            "coinbase",
        ])
        .unwrap();
        match args.command {
            BridgeCommand::Swap { amount, recipient } => {
                assert_eq!(amount, "12.5");
                assert!(recipient.is_some());
            }
            _ => panic!("expected swap"),
        }
        assert_eq!(args.wallet.wallet, WalletChoice::Coinbase);
    }

    #[test]
    fn test_parse_deep_link_command() {
        let args = Args::try_parse_from(["jefe-bridge", "deep-link", "metamask", "https://jefe.example/app"]).unwrap();
        assert!(matches!(
            args.command,
            BridgeCommand::DeepLink {
                wallet: WalletChoice::MetaMask,
                ..
            }
        ));
    }

    #[test]
    fn test_private_key_wins_over_wallet_endpoint() {
        let args = WalletArgs {
            private_key: Some(format!("0x{}", "1".repeat(64))),
            wallet_rpc_url: Some("http://localhost:8545".to_string()),
            wallet: WalletChoice::MetaMask,
        };
        let request = args.connect_request(&BridgeConfig::default()).unwrap();
        assert!(matches!(request, Some(ConnectRequest::PrivateKey(_))));
    }

    #[test]
    fn test_no_credentials_means_no_request() {
        let request = WalletArgs::default().connect_request(&BridgeConfig::default()).unwrap();
        assert!(request.is_none());
    }
}
