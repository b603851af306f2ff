//! JEFE Bridge Core
//!
//! Client library for swapping JEFE to USDC on Fantom and bridging the USDC
//! to Ethereum.
//!
//! ## Architecture
//!
//! - **Core**: wallet connector, price aggregator, quote fetcher and the
//!   swap/bridge orchestrator
//! - **Domain**: transient entities (wallet state, price snapshots, quotes, progress)
//! - **Infrastructure**: ethers-backed chain gateway and configuration
//! - **Shared**: common types, constants, errors and helpers
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jefe_bridge_core::{init_bridge_client, ConnectRequest};
//!
//! # async fn run() -> Result<(), jefe_bridge_core::BridgeError> {
//! let client = init_bridge_client().await?;
//! let wallet = client.connect(ConnectRequest::private_key("0x...")).await?;
//! let prices = client.price_snapshot().await?;
//! let outcome = client.quote("100", Some(&prices)).await;
//! println!("{} JEFE -> {:?} USDC", wallet.short_address(), outcome.expected_output());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod shared;

use crate::core::prices::{spawn_poller, PollerHandle, PriceAggregator};
use crate::core::quotes::{gas_price_gwei, QuoteFetcher};
use crate::core::swap::{SwapOrchestrator, SwapSettings};
use crate::core::wallet::{BalanceLoader, WalletConnector, WalletSession};
use crate::infrastructure::blockchain::{ChainReader, ContractAddresses, EvmGateway, EvmReader};
use ethers::providers::{Http, Provider};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

pub use crate::core::wallet::ConnectRequest;
pub use crate::domain::entities::{
    PegRatio, PriceSnapshot, QuoteOutcome, SwapProgress, SwapReceipt, SwapRequest, TokenCatalogue,
    WalletSummary,
};
pub use crate::infrastructure::config::BridgeConfig;
pub use crate::shared::error::{BridgeError, ConnectionError};
pub use crate::shared::types::{Address, Asset, Balances, TransactionHash, U256};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Load configuration from `.env`, the config file or defaults, and build the client
pub async fn init_bridge_client() -> Result<BridgeClient, BridgeError> {
    let config = BridgeConfig::new()?;
    BridgeClient::new(config)
}

/// All components wired to one configuration
pub struct BridgeClient {
    config: BridgeConfig,
    catalogue: TokenCatalogue,
    contracts: ContractAddresses,
    session: WalletSession,
    prices: Arc<PriceAggregator>,
    quotes: QuoteFetcher,
    source: Arc<EvmReader<Provider<Http>>>,
    orchestrator: SwapOrchestrator,
}

impl BridgeClient {
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        config.validate()?;

        let catalogue = config.catalogue()?;
        let contracts = config.contract_addresses()?;
        let routes = config.route_table()?;

        let source = Arc::new(EvmReader::connect(&config.source_network.rpc_url)?);
        let destination = Arc::new(EvmReader::connect(&config.destination_network.rpc_url)?);
        let balances = BalanceLoader::new(
            source.clone(),
            destination,
            catalogue.jefe.clone(),
            catalogue.usdc_destination.clone(),
        );
        let connector = WalletConnector::new(config.source_network.clone(), balances, config.retry_policy());

        let router = EvmGateway::read_only(&config.source_network.rpc_url, contracts)?;
        let quotes = QuoteFetcher::new(Arc::new(router), routes.clone());

        let settings = SwapSettings {
            slippage_bps: config.swap.slippage_bps,
            deadline: Duration::from_secs(config.swap.deadline_secs),
            destination_chain_id: config.destination_network.chain_id,
            reset_delay: Duration::from_millis(config.swap.progress_reset_delay_ms),
            confirmation: config.confirmation_policy(),
        };

        info!(
            "Bridge client ready: {} ({}) -> {} ({})",
            config.source_network.name,
            config.source_network.chain_id,
            config.destination_network.name,
            config.destination_network.chain_id
        );

        Ok(Self {
            prices: Arc::new(PriceAggregator::from_config(&config)?),
            session: WalletSession::new(connector),
            orchestrator: SwapOrchestrator::new(routes, settings),
            quotes,
            source,
            catalogue,
            contracts,
            config,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn catalogue(&self) -> &TokenCatalogue {
        &self.catalogue
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn orchestrator(&self) -> &SwapOrchestrator {
        &self.orchestrator
    }

    pub fn price_aggregator(&self) -> Arc<PriceAggregator> {
        self.prices.clone()
    }

    pub async fn connect(&self, request: ConnectRequest) -> Result<WalletSummary, BridgeError> {
        Ok(self.session.connect(request).await?)
    }

    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    pub async fn refresh_balances(&self) -> Result<Balances, BridgeError> {
        Ok(self.session.refresh_balances().await?)
    }

    /// One price snapshot at the configured peg ratio
    pub async fn price_snapshot(&self) -> Result<PriceSnapshot, BridgeError> {
        let ratio = self.config.peg_ratio()?;
        Ok(self.prices.snapshot(ratio).await)
    }

    /// Background price polling at the configured interval
    pub fn spawn_price_poller(&self) -> Result<PollerHandle, BridgeError> {
        let ratio = self.config.peg_ratio()?;
        Ok(spawn_poller(self.prices.clone(), ratio, self.config.poll_interval()))
    }

    /// JEFE to source-chain USDC quote, estimated from `prices` when the router cannot answer
    pub async fn quote(&self, amount_in: &str, prices: Option<&PriceSnapshot>) -> QuoteOutcome {
        self.quotes
            .quote_or_estimate(&self.catalogue.jefe, &self.catalogue.usdc_source, amount_in, prices)
            .await
    }

    pub async fn gas_price_gwei(&self) -> Result<String, BridgeError> {
        Ok(gas_price_gwei(self.source.as_ref() as &dyn ChainReader).await?)
    }

    /// Swap JEFE to USDC and bridge it with the connected wallet
    pub async fn swap(&self, request: SwapRequest) -> Result<SwapReceipt, BridgeError> {
        let wallet = self.session.current().ok_or(ConnectionError::NotConnected)?;
        let backends = wallet.signer.backends(self.contracts);

        let receipt = self
            .orchestrator
            .execute(
                &backends,
                wallet.address,
                &self.catalogue.jefe,
                &self.catalogue.usdc_source,
                request,
            )
            .await?;

        if let Err(e) = self.session.refresh_balances().await {
            warn!("Balance refresh after swap failed: {}", e);
        }
        Ok(receipt)
    }
}
