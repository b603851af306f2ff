use crate::core::quotes::RouteTable;
use crate::core::swap::ConfirmationPolicy;
use crate::core::wallet::RetryPolicy;
use crate::domain::entities::{NetworkInfo, PegRatio, TokenCatalogue, TokenInfo};
use crate::infrastructure::blockchain::ContractAddresses;
use crate::shared::constants::*;
use crate::shared::types::Address;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "jefe-bridge.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractConfig {
    pub jefe_token: String,
    pub router: String,
    pub bridge: String,
    pub usdc_source: String,
    pub wrapped_native: String,
    pub usdc_destination: String,
    pub weth: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            jefe_token: JEFE_TOKEN.to_string(),
            router: SPOOKY_ROUTER.to_string(),
            bridge: MULTICHAIN_BRIDGE.to_string(),
            usdc_source: USDC_FANTOM.to_string(),
            wrapped_native: WFTM.to_string(),
            usdc_destination: USDC_ETHEREUM.to_string(),
            weth: WETH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceConfig {
    pub peg_ratio: f64,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub fallback_price_usd: f64,
    pub coingecko_url: String,
    pub coinbase_url: String,
    pub binance_url: String,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            peg_ratio: DEFAULT_PEG_RATIO,
            poll_interval_secs: PRICE_POLL_INTERVAL_SECS,
            request_timeout_secs: PRICE_REQUEST_TIMEOUT_SECS,
            fallback_price_usd: FALLBACK_REFERENCE_PRICE_USD,
            coingecko_url: COINGECKO_BASE_URL.to_string(),
            coinbase_url: COINBASE_BASE_URL.to_string(),
            binance_url: BINANCE_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwapConfig {
    pub slippage_bps: u32,
    pub deadline_secs: u64,
    pub required_confirmations: u64,
    pub confirmation_poll_interval_ms: u64,
    pub confirmation_max_wait_secs: u64,
    pub progress_reset_delay_ms: u64,
    pub recipients: Vec<String>,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            deadline_secs: SWAP_DEADLINE_SECS,
            required_confirmations: REQUIRED_CONFIRMATIONS,
            confirmation_poll_interval_ms: CONFIRMATION_POLL_INTERVAL_MS,
            confirmation_max_wait_secs: CONFIRMATION_MAX_WAIT_SECS,
            progress_reset_delay_ms: PROGRESS_RESET_DELAY_MS,
            recipients: DEFAULT_RECIPIENTS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MobileConfig {
    pub initial_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for MobileConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: MOBILE_INITIAL_DELAY_MS,
            poll_interval_ms: MOBILE_POLL_INTERVAL_MS,
            max_attempts: MOBILE_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    pub source_network: NetworkInfo,
    pub destination_network: NetworkInfo,
    /// JSON-RPC endpoint of a wallet application, when one is used instead of a raw key
    pub wallet_rpc_url: Option<String>,
    pub contracts: ContractConfig,
    pub prices: PriceConfig,
    pub swap: SwapConfig,
    pub mobile: MobileConfig,
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            source_network: NetworkInfo::fantom(),
            destination_network: NetworkInfo::ethereum(),
            wallet_rpc_url: None,
            contracts: ContractConfig::default(),
            prices: PriceConfig::default(),
            swap: SwapConfig::default(),
            mobile: MobileConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Result<Self> {
        // Load environment variables
        dotenv::dotenv().ok();

        let config_file = Self::validate_and_get_env_var("CONFIG_FILE", DEFAULT_CONFIG_FILE, false)?;

        // Try to load from config file first
        let config = if Path::new(&config_file).exists() {
            Self::load_from_file(&config_file)?
        } else {
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config
        };

        config.validate()?;

        Ok(config)
    }

    pub fn load_from_file(file_path: &str) -> Result<Self> {
        let content = fs::read_to_string(file_path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", file_path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to deserialize config: {}", e))
    }

    pub fn save_to_file(&self, file_path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;
        fs::write(file_path, content)
            .map_err(|e| anyhow!("Failed to write config file: {}", e))?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup; empty values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = get("FANTOM_RPC_URL") {
            self.source_network.rpc_url = url;
        }
        if let Some(url) = get("ETHEREUM_RPC_URL") {
            self.destination_network.rpc_url = url;
        }
        if let Some(url) = get("WALLET_RPC_URL") {
            self.wallet_rpc_url = Some(url);
        }
        if let Some(ratio) = get("PEG_RATIO") {
            self.prices.peg_ratio = f64::from_str(ratio.trim())
                .map_err(|e| anyhow!("Invalid PEG_RATIO '{}': {}", ratio, e))?;
        }
        if let Some(bps) = get("SLIPPAGE_BPS") {
            self.swap.slippage_bps = u32::from_str(bps.trim())
                .map_err(|e| anyhow!("Invalid SLIPPAGE_BPS '{}': {}", bps, e))?;
        }
        if let Some(secs) = get("PRICE_POLL_SECS") {
            self.prices.poll_interval_secs = u64::from_str(secs.trim())
                .map_err(|e| anyhow!("Invalid PRICE_POLL_SECS '{}': {}", secs, e))?;
        }
        if let Some(confirmations) = get("REQUIRED_CONFIRMATIONS") {
            self.swap.required_confirmations = u64::from_str(confirmations.trim())
                .map_err(|e| anyhow!("Invalid REQUIRED_CONFIRMATIONS '{}': {}", confirmations, e))?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    /// Validates if a string is a valid hex address (0x followed by 40 hex characters)
    pub fn is_valid_hex_address(address: &str) -> bool {
        crate::shared::utils::is_valid_hex_address(address)
    }

    /// Validates environment variables and provides fallback values
    pub fn validate_and_get_env_var(key: &str, fallback: &str, required: bool) -> Result<String> {
        match env::var(key) {
            Ok(value) => {
                if value.is_empty() {
                    if required {
                        return Err(anyhow!("Environment variable {} is required but empty", key));
                    }
                    Ok(fallback.to_string())
                } else {
                    Ok(value)
                }
            }
            Err(_) => {
                if required {
                    return Err(anyhow!("Required environment variable {} is not set", key));
                }
                Ok(fallback.to_string())
            }
        }
    }

    /// Every problem with the configuration, empty when valid
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let addresses = [
            ("jefe_token", &self.contracts.jefe_token),
            ("router", &self.contracts.router),
            ("bridge", &self.contracts.bridge),
            ("usdc_source", &self.contracts.usdc_source),
            ("wrapped_native", &self.contracts.wrapped_native),
            ("usdc_destination", &self.contracts.usdc_destination),
            ("weth", &self.contracts.weth),
        ];
        for (name, address) in addresses {
            if !Self::is_valid_hex_address(address) {
                errors.push(format!(
                    "Invalid {} address: '{}'. Expected format: 0x followed by 40 hex characters",
                    name, address
                ));
            }
        }

        for recipient in &self.swap.recipients {
            if !Self::is_valid_hex_address(recipient) {
                errors.push(format!("Invalid recipient address: '{}'", recipient));
            }
        }

        for network in [&self.source_network, &self.destination_network] {
            if network.rpc_url.trim().is_empty() {
                errors.push(format!(
                    "RPC URL is required for chain {} ({})",
                    network.chain_id, network.name
                ));
            }
        }

        if !self.prices.peg_ratio.is_finite() || self.prices.peg_ratio <= 0.0 {
            errors.push(format!(
                "Peg ratio must be greater than 0, got {}",
                self.prices.peg_ratio
            ));
        }
        if self.prices.poll_interval_secs == 0 {
            errors.push("Price poll interval must be at least 1 second".to_string());
        }
        if self.prices.request_timeout_secs == 0 {
            errors.push("Price request timeout must be at least 1 second".to_string());
        }
        if self.swap.deadline_secs == 0 || self.swap.deadline_secs > MAX_SWAP_DEADLINE_SECS {
            errors.push(format!(
                "Swap deadline must be between 1 and {} seconds, got {}",
                MAX_SWAP_DEADLINE_SECS, self.swap.deadline_secs
            ));
        }
        if self.swap.confirmation_poll_interval_ms == 0 {
            errors.push("Confirmation poll interval must be at least 1 ms".to_string());
        }
        if self.swap.confirmation_max_wait_secs == 0 {
            errors.push("Confirmation wait must be at least 1 second".to_string());
        }
        if self.swap.slippage_bps >= BPS_DENOMINATOR {
            errors.push(format!(
                "Slippage must be below {} bps, got {}",
                BPS_DENOMINATOR, self.swap.slippage_bps
            ));
        }
        if self.mobile.max_attempts == 0 {
            errors.push("Mobile attach attempts must be at least 1".to_string());
        }
        if self.mobile.poll_interval_ms == 0 {
            errors.push("Mobile attach poll interval must be at least 1 ms".to_string());
        }

        errors
    }

    pub fn validate(&self) -> Result<()> {
        let errors = self.validation_errors();
        if !errors.is_empty() {
            return Err(anyhow!("Configuration validation failed:\n{}", errors.join("\n")));
        }
        Ok(())
    }

    fn address(value: &str, name: &str) -> Result<Address> {
        if !Self::is_valid_hex_address(value) {
            return Err(anyhow!("Invalid {} address: '{}'", name, value));
        }
        Address::from_str(value).map_err(|e| anyhow!("Invalid {} address '{}': {}", name, value, e))
    }

    pub fn peg_ratio(&self) -> Result<PegRatio> {
        PegRatio::new(self.prices.peg_ratio).map_err(|e| anyhow!(e.to_string()))
    }

    pub fn contract_addresses(&self) -> Result<ContractAddresses> {
        Ok(ContractAddresses {
            router: Self::address(&self.contracts.router, "router")?,
            bridge: Self::address(&self.contracts.bridge, "bridge")?,
        })
    }

    pub fn catalogue(&self) -> Result<TokenCatalogue> {
        let source = self.source_network.chain_id;
        let destination = self.destination_network.chain_id;
        Ok(TokenCatalogue {
            jefe: TokenInfo::new(
                "JEFE",
                Self::address(&self.contracts.jefe_token, "jefe_token")?,
                JEFE_DECIMALS,
                source,
            ),
            usdc_source: TokenInfo::new(
                "USDC",
                Self::address(&self.contracts.usdc_source, "usdc_source")?,
                USDC_DECIMALS,
                source,
            ),
            wrapped_native: TokenInfo::new(
                "WFTM",
                Self::address(&self.contracts.wrapped_native, "wrapped_native")?,
                NATIVE_DECIMALS,
                source,
            ),
            usdc_destination: TokenInfo::new(
                "USDC",
                Self::address(&self.contracts.usdc_destination, "usdc_destination")?,
                USDC_DECIMALS,
                destination,
            ),
            weth: TokenInfo::new(
                "WETH",
                Self::address(&self.contracts.weth, "weth")?,
                NATIVE_DECIMALS,
                destination,
            ),
        })
    }

    pub fn route_table(&self) -> Result<RouteTable> {
        let catalogue = self.catalogue()?;
        Ok(RouteTable::new(catalogue.wrapped_native.address)
            .with_preferred_hop(catalogue.jefe.address, catalogue.usdc_source.address)
            .with_direct_pair(catalogue.jefe.address, catalogue.usdc_source.address))
    }

    pub fn recipients(&self) -> Result<Vec<Address>> {
        self.swap
            .recipients
            .iter()
            .map(|recipient| Self::address(recipient, "recipient"))
            .collect()
    }

    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            required_confirmations: self.swap.required_confirmations.max(1),
            poll_interval: Duration::from_millis(self.swap.confirmation_poll_interval_ms),
            max_wait: Duration::from_secs(self.swap.confirmation_max_wait_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(self.mobile.initial_delay_ms),
            interval: Duration::from_millis(self.mobile.poll_interval_ms),
            max_attempts: self.mobile.max_attempts,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.prices.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.prices.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = BridgeConfig::default();
        assert!(config.validation_errors().is_empty(), "{:?}", config.validation_errors());
        assert_eq!(config.source_network.chain_id, 250);
        assert_eq!(config.destination_network.chain_id, 1);
        assert_eq!(config.swap.slippage_bps, 500);
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let mut config = BridgeConfig::default();
        config.contracts.bridge = "0x6b7a87899490EcE95443e979cA9485CBE7E7152".to_string();
        config.source_network.rpc_url = String::new();
        config.prices.peg_ratio = 0.0;
        config.swap.slippage_bps = 10_000;

        let errors = config.validation_errors();
        assert_eq!(errors.len(), 4, "{:?}", errors);
        assert!(config.validate().unwrap_err().to_string().contains("Invalid bridge address"));
    }

    #[test]
    fn test_validation_rejects_degenerate_timings() {
        let mut config = BridgeConfig::default();
        config.prices.request_timeout_secs = 0;
        config.swap.confirmation_poll_interval_ms = 0;
        config.swap.confirmation_max_wait_secs = 0;
        config.swap.deadline_secs = u64::MAX;
        config.mobile.poll_interval_ms = 0;

        let errors = config.validation_errors();
        assert_eq!(errors.len(), 5, "{:?}", errors);
        assert!(errors.iter().any(|e| e.starts_with("Swap deadline must be between 1 and 86400")));

        config.swap.deadline_secs = 0;
        assert_eq!(config.validation_errors().len(), 5);
        config.swap.deadline_secs = MAX_SWAP_DEADLINE_SECS;
        assert_eq!(config.validation_errors().len(), 4);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FANTOM_RPC_URL", "http://localhost:8545"),
            ("PEG_RATIO", "0.25"),
            ("SLIPPAGE_BPS", "100"),
            ("PRICE_POLL_SECS", "5"),
            ("REQUIRED_CONFIRMATIONS", "3"),
            ("LOG_LEVEL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = BridgeConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.source_network.rpc_url, "http://localhost:8545");
        assert_eq!(config.peg_ratio().unwrap().value(), 0.25);
        assert_eq!(config.swap.slippage_bps, 100);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.confirmation_policy().required_confirmations, 3);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let mut config = BridgeConfig::default();
        let result = config.apply_overrides(|key| (key == "SLIPPAGE_BPS").then(|| "lots".to_string()));
        assert!(result.unwrap_err().to_string().contains("SLIPPAGE_BPS"));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jefe-bridge.json");
        let path = path.to_str().unwrap();

        let mut config = BridgeConfig::default();
        config.prices.peg_ratio = 0.5;
        config.wallet_rpc_url = Some("http://127.0.0.1:1248".to_string());
        config.save_to_file(path).unwrap();

        let loaded = BridgeConfig::load_from_file(path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"{ not json").unwrap();
        let err = BridgeConfig::load_from_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("Failed to deserialize config"));
    }

    #[test]
    fn test_derived_values() {
        let config = BridgeConfig::default();
        let catalogue = config.catalogue().unwrap();
        assert_eq!(catalogue.usdc_source.decimals, 6);
        assert_eq!(catalogue.usdc_destination.chain_id, 1);
        assert_eq!(config.recipients().unwrap().len(), 2);
        assert_eq!(config.retry_policy().max_attempts, 30);

        let route = config
            .route_table()
            .unwrap()
            .path(catalogue.jefe.address, catalogue.weth.address);
        assert_eq!(route.len(), 3);
    }

    #[test]
    fn test_default_routes_swap_jefe_straight_into_usdc() {
        let config = BridgeConfig::default();
        let catalogue = config.catalogue().unwrap();
        let routes = config.route_table().unwrap();

        assert_eq!(
            routes.path(catalogue.jefe.address, catalogue.usdc_source.address),
            vec![catalogue.jefe.address, catalogue.usdc_source.address]
        );
        assert_eq!(
            routes.path(catalogue.usdc_source.address, catalogue.jefe.address),
            vec![catalogue.usdc_source.address, catalogue.jefe.address]
        );
    }

    #[test]
    fn test_validate_and_get_env_var() {
        let result = BridgeConfig::validate_and_get_env_var("JEFE_BRIDGE_NONEXISTENT_VAR", "fallback", false);
        assert_eq!(result.unwrap(), "fallback");

        let result = BridgeConfig::validate_and_get_env_var("JEFE_BRIDGE_NONEXISTENT_VAR", "fallback", true);
        assert!(result.is_err());
    }
}
