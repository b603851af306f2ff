//! Constants for the bridge core
//!
//! Mainnet addresses and endpoints used when no configuration overrides them.

// Networks
pub const FANTOM_CHAIN_ID: u64 = 250;
pub const FANTOM_NAME: &str = "Fantom Opera";
pub const FANTOM_RPC_URL: &str = "https://rpc.ftm.tools/";
pub const FANTOM_EXPLORER: &str = "https://ftmscan.com";

pub const ETHEREUM_CHAIN_ID: u64 = 1;
pub const ETHEREUM_NAME: &str = "Ethereum Mainnet";
pub const ETHEREUM_RPC_URL: &str = "https://eth.llamarpc.com";
pub const ETHEREUM_EXPLORER: &str = "https://etherscan.io";

pub const NATIVE_DECIMALS: u8 = 18;

// Fantom contracts
pub const JEFE_TOKEN: &str = "0x5b2af7fd27e2ea14945c82dd254c79d3ed34685e";
pub const SPOOKY_ROUTER: &str = "0xF491e7B69E4244ad4002BC14e878a34207E38c29";
pub const MULTICHAIN_BRIDGE: &str = "0x6b7a87899490EcE95443e979cA9485CBE7E71522";
pub const USDC_FANTOM: &str = "0x04068DA6C83AFCFA0e13ba15A6696662335D5B75";
pub const WFTM: &str = "0x21be370D5312f44cB42ce377BC9b8a0cEF1A4C83";

// Ethereum contracts
pub const USDC_ETHEREUM: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
pub const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

pub const JEFE_DECIMALS: u8 = 18;
pub const USDC_DECIMALS: u8 = 6;

/// Default bridge recipients offered by the swap form
pub const DEFAULT_RECIPIENTS: &[&str] = &[
    "0x3b80a92F4c4c99A4d561F289DFD307c4d5f811cD",
    "0x2dFB4845d9cc2DBD3CcA9bFAC34989796042d616",
];

// Price feeds
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com";
pub const COINBASE_BASE_URL: &str = "https://api.coinbase.com";
pub const BINANCE_BASE_URL: &str = "https://api.binance.com";
pub const FALLBACK_REFERENCE_PRICE_USD: f64 = 3000.0;
pub const DEFAULT_PEG_RATIO: f64 = 1.0;
pub const PRICE_POLL_INTERVAL_SECS: u64 = 30;
pub const PRICE_REQUEST_TIMEOUT_SECS: u64 = 10;

// Swap
pub const DEFAULT_SLIPPAGE_BPS: u32 = 500;
pub const BPS_DENOMINATOR: u32 = 10_000;
pub const SWAP_DEADLINE_SECS: u64 = 20 * 60;
pub const MAX_SWAP_DEADLINE_SECS: u64 = 24 * 60 * 60;
pub const PROGRESS_RESET_DELAY_MS: u64 = 2_000;
pub const REQUIRED_CONFIRMATIONS: u64 = 1;
pub const CONFIRMATION_POLL_INTERVAL_MS: u64 = 1_500;
pub const CONFIRMATION_MAX_WAIT_SECS: u64 = 300;

// Mobile wallet attach polling
pub const MOBILE_INITIAL_DELAY_MS: u64 = 2_000;
pub const MOBILE_POLL_INTERVAL_MS: u64 = 1_000;
pub const MOBILE_MAX_ATTEMPTS: u32 = 30;

// Deep links
pub const METAMASK_DEEP_LINK_BASE: &str = "https://metamask.app.link/dapp/";
pub const COINBASE_DEEP_LINK_BASE: &str = "https://go.cb-w.com/dapp";

// Private keys
pub const PRIVATE_KEY_HEX_LENGTH: usize = 66;
