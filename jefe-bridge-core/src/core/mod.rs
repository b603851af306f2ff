//! Core components of the bridge client

pub mod prices;
pub mod quotes;
pub mod swap;
pub mod wallet;

pub use prices::PriceAggregator;
pub use quotes::{QuoteFetcher, RouteTable};
pub use swap::{SwapOrchestrator, SwapSettings};
pub use wallet::{WalletConnector, WalletSession};
