pub mod blockchain;
pub mod config;

pub use config::BridgeConfig;
