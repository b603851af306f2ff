//! Price entities: peg ratio and price snapshots

use crate::shared::constants::DEFAULT_PEG_RATIO;
use crate::shared::error::BridgeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many units of the reference asset one pegged token is worth
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "f64", into = "f64")]
pub struct PegRatio(f64);

impl PegRatio {
    pub fn new(ratio: f64) -> Result<Self, BridgeError> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(BridgeError::config(format!(
                "peg ratio must be a positive number, got {ratio}"
            )));
        }
        Ok(Self(ratio))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Pegged token price for a reference price
    pub fn apply(&self, reference_usd: f64) -> f64 {
        reference_usd * self.0
    }
}

impl Default for PegRatio {
    fn default() -> Self {
        Self(DEFAULT_PEG_RATIO)
    }
}

impl TryFrom<f64> for PegRatio {
    type Error = BridgeError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PegRatio> for f64 {
    fn from(ratio: PegRatio) -> Self {
        ratio.0
    }
}

impl fmt::Display for PegRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PriceSourceKind {
    CoinGecko,
    Coinbase,
    Binance,
}

impl fmt::Display for PriceSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceSourceKind::CoinGecko => "CoinGecko",
            PriceSourceKind::Coinbase => "Coinbase",
            PriceSourceKind::Binance => "Binance",
        };
        f.write_str(name)
    }
}

/// One source's comparison price; `None` when the source failed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourcePrice {
    pub source: PriceSourceKind,
    pub usd: Option<f64>,
}

/// Where the aggregate reference price came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PriceOrigin {
    Live { sources: usize },
    Cached,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSnapshot {
    pub reference_usd: f64,
    pub pegged_usd: f64,
    pub peg_ratio: PegRatio,
    pub sources: Vec<SourcePrice>,
    pub origin: PriceOrigin,
    pub fetched_at: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn new(
        reference_usd: f64,
        peg_ratio: PegRatio,
        sources: Vec<SourcePrice>,
        origin: PriceOrigin,
    ) -> Self {
        Self {
            reference_usd,
            pegged_usd: peg_ratio.apply(reference_usd),
            peg_ratio,
            sources,
            origin,
            fetched_at: Utc::now(),
        }
    }

    pub fn source_price(&self, source: PriceSourceKind) -> Option<f64> {
        self.sources
            .iter()
            .find(|price| price.source == source)
            .and_then(|price| price.usd)
    }

    /// USD price for a token symbol the snapshot can value
    pub fn usd_price_of(&self, symbol: &str) -> Option<f64> {
        match symbol.to_ascii_uppercase().as_str() {
            "JEFE" => Some(self.pegged_usd),
            "ETH" | "WETH" => Some(self.reference_usd),
            "USDC" => Some(1.0),
            _ => None,
        }
    }

    /// Fiat value of an amount of the pegged token
    pub fn fiat_value(&self, pegged_amount: f64) -> f64 {
        pegged_amount * self.pegged_usd
    }

    pub fn is_live(&self) -> bool {
        matches!(self.origin, PriceOrigin::Live { .. })
    }
}
