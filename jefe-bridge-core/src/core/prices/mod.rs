//! Price aggregator
//!
//! Averages the reference asset price over independent REST sources and
//! derives the pegged token price from an explicitly passed [`PegRatio`].

pub mod poller;
pub mod sources;

pub use poller::{spawn_poller, PollerHandle};
pub use sources::PriceSource;

use crate::domain::entities::{PegRatio, PriceOrigin, PriceSnapshot, SourcePrice};
use crate::infrastructure::config::BridgeConfig;
use crate::shared::error::PriceSourceError;
use futures::future::join_all;
use log::{debug, warn};
use sources::{binance::Binance, coin_gecko::CoinGecko, coinbase::Coinbase};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Arithmetic mean of the values that are present and positive
pub fn mean_of_valid(values: &[Option<f64>]) -> Option<f64> {
    let valid: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|value| value.is_finite() && *value > 0.0)
        .collect();
    if valid.is_empty() {
        return None;
    }
    Some(valid.iter().sum::<f64>() / valid.len() as f64)
}

pub struct PriceAggregator {
    sources: Vec<Arc<dyn PriceSource>>,
    last_known: RwLock<Option<f64>>,
    fallback_usd: f64,
}

impl PriceAggregator {
    pub fn new(sources: Vec<Arc<dyn PriceSource>>, fallback_usd: f64) -> Self {
        Self {
            sources,
            last_known: RwLock::new(None),
            fallback_usd,
        }
    }

    /// CoinGecko, Coinbase and Binance sharing one HTTP client
    pub fn from_config(config: &BridgeConfig) -> Result<Self, PriceSourceError> {
        let client = sources::http_client(config.request_timeout())?;
        let sources: Vec<Arc<dyn PriceSource>> = vec![
            Arc::new(CoinGecko::new(client.clone(), config.prices.coingecko_url.clone())),
            Arc::new(Coinbase::new(client.clone(), config.prices.coinbase_url.clone())),
            Arc::new(Binance::new(client, config.prices.binance_url.clone())),
        ];
        Ok(Self::new(sources, config.prices.fallback_price_usd))
    }

    pub async fn last_known(&self) -> Option<f64> {
        *self.last_known.read().await
    }

    /// Fetch every source concurrently; failing sources are left out of the mean
    pub async fn reference_price(&self) -> (f64, Vec<SourcePrice>, PriceOrigin) {
        let results = join_all(self.sources.iter().map(|source| async move {
            let result = source.fetch_usd().await;
            (source.kind(), result)
        }))
        .await;

        let prices: Vec<SourcePrice> = results
            .into_iter()
            .map(|(source, result)| {
                let usd = match result {
                    Ok(price) => Some(price),
                    Err(e) => {
                        warn!("{}", e);
                        None
                    }
                };
                SourcePrice { source, usd }
            })
            .collect();

        let values: Vec<Option<f64>> = prices.iter().map(|price| price.usd).collect();
        match mean_of_valid(&values) {
            Some(mean) => {
                let sources = values.iter().flatten().filter(|v| **v > 0.0).count();
                debug!("Reference price {:.2} USD from {} source(s)", mean, sources);
                *self.last_known.write().await = Some(mean);
                (mean, prices, PriceOrigin::Live { sources })
            }
            None => match *self.last_known.read().await {
                Some(cached) => {
                    warn!("All price sources failed, using cached {:.2} USD", cached);
                    (cached, prices, PriceOrigin::Cached)
                }
                None => {
                    warn!("All price sources failed, using fallback {:.2} USD", self.fallback_usd);
                    (self.fallback_usd, prices, PriceOrigin::Fallback)
                }
            },
        }
    }

    pub async fn snapshot(&self, peg_ratio: PegRatio) -> PriceSnapshot {
        let (reference, sources, origin) = self.reference_price().await;
        PriceSnapshot::new(reference, peg_ratio, sources, origin)
    }
}
