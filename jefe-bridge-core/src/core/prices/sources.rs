//! REST price sources for the reference asset (ETH/USD)

use crate::domain::entities::PriceSourceKind;
use crate::shared::error::PriceSourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn kind(&self) -> PriceSourceKind;

    /// Reference asset price in USD
    async fn fetch_usd(&self) -> Result<f64, PriceSourceError>;
}

pub fn http_client(timeout: Duration) -> Result<Client, PriceSourceError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PriceSourceError::new("http", e.to_string()))
}

async fn get_json<T: DeserializeOwned>(
    client: &Client,
    kind: PriceSourceKind,
    url: &str,
) -> Result<T, PriceSourceError> {
    let fail = |reason: String| PriceSourceError::new(kind.to_string(), reason);

    client
        .get(url)
        .send()
        .await
        .map_err(|e| fail(e.to_string()))?
        .error_for_status()
        .map_err(|e| fail(e.to_string()))?
        .json::<T>()
        .await
        .map_err(|e| fail(format!("unexpected response: {e}")))
}

fn positive(kind: PriceSourceKind, price: f64) -> Result<f64, PriceSourceError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(PriceSourceError::new(kind.to_string(), format!("invalid price {price}")))
    }
}

fn parse_price(kind: PriceSourceKind, raw: &str) -> Result<f64, PriceSourceError> {
    let price = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| PriceSourceError::new(kind.to_string(), format!("{raw}: {e}")))?;
    positive(kind, price)
}

pub mod coin_gecko {
    use super::*;

    /// `{"ethereum": {"usd": 3012.4}}`
    #[derive(Deserialize, Debug)]
    pub(super) struct CoinGeckoResponse {
        pub ethereum: HashMap<String, f64>,
    }

    pub struct CoinGecko {
        client: Client,
        base_url: String,
    }

    impl CoinGecko {
        pub fn new(client: Client, base_url: impl Into<String>) -> Self {
            Self {
                client,
                base_url: base_url.into(),
            }
        }

        pub(super) fn price_from(resp: CoinGeckoResponse) -> Result<f64, PriceSourceError> {
            let price = resp.ethereum.get("usd").copied().ok_or_else(|| {
                PriceSourceError::new(PriceSourceKind::CoinGecko.to_string(), "missing usd price")
            })?;
            positive(PriceSourceKind::CoinGecko, price)
        }
    }

    #[async_trait]
    impl PriceSource for CoinGecko {
        fn kind(&self) -> PriceSourceKind {
            PriceSourceKind::CoinGecko
        }

        async fn fetch_usd(&self) -> Result<f64, PriceSourceError> {
            let url = format!(
                "{}/api/v3/simple/price?ids=ethereum&vs_currencies=usd",
                self.base_url.trim_end_matches('/')
            );
            let resp = get_json::<CoinGeckoResponse>(&self.client, self.kind(), &url).await?;
            Self::price_from(resp)
        }
    }
}

pub mod coinbase {
    use super::*;

    /// `{"data": {"currency": "ETH", "rates": {"USD": "3012.40"}}}`
    #[derive(Deserialize, Debug)]
    pub(super) struct CoinbaseResponse {
        pub data: CoinbaseRates,
    }

    #[derive(Deserialize, Debug)]
    pub(super) struct CoinbaseRates {
        pub rates: HashMap<String, String>,
    }

    pub struct Coinbase {
        client: Client,
        base_url: String,
    }

    impl Coinbase {
        pub fn new(client: Client, base_url: impl Into<String>) -> Self {
            Self {
                client,
                base_url: base_url.into(),
            }
        }

        pub(super) fn price_from(resp: CoinbaseResponse) -> Result<f64, PriceSourceError> {
            let raw = resp.data.rates.get("USD").ok_or_else(|| {
                PriceSourceError::new(PriceSourceKind::Coinbase.to_string(), "missing USD rate")
            })?;
            parse_price(PriceSourceKind::Coinbase, raw)
        }
    }

    #[async_trait]
    impl PriceSource for Coinbase {
        fn kind(&self) -> PriceSourceKind {
            PriceSourceKind::Coinbase
        }

        async fn fetch_usd(&self) -> Result<f64, PriceSourceError> {
            let url = format!(
                "{}/v2/exchange-rates?currency=ETH",
                self.base_url.trim_end_matches('/')
            );
            let resp = get_json::<CoinbaseResponse>(&self.client, self.kind(), &url).await?;
            Self::price_from(resp)
        }
    }
}

pub mod binance {
    use super::*;

    /// `{"symbol": "ETHUSDT", "price": "3012.40000000"}`
    #[derive(Deserialize, Debug)]
    pub(super) struct BinanceTicker {
        pub price: String,
    }

    pub struct Binance {
        client: Client,
        base_url: String,
    }

    impl Binance {
        pub fn new(client: Client, base_url: impl Into<String>) -> Self {
            Self {
                client,
                base_url: base_url.into(),
            }
        }
    }

    #[async_trait]
    impl PriceSource for Binance {
        fn kind(&self) -> PriceSourceKind {
            PriceSourceKind::Binance
        }

        async fn fetch_usd(&self) -> Result<f64, PriceSourceError> {
            let url = format!(
                "{}/api/v3/ticker/price?symbol=ETHUSDT",
                self.base_url.trim_end_matches('/')
            );
            let ticker = get_json::<BinanceTicker>(&self.client, self.kind(), &url).await?;
            parse_price(PriceSourceKind::Binance, &ticker.price)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coingecko_response() {
        let resp = serde_json::from_str(r#"{"ethereum":{"usd":3012.4}}"#).unwrap();
        assert_eq!(coin_gecko::CoinGecko::price_from(resp).unwrap(), 3012.4);

        let resp = serde_json::from_str(r#"{"ethereum":{"eur":2800.0}}"#).unwrap();
        assert!(coin_gecko::CoinGecko::price_from(resp).is_err());

        let resp = serde_json::from_str(r#"{"ethereum":{"usd":0.0}}"#).unwrap();
        assert!(coin_gecko::CoinGecko::price_from(resp).is_err());
    }

    #[test]
    fn test_coinbase_response() {
        let resp = serde_json::from_str(
            r#"{"data":{"currency":"ETH","rates":{"USD":"3012.40","EUR":"2790.11"}}}"#,
        )
        .unwrap();
        assert_eq!(coinbase::Coinbase::price_from(resp).unwrap(), 3012.4);

        let resp = serde_json::from_str(r#"{"data":{"currency":"ETH","rates":{"USD":"n/a"}}}"#).unwrap();
        let err = coinbase::Coinbase::price_from(resp).unwrap_err();
        assert_eq!(err.source_name, "Coinbase");
    }

    #[test]
    fn test_binance_price_string() {
        let ticker: binance::BinanceTicker =
            serde_json::from_str(r#"{"symbol":"ETHUSDT","price":"3012.40000000"}"#).unwrap();
        assert_eq!(parse_price(PriceSourceKind::Binance, &ticker.price).unwrap(), 3012.4);
        assert!(parse_price(PriceSourceKind::Binance, "-1").is_err());
    }
}
