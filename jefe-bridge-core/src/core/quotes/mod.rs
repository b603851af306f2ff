//! Quote fetcher
//!
//! Builds the router path for a pair and asks the router what the input
//! amount buys. When the router cannot answer, the caller gets a local
//! estimate from USD prices instead.

use crate::domain::entities::{PriceSnapshot, QuoteOutcome, SwapQuote, TokenInfo};
use crate::infrastructure::blockchain::{ChainReader, RouterGateway};
use crate::shared::error::{ChainError, QuoteError};
use crate::shared::types::{Address, U256};
use crate::shared::utils::{format_token_amount, parse_token_amount};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Router path rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    wrapped_native: Address,
    preferred_hops: HashMap<Address, Address>,
    direct_pairs: HashSet<(Address, Address)>,
}

impl RouteTable {
    pub fn new(wrapped_native: Address) -> Self {
        Self {
            wrapped_native,
            preferred_hops: HashMap::new(),
            direct_pairs: HashSet::new(),
        }
    }

    /// Route swaps out of `token` through `hop`
    pub fn with_preferred_hop(mut self, token: Address, hop: Address) -> Self {
        self.preferred_hops.insert(token, hop);
        self
    }

    pub fn with_direct_pair(mut self, a: Address, b: Address) -> Self {
        self.direct_pairs.insert((a, b));
        self.direct_pairs.insert((b, a));
        self
    }

    pub fn wrapped_native(&self) -> Address {
        self.wrapped_native
    }

    pub fn path(&self, token_in: Address, token_out: Address) -> Vec<Address> {
        if token_in == self.wrapped_native
            || token_out == self.wrapped_native
            || self.direct_pairs.contains(&(token_in, token_out))
        {
            return vec![token_in, token_out];
        }

        let hop = match self.preferred_hops.get(&token_in) {
            // The preferred hop is the pool partner, so that pair trades directly
            Some(hop) if *hop == token_out => return vec![token_in, token_out],
            Some(hop) if *hop != token_in => *hop,
            _ => self.wrapped_native,
        };
        vec![token_in, hop, token_out]
    }
}

/// USD-price estimate of `amount_in` converted into the output token
pub fn estimate_output(
    amount_in: f64,
    symbol_in: &str,
    symbol_out: &str,
    prices: &PriceSnapshot,
) -> Option<f64> {
    let price_in = prices.usd_price_of(symbol_in)?;
    let price_out = prices.usd_price_of(symbol_out)?;
    if price_out <= 0.0 || !amount_in.is_finite() || amount_in <= 0.0 {
        return None;
    }
    Some(amount_in * price_in / price_out)
}

pub struct QuoteFetcher {
    router: Arc<dyn RouterGateway>,
    routes: RouteTable,
}

impl QuoteFetcher {
    pub fn new(router: Arc<dyn RouterGateway>, routes: RouteTable) -> Self {
        Self { router, routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Output amount in base units at the end of `path`
    pub async fn amount_out(&self, amount_in: U256, path: &[Address]) -> Result<U256, QuoteError> {
        if path.len() < 2 {
            return Err(QuoteError::MalformedPath(format!(
                "path needs at least two tokens, got {}",
                path.len()
            )));
        }

        let amounts = self
            .router
            .get_amounts_out(amount_in, path.to_vec())
            .await
            .map_err(|e| QuoteError::Router(e.to_string()))?;

        if amounts.len() != path.len() {
            return Err(QuoteError::MalformedPath(format!(
                "router returned {} amounts for a {}-token path",
                amounts.len(),
                path.len()
            )));
        }
        amounts
            .last()
            .copied()
            .ok_or_else(|| QuoteError::Router("router returned no amounts".to_string()))
    }

    pub async fn quote(
        &self,
        token_in: &TokenInfo,
        token_out: &TokenInfo,
        amount_in: &str,
    ) -> Result<SwapQuote, QuoteError> {
        let amount = parse_token_amount(amount_in, token_in.decimals)?;
        let path = self.routes.path(token_in.address, token_out.address);
        let amount_out = self.amount_out(amount, &path).await?;

        debug!(
            "Quote {} {} -> {} {} over {} hop(s)",
            amount_in,
            token_in.symbol,
            format_token_amount(amount_out, token_out.decimals),
            token_out.symbol,
            path.len() - 1
        );
        Ok(SwapQuote {
            token_in: token_in.clone(),
            token_out: token_out.clone(),
            amount_in: amount,
            amount_out,
            path,
        })
    }

    /// Router quote, or a price-based estimate when the router cannot answer
    pub async fn quote_or_estimate(
        &self,
        token_in: &TokenInfo,
        token_out: &TokenInfo,
        amount_in: &str,
        prices: Option<&PriceSnapshot>,
    ) -> QuoteOutcome {
        match self.quote(token_in, token_out, amount_in).await {
            Ok(quote) => QuoteOutcome::Quoted(quote),
            Err(QuoteError::InvalidAmount(reason)) => QuoteOutcome::Unavailable { reason },
            Err(e) => {
                warn!("No router quote available: {}", e);
                let estimate = amount_in.trim().parse::<f64>().ok().and_then(|amount| {
                    prices.and_then(|prices| {
                        estimate_output(amount, &token_in.symbol, &token_out.symbol, prices)
                    })
                });
                match estimate {
                    Some(amount_out) => QuoteOutcome::Estimated {
                        amount_out,
                        reason: e.to_string(),
                    },
                    None => QuoteOutcome::Unavailable {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }
}

/// Current gas price in gwei, for display
pub async fn gas_price_gwei(reader: &dyn ChainReader) -> Result<String, ChainError> {
    let price = reader.gas_price().await?;
    Ok(format_token_amount(price, 9))
}
