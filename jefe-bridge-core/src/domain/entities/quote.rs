//! Swap quote entities

use crate::domain::entities::token::TokenInfo;
use crate::shared::types::{Address, U256};
use crate::shared::utils::format_token_amount;
use serde::{Deserialize, Serialize};

/// Router answer for one candidate input amount
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwapQuote {
    pub token_in: TokenInfo,
    pub token_out: TokenInfo,
    pub amount_in: U256,
    pub amount_out: U256,
    pub path: Vec<Address>,
}

impl SwapQuote {
    pub fn amount_out_display(&self) -> String {
        format_token_amount(self.amount_out, self.token_out.decimals)
    }

    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// What the swap form shows for an input amount
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum QuoteOutcome {
    Quoted(SwapQuote),
    /// Router unavailable; output estimated from USD prices
    Estimated { amount_out: f64, reason: String },
    Unavailable { reason: String },
}

impl QuoteOutcome {
    pub fn quote(&self) -> Option<&SwapQuote> {
        match self {
            QuoteOutcome::Quoted(quote) => Some(quote),
            _ => None,
        }
    }

    pub fn expected_output(&self) -> Option<f64> {
        match self {
            QuoteOutcome::Quoted(quote) => quote.amount_out_display().parse::<f64>().ok(),
            QuoteOutcome::Estimated { amount_out, .. } => Some(*amount_out),
            QuoteOutcome::Unavailable { .. } => None,
        }
    }
}
