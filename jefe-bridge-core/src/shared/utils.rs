//! Utility functions for the bridge core

use crate::shared::constants::PRIVATE_KEY_HEX_LENGTH;
use crate::shared::error::{ConnectionError, QuoteError};
use ethers::types::{Address, U256};
use ethers::utils::{format_units, parse_units, ParseUnits};
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::Zeroizing;

/// Get current timestamp in seconds
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| std::time::Duration::from_secs(0))
        .as_secs()
}

/// Validates if a string is a valid hex address (0x followed by 40 hex characters)
pub fn is_valid_hex_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(hex_part) => hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

pub fn parse_address(address: &str) -> Option<Address> {
    if !is_valid_hex_address(address) {
        return None;
    }
    address.parse::<Address>().ok()
}

/// Validate private key format
///
/// Runs before any key material reaches the signer or the network.
pub fn validate_private_key(private_key: &str) -> Result<(), ConnectionError> {
    if !private_key.starts_with("0x") {
        return Err(ConnectionError::MalformedKey(
            "Private key must start with 0x".to_string(),
        ));
    }

    if private_key.len() != PRIVATE_KEY_HEX_LENGTH {
        return Err(ConnectionError::MalformedKey(format!(
            "Private key must be {} characters long",
            PRIVATE_KEY_HEX_LENGTH
        )));
    }

    let bytes = Zeroizing::new(hex::decode(&private_key[2..]).map_err(|_| {
        ConnectionError::MalformedKey("Private key contains invalid hex characters".to_string())
    })?);
    if bytes.iter().all(|b| *b == 0) {
        return Err(ConnectionError::MalformedKey("Private key cannot be zero".to_string()));
    }

    Ok(())
}

/// Parse a decimal token amount into base units
pub fn parse_token_amount(amount: &str, decimals: u8) -> Result<U256, QuoteError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(QuoteError::InvalidAmount("amount is empty".to_string()));
    }
    let parsed = parse_units(trimmed, decimals as u32)
        .map_err(|e| QuoteError::InvalidAmount(format!("{trimmed}: {e}")))?;
    match parsed {
        ParseUnits::U256(value) if !value.is_zero() => Ok(value),
        ParseUnits::U256(_) => Err(QuoteError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        )),
        ParseUnits::I256(_) => Err(QuoteError::InvalidAmount(format!(
            "{trimmed}: negative amounts are not allowed"
        ))),
    }
}

/// Format base units as a decimal string, trimming trailing zeros
pub fn format_token_amount(amount: U256, decimals: u8) -> String {
    let formatted = format_units(amount, decimals as u32).unwrap_or_else(|_| amount.to_string());
    trim_decimal(&formatted)
}

fn trim_decimal(value: &str) -> String {
    if !value.contains('.') {
        return value.to_string();
    }
    let trimmed = value.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lossy conversion for display and local estimates
pub fn token_amount_to_f64(amount: U256, decimals: u8) -> f64 {
    format_token_amount(amount, decimals).parse::<f64>().unwrap_or(0.0)
}

/// Apply a slippage tolerance in basis points to an expected amount
///
/// Exact floor of `expected * (10000 - bps) / 10000`, computed on quotient and
/// remainder so any router output is accepted without overflow.
pub fn apply_slippage(expected: U256, slippage_bps: u32) -> U256 {
    let denominator = U256::from(crate::shared::constants::BPS_DENOMINATOR);
    let keep = U256::from(
        crate::shared::constants::BPS_DENOMINATOR - slippage_bps.min(crate::shared::constants::BPS_DENOMINATOR),
    );
    let (quotient, remainder) = expected.div_mod(denominator);
    quotient * keep + remainder * keep / denominator
}

/// Chain id in the 0x-prefixed form wallet providers expect
pub fn chain_id_hex(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}
