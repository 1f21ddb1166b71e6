//! Utility functions for motions
//!
//! This module provides time helpers and 18-decimal amount formatting used
//! across the motions crates.

use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::common::Amount;

/// Number of decimals of ledger amounts
pub const AMOUNT_DECIMALS: u32 = 18;

/// One whole token (10^18 base units)
pub const ONE_TOKEN: Amount = 1_000_000_000_000_000_000;

/// Error types for utility operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UtilError {
    /// Parsing error
    #[error("Parsing error: {0}")]
    ParseError(String),

    /// Invalid value
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Result type for utility operations
pub type UtilResult<T> = Result<T, UtilError>;

/// Get the current timestamp in seconds
pub fn timestamp_secs() -> u64 {
    let start = SystemTime::now();
    let since_epoch = start.duration_since(UNIX_EPOCH).unwrap_or(Duration::from_secs(0));
    since_epoch.as_secs()
}

/// Parse a string to a specific type
pub fn parse_string<T: FromStr>(value: &str) -> UtilResult<T>
where
    T::Err: std::fmt::Display,
{
    value.parse::<T>()
        .map_err(|e| UtilError::ParseError(format!("Failed to parse value: {}", e)))
}

/// Format a base-unit amount as a decimal token string ("1.5", "20.0")
pub fn format_amount(amount: Amount) -> String {
    let whole = amount / ONE_TOKEN;
    let fraction = amount % ONE_TOKEN;
    if fraction == 0 {
        return format!("{}.0", whole);
    }

    let digits = format!("{:018}", fraction);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Parse a decimal token string ("1.5") into base units
pub fn parse_amount(value: &str) -> UtilResult<Amount> {
    let value = value.trim();
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(UtilError::ParseError(format!("Empty amount: {:?}", value)));
    }
    if fraction.len() > AMOUNT_DECIMALS as usize {
        return Err(UtilError::InvalidValue(format!("Too many decimals in {}", value)));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(UtilError::ParseError(format!("Invalid amount: {}", value)));
    }

    let whole: Amount = if whole.is_empty() { 0 } else { parse_string(whole)? };
    let fraction: Amount = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = AMOUNT_DECIMALS as usize);
        parse_string(&padded)?
    };

    whole.checked_mul(ONE_TOKEN)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| UtilError::InvalidValue(format!("Amount overflows: {}", value)))
}
