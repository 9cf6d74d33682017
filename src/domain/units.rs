//! Conversion between user-entered decimal strings and on-chain base units.
//!
//! Thin wrappers over `alloy::primitives::utils` that add input
//! validation and the trimmed display format shown to users
//! (`1.5` rather than `1.500000`).

use std::str::FromStr;

use alloy::primitives::U256;
use alloy::primitives::utils::{format_units, parse_units};
use rust_decimal::Decimal;
use thiserror::Error;

/// Failure to interpret an amount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// Empty input.
    #[error("amount is empty")]
    Empty,
    /// Not a non-negative decimal number.
    #[error("invalid amount: {0}")]
    Invalid(String),
}

/// Whether the text parses to a non-zero amount of a token with `decimals`.
///
/// Forms use this gate before issuing any network request. It accepts
/// exactly what `parse_amount` accepts.
pub fn is_positive_amount(text: &str, decimals: u8) -> bool {
    parse_amount(text, decimals).is_ok_and(|units| !units.is_zero())
}

/// Parse a decimal string into base units for a token with `decimals`.
///
/// Fractional digits beyond `decimals` are truncated.
pub fn parse_amount(text: &str, decimals: u8) -> Result<U256, AmountError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AmountError::Empty);
    }
    if text.starts_with('-') {
        return Err(AmountError::Invalid(text.to_string()));
    }
    let text = truncate_fraction(text, decimals);
    parse_units(&text, decimals)
        .map(|units| units.get_absolute())
        .map_err(|e| AmountError::Invalid(format!("{text}: {e}")))
}

/// Format base units as a decimal string with trailing zeros removed.
pub fn format_amount(value: U256, decimals: u8) -> String {
    match format_units(value, decimals) {
        Ok(text) => trim_fraction(&text),
        // Only reachable for decimals > 77; fall back to raw units.
        Err(_) => value.to_string(),
    }
}

/// Base units as a `Decimal`, `None` if beyond `Decimal` range.
pub fn to_decimal(value: U256, decimals: u8) -> Option<Decimal> {
    Decimal::from_str(&format_amount(value, decimals)).ok()
}

/// Floor a non-negative `Decimal` into base units.
pub fn from_decimal(value: Decimal, decimals: u8) -> Result<U256, AmountError> {
    if value.is_sign_negative() {
        return Err(AmountError::Invalid(value.to_string()));
    }
    parse_amount(&value.normalize().to_string(), decimals)
}

fn truncate_fraction(text: &str, decimals: u8) -> String {
    match text.split_once('.') {
        Some((int, frac)) if frac.chars().count() > usize::from(decimals) => {
            if decimals == 0 {
                return int.to_string();
            }
            let kept: String = frac.chars().take(usize::from(decimals)).collect();
            format!("{int}.{kept}")
        }
        _ => text.to_string(),
    }
}

fn trim_fraction(text: &str) -> String {
    if !text.contains('.') {
        return text.to_string();
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_positive_amount_gate() {
        assert!(is_positive_amount("1.5", 6));
        assert!(is_positive_amount(" 0.0001 ", 6));
        assert!(!is_positive_amount("", 6));
        assert!(!is_positive_amount("0", 6));
        assert!(!is_positive_amount("0.000", 6));
        assert!(!is_positive_amount("-1", 6));
        assert!(!is_positive_amount("abc", 6));
        // Below one base unit truncates to zero.
        assert!(!is_positive_amount("0.0000001", 6));
    }

    #[test]
    fn test_positive_amount_gate_agrees_with_parse() {
        // Beyond Decimal's 28 digits but a valid 18-decimal amount.
        let large = "12345678901234567890123456789";
        assert!(parse_amount(large, 18).is_ok());
        assert!(is_positive_amount(large, 18));
        // Exponent notation is not an amount.
        assert!(parse_amount("1e3", 6).is_err());
        assert!(!is_positive_amount("1e3", 6));
    }

    #[test]
    fn test_parse_usdc() {
        assert_eq!(parse_amount("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_amount("0.000001", 6).unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_parse_ether() {
        let expected = U256::from(2_000_000_000_000_000_000u128);
        assert_eq!(parse_amount("2", 18).unwrap(), expected);
    }

    #[test]
    fn test_parse_truncates_excess_precision() {
        assert_eq!(parse_amount("1.2345678", 6).unwrap(), U256::from(1_234_567u64));
        assert_eq!(parse_amount("7.9", 0).unwrap(), U256::from(7u64));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(parse_amount("", 18), Err(AmountError::Empty));
        assert!(parse_amount("-3", 18).is_err());
        assert!(parse_amount("1.2.3", 18).is_err());
    }

    #[test]
    fn test_format_trims_zeros() {
        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(
            format_amount(U256::from(1_000_000_000_000_000_000u128), 18),
            "1"
        );
        assert_eq!(format_amount(U256::ZERO, 6), "0");
    }

    #[test]
    fn test_decimal_conversions() {
        assert_eq!(to_decimal(U256::from(2_500_000u64), 6), Some(dec!(2.5)));
        assert_eq!(
            from_decimal(dec!(0.0004), 18).unwrap(),
            U256::from(400_000_000_000_000u64)
        );
        assert!(from_decimal(dec!(-1), 18).is_err());
    }

    #[test]
    fn test_trim_integer_untouched() {
        assert_eq!(trim_fraction("100"), "100");
        assert_eq!(trim_fraction("100.000"), "100");
    }
}
