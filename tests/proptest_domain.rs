//! Property-Based Tests - Domain Layer Invariants
//!
//! Uses `proptest` to verify unit conversion, slippage and DCA
//! arithmetic across random inputs.

use alloy::primitives::U256;
use proptest::prelude::*;
use rust_decimal::Decimal;

use baseflow::domain::order::{amount_per_interval, scale_price};
use baseflow::domain::quote::apply_slippage;
use baseflow::domain::units::{format_amount, parse_amount, to_decimal};
use baseflow::usecases::limit_order::min_amount_out;

// ── Unit conversion ─────────────────────────────────────────

proptest! {
    /// Amounts with at most `decimals` fractional digits survive a round trip.
    #[test]
    fn parse_then_format_is_lossless(
        whole in 0u64..1_000_000_000,
        fraction in 0u64..1_000_000,
        decimals in 6u8..=18,
    ) {
        let text = format!("{whole}.{fraction:06}");
        let units = parse_amount(&text, decimals).unwrap();
        let back = format_amount(units, decimals);
        let expected: Decimal = text.parse().unwrap();
        prop_assert_eq!(back.parse::<Decimal>().unwrap(), expected);
    }

    /// Excess fractional digits are truncated, never rounded up.
    #[test]
    fn parse_truncates_extra_digits(whole in 0u64..1_000_000, fraction in 0u64..100_000_000) {
        let text = format!("{whole}.{fraction:08}");
        let units = parse_amount(&text, 6).unwrap();
        let exact: Decimal = text.parse().unwrap();
        let parsed = to_decimal(units, 6).unwrap();
        prop_assert!(parsed <= exact);
        prop_assert!(exact - parsed < Decimal::new(1, 6));
    }

    /// Formatting never leaves trailing zeros in the fraction.
    #[test]
    fn format_has_no_trailing_zeros(raw in any::<u64>(), decimals in 0u8..=18) {
        let text = format_amount(U256::from(raw), decimals);
        if let Some((_, frac)) = text.split_once('.') {
            prop_assert!(!frac.ends_with('0'), "trailing zero in {}", text);
        }
    }
}

// ── Slippage and minimum output ─────────────────────────────

proptest! {
    /// Minimum output never exceeds the quoted output.
    #[test]
    fn slippage_never_increases_output(amount in any::<u128>(), bps in 0u32..=10_000) {
        let amount = U256::from(amount);
        let pct = Decimal::new(i64::from(bps), 2);
        prop_assert!(apply_slippage(amount, pct) <= amount);
    }

    /// More slippage tolerance means a lower (or equal) minimum.
    #[test]
    fn slippage_is_monotonic(amount in any::<u128>(), a in 0u32..=10_000, b in 0u32..=10_000) {
        let amount = U256::from(amount);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let min_lo = apply_slippage(amount, Decimal::new(i64::from(lo), 2));
        let min_hi = apply_slippage(amount, Decimal::new(i64::from(hi), 2));
        prop_assert!(min_hi <= min_lo);
    }

    /// Order `minAmountOut` stays at or below the quote.
    #[test]
    fn order_min_out_below_quote(quoted in any::<u128>()) {
        let quoted = U256::from(quoted);
        prop_assert!(min_amount_out(quoted) <= quoted);
    }
}

// ── DCA and trigger prices ──────────────────────────────────

proptest! {
    /// Per-interval amount times the count stays within rounding of the total.
    #[test]
    fn per_interval_does_not_overspend(cents in 1i64..100_000_000, intervals in 2u32..=365) {
        let total = Decimal::new(cents, 2);
        let per: Decimal = amount_per_interval(total, intervals).parse().unwrap();
        prop_assert!(per * Decimal::from(intervals) <= total + Decimal::new(1, 6) * Decimal::from(intervals));
        prop_assert_eq!(per.scale(), 6);
    }

    /// Scaled trigger prices preserve order.
    #[test]
    fn scale_price_is_monotonic(a in 1i64..1_000_000_000, b in 1i64..1_000_000_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let lo = scale_price(Decimal::new(lo, 4)).unwrap();
        let hi = scale_price(Decimal::new(hi, 4)).unwrap();
        prop_assert!(lo <= hi);
    }
}
