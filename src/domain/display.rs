//! User-facing number and time formatting.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Balance display: `0.00`, `<0.0001`, 4 decimals below one, else 2.
pub fn format_balance(value: Option<Decimal>) -> String {
    let Some(v) = value else {
        return "0.00".to_string();
    };
    if v.is_zero() {
        "0.00".to_string()
    } else if v < dec!(0.0001) {
        "<0.0001".to_string()
    } else if v < Decimal::ONE {
        format!("{:.4}", v.round_dp(4))
    } else {
        format!("{:.2}", v.round_dp(2))
    }
}

/// USD amount with two decimals, e.g. `$1234.50`.
pub fn format_usd(value: Decimal) -> String {
    format!("${:.2}", value.round_dp(2))
}

/// Time until `at`: `{d}d {h}h` beyond a day, else `{h}h {m}m`.
///
/// Past instants render as `due`.
pub fn format_countdown(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = at - now;
    if diff < chrono::Duration::zero() {
        return "due".to_string();
    }
    let hours = diff.num_hours();
    let minutes = diff.num_minutes() % 60;
    if hours > 24 {
        format!("{}d {}h", hours / 24, hours % 24)
    } else {
        format!("{hours}h {minutes}m")
    }
}

/// Time until expiry as `{d}d {h}h`; past instants render as `expired`.
pub fn format_expiry(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = at - now;
    if diff < chrono::Duration::zero() {
        return "expired".to_string();
    }
    format!("{}d {}h", diff.num_days(), diff.num_hours() % 24)
}
