//! On-chain order records and their display views.
//!
//! The contract stores DCA, limit and stop-loss orders; this module
//! maps the raw view-call tuples into display rows. Limit and stop-loss
//! records share a layout and are both represented as trigger orders.

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::abi::IBaseFlow;
use super::token::{Token, TokenRegistry};
use super::units;

/// Recurrence of a DCA order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DcaInterval {
    Hourly,
    #[default]
    Daily,
    Weekly,
    BiWeekly,
    Monthly,
}

impl DcaInterval {
    /// Interval length in seconds as passed to `createDCAOrder`.
    pub const fn seconds(self) -> u64 {
        match self {
            Self::Hourly => 3_600,
            Self::Daily => 86_400,
            Self::Weekly => 604_800,
            Self::BiWeekly => 1_209_600,
            Self::Monthly => 2_592_000,
        }
    }

    /// Label for the interval.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hourly => "Every Hour",
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::BiWeekly => "Bi-Weekly",
            Self::Monthly => "Monthly",
        }
    }
}

impl FromStr for DcaInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" | "bi-weekly" => Ok(Self::BiWeekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(format!(
                "unknown interval '{other}' (hourly, daily, weekly, biweekly, monthly)"
            )),
        }
    }
}

/// Lifetime of a limit or stop-loss order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderDuration {
    OneDay,
    #[default]
    SevenDays,
    FourteenDays,
    ThirtyDays,
}

impl OrderDuration {
    /// Duration in seconds as passed to the create call.
    pub const fn seconds(self) -> u64 {
        match self {
            Self::OneDay => 86_400,
            Self::SevenDays => 604_800,
            Self::FourteenDays => 1_209_600,
            Self::ThirtyDays => 2_592_000,
        }
    }
}

impl FromStr for OrderDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1d" => Ok(Self::OneDay),
            "7d" => Ok(Self::SevenDays),
            "14d" => Ok(Self::FourteenDays),
            "30d" => Ok(Self::ThirtyDays),
            other => Err(format!("unknown duration '{other}' (1d, 7d, 14d, 30d)")),
        }
    }
}

/// Keeper-triggered order flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Buy when price reaches a favourable target.
    #[default]
    Limit,
    /// Exit when price falls through a stop.
    StopLoss,
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limit => write!(f, "limit"),
            Self::StopLoss => write!(f, "stop-loss"),
        }
    }
}

/// Scale a price (token-out per token-in) to the contract's 1e18 fixed point.
pub fn scale_price(price: Decimal) -> Result<U256, units::AmountError> {
    units::from_decimal(price, 18)
}

/// Per-interval amount shown before a DCA order is created (6 decimals).
pub fn amount_per_interval(total: Decimal, intervals: u32) -> String {
    if intervals == 0 {
        return "0".to_string();
    }
    let per = (total / Decimal::from(intervals)).round_dp(6);
    format!("{per:.6}")
}

fn saturating_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn timestamp(secs: u64) -> DateTime<Utc> {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX);
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn after(base: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|d| base.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Display row for an active DCA order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcaOrderView {
    pub id: U256,
    pub token_in: Token,
    pub token_out: Token,
    /// Amount per execution, formatted with token-in decimals.
    pub amount_per_interval: String,
    pub interval_seconds: u64,
    pub intervals_remaining: u64,
    pub active: bool,
    pub next_execution: DateTime<Utc>,
}

impl DcaOrderView {
    /// Build a view from a `dcaOrders` record.
    ///
    /// Next execution is one interval after the last run, or one
    /// interval from `now` if the order never ran.
    pub fn from_record(
        id: U256,
        record: &IBaseFlow::dcaOrdersReturn,
        registry: &TokenRegistry,
        now: DateTime<Utc>,
    ) -> Self {
        let token_in = registry.by_address(record.tokenIn);
        let token_out = registry.by_address(record.tokenOut);
        let interval_seconds = saturating_u64(record.intervalDuration);
        let last = saturating_u64(record.lastExecutionTime);
        let next_execution = if last > 0 {
            after(timestamp(last), interval_seconds)
        } else {
            after(now, interval_seconds)
        };

        Self {
            id,
            amount_per_interval: units::format_amount(record.amountPerInterval, token_in.decimals),
            token_in,
            token_out,
            interval_seconds,
            intervals_remaining: saturating_u64(record.intervalsRemaining),
            active: record.active,
            next_execution,
        }
    }

    /// Interval in whole hours, rounded.
    pub fn interval_hours(&self) -> u64 {
        (self.interval_seconds + 1_800) / 3_600
    }
}

/// Layout shared by limit and stop-loss records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerOrderRecord {
    pub user: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    /// Trigger price, 1e18-scaled token-out per token-in.
    pub price_scaled: U256,
    pub min_amount_out: U256,
    pub expiry: U256,
    pub active: bool,
}

impl From<IBaseFlow::limitOrdersReturn> for TriggerOrderRecord {
    fn from(r: IBaseFlow::limitOrdersReturn) -> Self {
        Self {
            user: r.user,
            token_in: r.tokenIn,
            token_out: r.tokenOut,
            amount_in: r.amountIn,
            price_scaled: r.targetPrice,
            min_amount_out: r.minAmountOut,
            expiry: r.expiry,
            active: r.active,
        }
    }
}

impl From<IBaseFlow::stopLossOrdersReturn> for TriggerOrderRecord {
    fn from(r: IBaseFlow::stopLossOrdersReturn) -> Self {
        Self {
            user: r.user,
            token_in: r.tokenIn,
            token_out: r.tokenOut,
            amount_in: r.amountIn,
            price_scaled: r.stopPrice,
            min_amount_out: r.minAmountOut,
            expiry: r.expiry,
            active: r.active,
        }
    }
}

/// Display row for an active limit or stop-loss order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerOrderView {
    pub id: U256,
    pub kind: TriggerKind,
    pub token_in: Token,
    pub token_out: Token,
    /// Amount in, formatted with token-in decimals.
    pub amount_in: String,
    /// Trigger price (token-out per token-in).
    pub price: Option<Decimal>,
    /// Minimum output, formatted with token-out decimals.
    pub min_amount_out: String,
    pub expiry: DateTime<Utc>,
    pub active: bool,
}

impl TriggerOrderView {
    /// Build a view from a limit or stop-loss record.
    pub fn from_record(
        id: U256,
        kind: TriggerKind,
        record: &TriggerOrderRecord,
        registry: &TokenRegistry,
    ) -> Self {
        let token_in = registry.by_address(record.token_in);
        let token_out = registry.by_address(record.token_out);
        Self {
            id,
            kind,
            amount_in: units::format_amount(record.amount_in, token_in.decimals),
            price: units::to_decimal(record.price_scaled, 18),
            min_amount_out: units::format_amount(record.min_amount_out, token_out.decimals),
            expiry: timestamp(saturating_u64(record.expiry)),
            active: record.active,
            token_in,
            token_out,
        }
    }
}
