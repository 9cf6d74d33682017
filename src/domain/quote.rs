//! Quote and transaction payload types.
//!
//! An `AggregatorQuote` is the provider-neutral shape both the 0x and
//! Odos adapters produce. `QuoteOutcome` is what a form displays after
//! a quote attempt: only the `Executable` variant carries a payload that
//! may be submitted.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// One venue's share of a routed swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquiditySource {
    /// Venue name as reported by the aggregator.
    pub name: String,
    /// Fraction of the input routed through this venue (0..=1).
    pub proportion: f64,
}

/// Pick the venue carrying the largest positive share.
pub fn best_source(sources: &[LiquiditySource]) -> Option<&LiquiditySource> {
    sources
        .iter()
        .filter(|s| s.proportion > 0.0)
        .max_by(|a, b| a.proportion.total_cmp(&b.proportion))
}

/// Executable swap payload returned by an aggregator.
///
/// Submitted verbatim: `to`, `data` and `value` are never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapTransaction {
    /// Router or settlement contract to call.
    pub to: Address,
    /// ABI-encoded call data.
    pub data: Bytes,
    /// Native value to attach (non-zero only for native input).
    pub value: U256,
    /// Spender that needs an ERC-20 allowance for the sell token.
    pub allowance_target: Option<Address>,
}

/// Provider-neutral quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorQuote {
    /// Provider label (`0x`, `Odos`).
    pub provider: String,
    /// Input amount in sell-token base units.
    pub sell_amount: U256,
    /// Expected output in buy-token base units.
    pub buy_amount: U256,
    /// Gas units estimated by the provider.
    pub gas_estimate: Option<u64>,
    /// Liquidity-source breakdown.
    pub sources: Vec<LiquiditySource>,
    /// Executable payload, absent for quote-only responses.
    pub transaction: Option<SwapTransaction>,
}

impl AggregatorQuote {
    /// Label for the best route, e.g. `Best price via Uniswap_V3`.
    pub fn route_label(&self) -> String {
        match best_source(&self.sources) {
            Some(source) => format!("Best price via {}", source.name),
            None => format!("Best price ({})", self.provider),
        }
    }

    /// `buy_amount` reduced by `slippage_pct` percent, floored.
    pub fn min_buy_amount(&self, slippage_pct: Decimal) -> U256 {
        apply_slippage(self.buy_amount, slippage_pct)
    }
}

/// Reduce `amount` by `slippage_pct` percent (basis-point precision).
pub fn apply_slippage(amount: U256, slippage_pct: Decimal) -> U256 {
    let bps = (slippage_pct * Decimal::ONE_HUNDRED)
        .trunc()
        .clamp(Decimal::ZERO, Decimal::from(10_000));
    let bps = U256::from(bps.to_u64().unwrap_or(0));
    amount * (U256::from(10_000u64) - bps) / U256::from(10_000u64)
}

/// USD value of both legs of a quote, each optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsdValuation {
    /// Value of the input amount.
    pub amount_in_usd: Option<Decimal>,
    /// Value of the quoted output.
    pub amount_out_usd: Option<Decimal>,
}

/// A quote that may be executed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableQuote {
    /// Output amount formatted with the buy token's decimals.
    pub amount_out: String,
    /// Underlying provider quote.
    pub quote: AggregatorQuote,
    /// Payload to submit.
    pub transaction: SwapTransaction,
    /// Best-effort USD valuation.
    pub usd: UsdValuation,
}

/// Result of one quote attempt, as displayed by a form.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteOutcome {
    /// No usable input amount; nothing was requested.
    Idle,
    /// Input and output token are the same; output mirrors input.
    SameToken {
        /// Output amount (equal to the input).
        amount_out: String,
    },
    /// Route found with an executable payload.
    Executable(ExecutableQuote),
    /// Display-only spot estimate; execution disabled.
    Estimate {
        /// Estimated output amount.
        amount_out: String,
        /// User-facing explanation.
        notice: String,
    },
    /// Neither route nor estimate available.
    Failed {
        /// Error surfaced to the user.
        message: String,
    },
}

impl QuoteOutcome {
    /// Displayed output amount, if any.
    pub fn amount_out(&self) -> Option<&str> {
        match self {
            Self::SameToken { amount_out } | Self::Estimate { amount_out, .. } => {
                Some(amount_out)
            }
            Self::Executable(q) => Some(&q.amount_out),
            Self::Idle | Self::Failed { .. } => None,
        }
    }

    /// Whether the execute action is enabled.
    pub fn is_executable(&self) -> bool {
        matches!(self, Self::Executable(_))
    }

    /// Payload to submit, only for executable outcomes.
    pub fn swap_transaction(&self) -> Option<&SwapTransaction> {
        match self {
            Self::Executable(q) => Some(&q.transaction),
            _ => None,
        }
    }

    /// Error or notice to show alongside the amount.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Estimate { notice, .. } => Some(notice),
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// A transaction ready for the wallet to sign and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTx {
    /// Short description shown in confirmations and logs.
    pub label: String,
    /// Target contract.
    pub to: Address,
    /// Call data.
    pub data: Bytes,
    /// Native value attached.
    pub value: U256,
}

impl PreparedTx {
    /// Build a prepared transaction.
    pub fn new(label: impl Into<String>, to: Address, data: Bytes, value: U256) -> Self {
        Self {
            label: label.into(),
            to,
            data,
            value,
        }
    }
}

impl From<&SwapTransaction> for PreparedTx {
    fn from(tx: &SwapTransaction) -> Self {
        Self::new("swap", tx.to, tx.data.clone(), tx.value)
    }
}

/// Mined transaction summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    /// Transaction hash.
    pub hash: TxHash,
    /// `false` when the transaction reverted.
    pub success: bool,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
}
