//! Quote Orchestrator - Aggregator Quote with Spot Fallback
//!
//! Turns a form's (token in, token out, amount) into a `QuoteOutcome`:
//! - empty or zero amounts never reach the network
//! - identical tokens short-circuit to a 1:1 result
//! - an aggregator success yields an executable payload plus
//!   best-effort USD valuations
//! - an aggregator failure falls back to a display-only spot estimate

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::domain::quote::{ExecutableQuote, QuoteOutcome, UsdValuation};
use crate::domain::token::Token;
use crate::domain::units;
use crate::ports::price_oracle::PriceOracle;
use crate::ports::quote_provider::{QuoteProvider, QuoteRequest};

/// Notice shown next to a spot estimate.
pub const FALLBACK_NOTICE: &str = "Quote provider unavailable; showing spot estimate (cannot swap)";

/// Notice shown when a route exists but needs an account to assemble.
pub const CONNECT_NOTICE: &str = "Connect a wallet to build an executable route";

/// Form fields a quote depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteInput {
  /// Token being sold.
  pub token_in: Token,
  /// Token being bought.
  pub token_out: Token,
  /// User-entered amount (decimal string).
  pub amount_in: String,
  /// Slippage tolerance in percent.
  pub slippage_pct: Decimal,
  /// Connected account, if any.
  pub taker: Option<Address>,
}

/// Quotes a swap through the configured aggregator.
pub struct QuoteOrchestrator {
  provider: Arc<dyn QuoteProvider>,
  oracle: Arc<dyn PriceOracle>,
}

impl QuoteOrchestrator {
  /// Create a new orchestrator.
  pub fn new(provider: Arc<dyn QuoteProvider>, oracle: Arc<dyn PriceOracle>) -> Self {
    Self { provider, oracle }
  }

  /// Name of the underlying aggregator.
  pub fn provider_name(&self) -> &'static str {
    self.provider.name()
  }

  /// Produce the outcome for `input`.
  #[instrument(skip(self, input), fields(pair = %format!("{}/{}", input.token_in, input.token_out), amount = %input.amount_in))]
  pub async fn quote(&self, input: &QuoteInput) -> QuoteOutcome {
    let sell_amount = match units::parse_amount(&input.amount_in, input.token_in.decimals) {
      Ok(amount) if !amount.is_zero() => amount,
      _ => return QuoteOutcome::Idle,
    };

    if input.token_in.address == input.token_out.address {
      return QuoteOutcome::SameToken {
        amount_out: input.amount_in.trim().to_string(),
      };
    }

    let request = QuoteRequest {
      sell_token: input.token_in.clone(),
      buy_token: input.token_out.clone(),
      sell_amount,
      slippage_pct: input.slippage_pct,
      taker: input.taker,
    };

    match self.provider.quote(&request).await {
      Ok(quote) => {
        let amount_out = units::format_amount(quote.buy_amount, input.token_out.decimals);
        let Some(transaction) = quote.transaction.clone() else {
          debug!("Route is not executable without an account");
          return QuoteOutcome::Estimate {
            amount_out,
            notice: CONNECT_NOTICE.to_string(),
          };
        };
        let usd = self.usd_valuation(input, quote.buy_amount).await;
        debug!(%amount_out, route = %quote.route_label(), "Executable quote");
        QuoteOutcome::Executable(ExecutableQuote {
          amount_out,
          quote,
          transaction,
          usd,
        })
      }
      Err(e) => {
        warn!(provider = self.provider.name(), error = %e, "Aggregator quote failed");
        match self.spot_estimate(input).await {
          Some(amount_out) => QuoteOutcome::Estimate {
            amount_out,
            notice: FALLBACK_NOTICE.to_string(),
          },
          None => QuoteOutcome::Failed {
            message: e.to_string(),
          },
        }
      }
    }
  }

  /// USD value of both legs; any failure leaves the leg empty.
  async fn usd_valuation(&self, input: &QuoteInput, buy_amount: U256) -> UsdValuation {
    let addrs = [input.token_in.price_address(), input.token_out.price_address()];
    let prices = match self.oracle.usd_prices(&addrs).await {
      Ok(prices) => prices,
      Err(e) => {
        debug!(error = %e, "USD valuation unavailable");
        return UsdValuation::default();
      }
    };

    let amount_in = Decimal::from_str(input.amount_in.trim()).ok();
    let amount_out = units::to_decimal(buy_amount, input.token_out.decimals);

    UsdValuation {
      amount_in_usd: amount_in
        .zip(prices.get(&addrs[0]))
        .and_then(|(a, p)| a.checked_mul(*p)),
      amount_out_usd: amount_out
        .zip(prices.get(&addrs[1]))
        .and_then(|(a, p)| a.checked_mul(*p)),
    }
  }

  /// `amount_in × price_in / price_out`, rounded to token-out decimals.
  async fn spot_estimate(&self, input: &QuoteInput) -> Option<String> {
    let addrs = [input.token_in.price_address(), input.token_out.price_address()];
    let prices = match self.oracle.usd_prices(&addrs).await {
      Ok(prices) => prices,
      Err(e) => {
        warn!(error = %e, "Spot price fallback failed");
        return None;
      }
    };
    let price_in = *prices.get(&addrs[0])?;
    let price_out = *prices.get(&addrs[1])?;
    if price_out.is_zero() {
      return None;
    }
    let amount_in = Decimal::from_str(input.amount_in.trim()).ok()?;
    let out = amount_in.checked_mul(price_in)?.checked_div(price_out)?;
    let dp = u32::from(input.token_out.decimals.min(18));
    Some(out.round_dp(dp).normalize().to_string())
  }
}
