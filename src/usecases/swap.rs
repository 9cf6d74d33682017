//! Swap Form and Executor
//!
//! `SwapForm` holds the editable swap state (tokens, amounts,
//! slippage, last quote outcome). `SwapExecutor` submits an
//! executable quote, approving the spender first when the current
//! allowance is short.
//!
//! Two routes are supported:
//! - `Direct`: the aggregator payload is sent verbatim
//! - `BaseFlow`: the payload is wrapped in the contract's `swap()`
//!   entry point with a slippage-derived minimum output

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::Address;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, instrument};

use super::contract::BaseFlowContract;
use super::quote_orchestrator::QuoteInput;
use crate::domain::quote::{ExecutableQuote, PreparedTx, QuoteOutcome, TxOutcome};
use crate::domain::token::{Token, TokenRegistry, router_name};
use crate::errors::ExecutionError;
use crate::ports::chain_client::ChainClient;

/// Slippage presets offered by the form (percent).
pub const SLIPPAGE_PRESETS: [Decimal; 3] = [dec!(0.1), dec!(0.5), dec!(1.0)];

/// Upper bound accepted for custom slippage (percent).
pub const MAX_SLIPPAGE_PCT: Decimal = dec!(50);

/// Protocol fee shown in the summary (0.3%).
pub const DISPLAY_FEE_RATE: Decimal = dec!(0.003);

/// Editable swap state.
#[derive(Debug, Clone)]
pub struct SwapForm {
  pub token_in: Token,
  pub token_out: Token,
  pub amount_in: String,
  /// Display only; derived from the last outcome.
  pub amount_out: String,
  pub slippage_pct: Decimal,
  pub outcome: QuoteOutcome,
}

/// Rate, fee and minimum-received lines under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapSummary {
  /// Token-out per token-in, 6 decimals.
  pub rate: String,
  /// Fee in token-in, 6 decimals.
  pub fee: String,
  /// Output after slippage, 2 decimals.
  pub min_received: String,
}

impl SwapForm {
  /// ETH → USDC at 0.5% slippage.
  pub fn new(registry: &TokenRegistry) -> Self {
    let token_in = registry.by_address(Address::ZERO);
    let token_out = registry
      .by_symbol("USDC")
      .cloned()
      .unwrap_or_else(|| token_in.clone());
    Self::with_tokens(token_in, token_out)
  }

  /// Form for an explicit pair.
  pub fn with_tokens(token_in: Token, token_out: Token) -> Self {
    Self {
      token_in,
      token_out,
      amount_in: String::new(),
      amount_out: String::new(),
      slippage_pct: dec!(0.5),
      outcome: QuoteOutcome::Idle,
    }
  }

  /// Replace the input amount; the previous quote no longer applies.
  pub fn set_amount_in(&mut self, text: impl Into<String>) {
    self.amount_in = text.into();
    self.reset_quote();
  }

  /// Set slippage in percent, `0 < pct <= 50`.
  pub fn set_slippage(&mut self, pct: Decimal) -> Result<(), ExecutionError> {
    if pct <= Decimal::ZERO || pct > MAX_SLIPPAGE_PCT {
      return Err(ExecutionError::InvalidInput(format!(
        "slippage must be in (0, {MAX_SLIPPAGE_PCT}], got {pct}"
      )));
    }
    self.slippage_pct = pct;
    self.reset_quote();
    Ok(())
  }

  /// Swap sides; the displayed amounts trade places.
  pub fn switch_tokens(&mut self) {
    std::mem::swap(&mut self.token_in, &mut self.token_out);
    std::mem::swap(&mut self.amount_in, &mut self.amount_out);
    self.outcome = QuoteOutcome::Idle;
  }

  /// Quote input for the current state.
  pub fn quote_input(&self, taker: Option<Address>) -> QuoteInput {
    QuoteInput {
      token_in: self.token_in.clone(),
      token_out: self.token_out.clone(),
      amount_in: self.amount_in.clone(),
      slippage_pct: self.slippage_pct,
      taker,
    }
  }

  /// Store a quote outcome and refresh the displayed output.
  pub fn apply(&mut self, outcome: QuoteOutcome) {
    self.amount_out = outcome.amount_out().unwrap_or_default().to_string();
    self.outcome = outcome;
  }

  /// Summary lines, when both amounts are present.
  pub fn summary(&self) -> Option<SwapSummary> {
    let amount_in = Decimal::from_str(self.amount_in.trim()).ok()?;
    let amount_out = Decimal::from_str(self.amount_out.trim()).ok()?;
    if amount_in.is_zero() {
      return None;
    }
    let keep = Decimal::ONE - self.slippage_pct / Decimal::ONE_HUNDRED;
    Some(SwapSummary {
      rate: format!("{:.6}", (amount_out / amount_in).round_dp(6)),
      fee: format!("{:.6}", (amount_in * DISPLAY_FEE_RATE).round_dp(6)),
      min_received: format!("{:.2}", (amount_out * keep).round_dp(2)),
    })
  }

  fn reset_quote(&mut self) {
    self.amount_out.clear();
    self.outcome = QuoteOutcome::Idle;
  }
}

/// How an executable quote is submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SwapRoute {
  /// Send the aggregator payload as-is.
  #[default]
  Direct,
  /// Wrap the payload in `BaseFlow.swap()`.
  BaseFlow,
}

/// Receipts from a completed swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReceipt {
  /// Approval, when one was needed.
  pub approval: Option<TxOutcome>,
  /// The swap itself.
  pub swap: TxOutcome,
}

/// Submits swaps for a connected account.
pub struct SwapExecutor<C: ChainClient> {
  contract: Arc<BaseFlowContract<C>>,
}

impl<C: ChainClient> SwapExecutor<C> {
  /// Create a new executor.
  pub fn new(contract: Arc<BaseFlowContract<C>>) -> Self {
    Self { contract }
  }

  /// The transaction `execute` would send after any approval.
  pub async fn prepare(&self, form: &SwapForm, route: SwapRoute) -> Result<PreparedTx, ExecutionError> {
    let quote = executable(form)?;
    match route {
      SwapRoute::Direct => Ok(PreparedTx::from(&quote.transaction)),
      SwapRoute::BaseFlow => self.routed_tx(form, quote).await,
    }
  }

  /// Approve if needed, then swap. Each step waits for its receipt.
  #[instrument(skip(self, form), fields(pair = %format!("{}/{}", form.token_in, form.token_out)))]
  pub async fn execute(&self, form: &SwapForm, route: SwapRoute) -> Result<SwapReceipt, ExecutionError> {
    let owner = self.contract.signer()?;
    let quote = executable(form)?;
    let tx = self.prepare(form, route).await?;

    let spender = match route {
      SwapRoute::Direct => quote.transaction.allowance_target,
      SwapRoute::BaseFlow => Some(self.contract.address()),
    };
    let sell_amount = quote.quote.sell_amount;

    let mut approval = None;
    if let Some(spender) = spender {
      if self
        .contract
        .needs_approval(&form.token_in, owner, spender, sell_amount)
        .await?
      {
        info!(%spender, amount = %sell_amount, "Allowance short, approving");
        let approve = self.contract.approve_tx(&form.token_in, spender, sell_amount);
        approval = Some(self.contract.submit_approval(&approve).await?);
      }
    }

    let swap = self.contract.submit(&tx).await?;
    info!(hash = %swap.hash, "Swap confirmed");
    Ok(SwapReceipt { approval, swap })
  }

  async fn routed_tx(&self, form: &SwapForm, quote: &ExecutableQuote) -> Result<PreparedTx, ExecutionError> {
    let router = quote.transaction.to;
    if !self.contract.is_dex_router(router).await? {
      return Err(ExecutionError::InvalidInput(format!(
        "router {router} is not whitelisted by BaseFlow; use the direct route"
      )));
    }
    info!(router = router_name(router).unwrap_or("unlabelled"), "Routing through BaseFlow");

    let amount_in = quote.quote.sell_amount;
    let min_out = quote.quote.min_buy_amount(form.slippage_pct);
    Ok(self.contract.swap_tx(
      &form.token_in,
      &form.token_out,
      amount_in,
      min_out,
      router,
      quote.transaction.data.clone(),
    ))
  }
}

fn executable(form: &SwapForm) -> Result<&ExecutableQuote, ExecutionError> {
  match &form.outcome {
    QuoteOutcome::Executable(quote) => Ok(quote),
    _ => Err(ExecutionError::NoExecutableQuote),
  }
}

/// Parse a user-entered slippage value (percent).
pub fn parse_slippage(text: &str) -> Result<Decimal, ExecutionError> {
  Decimal::from_str(text.trim())
    .map_err(|_| ExecutionError::InvalidInput(format!("invalid slippage: {text}")))
}
