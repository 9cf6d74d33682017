//! Limit and Stop-Loss Orders
//!
//! Both order kinds share one form: sell `amount_in` of token in once
//! the token-out/token-in price crosses the trigger. The trigger is
//! sent 1e18-scaled; `minAmountOut` is a best-effort quote minus
//! 0.5%, falling back to zero when no quote is available.

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, instrument, warn};

use super::contract::BaseFlowContract;
use super::dca::SubmitOutcome;
use crate::domain::order::{OrderDuration, TriggerKind, TriggerOrderView, scale_price};
use crate::domain::quote::TxOutcome;
use crate::domain::token::{Token, TokenRegistry};
use crate::domain::units;
use crate::errors::ExecutionError;
use crate::ports::chain_client::ChainClient;
use crate::ports::quote_provider::{QuoteProvider, QuoteRequest};

/// `minAmountOut = quoted × 995 / 1000`.
const MIN_OUT_NUMERATOR: u64 = 995;
const MIN_OUT_DENOMINATOR: u64 = 1_000;

/// Editable limit / stop-loss state.
#[derive(Debug, Clone)]
pub struct TriggerOrderForm {
  pub kind: TriggerKind,
  pub token_in: Token,
  pub token_out: Token,
  pub amount_in: String,
  /// Token out per token in.
  pub price: String,
  pub duration: OrderDuration,
}

/// Parsed and scaled form values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerOrderParams {
  pub amount_in: U256,
  pub price_scaled: U256,
}

impl TriggerOrderForm {
  /// USDC → ETH limit order expiring in 7 days.
  pub fn new(kind: TriggerKind, registry: &TokenRegistry) -> Self {
    let token_out = registry.by_address(Address::ZERO);
    let token_in = registry
      .by_symbol("USDC")
      .cloned()
      .unwrap_or_else(|| token_out.clone());
    Self {
      kind,
      token_in,
      token_out,
      amount_in: String::new(),
      price: String::new(),
      duration: OrderDuration::default(),
    }
  }

  /// Validate and convert to on-chain units.
  pub fn params(&self) -> Result<TriggerOrderParams, ExecutionError> {
    if self.token_in.address == self.token_out.address {
      return Err(ExecutionError::InvalidInput(
        "token in and token out must differ".to_string(),
      ));
    }
    let amount_in = units::parse_amount(&self.amount_in, self.token_in.decimals)
      .map_err(|e| ExecutionError::InvalidInput(e.to_string()))?;
    if amount_in.is_zero() {
      return Err(ExecutionError::InvalidInput("amount must be positive".to_string()));
    }
    let price = Decimal::from_str(self.price.trim())
      .map_err(|_| ExecutionError::InvalidInput(format!("invalid price: {}", self.price)))?;
    if price <= Decimal::ZERO {
      return Err(ExecutionError::InvalidInput("price must be positive".to_string()));
    }
    let price_scaled = scale_price(price).map_err(|e| ExecutionError::InvalidInput(e.to_string()))?;
    Ok(TriggerOrderParams {
      amount_in,
      price_scaled,
    })
  }
}

/// Apply the fixed 0.5% haircut to a quoted output.
pub fn min_amount_out(quoted: U256) -> U256 {
  quoted * U256::from(MIN_OUT_NUMERATOR) / U256::from(MIN_OUT_DENOMINATOR)
}

/// Creates, cancels and lists limit and stop-loss orders.
pub struct TriggerOrderService<C: ChainClient> {
  contract: Arc<BaseFlowContract<C>>,
  quotes: Arc<dyn QuoteProvider>,
  registry: TokenRegistry,
}

impl<C: ChainClient> TriggerOrderService<C> {
  /// Create a new service; `quotes` is only used for `minAmountOut`.
  pub fn new(
    contract: Arc<BaseFlowContract<C>>,
    quotes: Arc<dyn QuoteProvider>,
    registry: TokenRegistry,
  ) -> Self {
    Self {
      contract,
      quotes,
      registry,
    }
  }

  /// Best-effort minimum output; zero when the quote fails.
  pub async fn min_amount_out(&self, form: &TriggerOrderForm, amount_in: U256) -> U256 {
    let request = QuoteRequest {
      sell_token: form.token_in.clone(),
      buy_token: form.token_out.clone(),
      sell_amount: amount_in,
      slippage_pct: dec!(0.5),
      taker: self.contract.chain().account(),
    };
    match self.quotes.expected_output(&request).await {
      Ok(out) => min_amount_out(out),
      Err(e) => {
        warn!(provider = self.quotes.name(), error = %e, "No quote for minAmountOut, using 0");
        U256::ZERO
      }
    }
  }

  /// Approve BaseFlow if the allowance is short, otherwise create the order.
  #[instrument(skip(self, form), fields(kind = %form.kind, token_in = %form.token_in, token_out = %form.token_out))]
  pub async fn create(&self, form: &TriggerOrderForm) -> Result<SubmitOutcome, ExecutionError> {
    let owner = self.contract.signer()?;
    let params = form.params()?;
    let spender = self.contract.address();

    if self
      .contract
      .needs_approval(&form.token_in, owner, spender, params.amount_in)
      .await?
    {
      let approve = self.contract.approve_tx(&form.token_in, spender, params.amount_in);
      let outcome = self.contract.submit_approval(&approve).await?;
      info!(hash = %outcome.hash, "Order approval confirmed");
      return Ok(SubmitOutcome::ApprovalRequested(outcome));
    }

    let min_out = self.min_amount_out(form, params.amount_in).await;
    let tx = self.contract.create_trigger_tx(
      form.kind,
      &form.token_in,
      &form.token_out,
      params.amount_in,
      params.price_scaled,
      min_out,
      form.duration.seconds(),
    );
    let outcome = self.contract.submit(&tx).await?;
    info!(hash = %outcome.hash, %min_out, "Order created");
    Ok(SubmitOutcome::Submitted(outcome))
  }

  /// Cancel order `order_id` of `kind`.
  #[instrument(skip(self))]
  pub async fn cancel(&self, kind: TriggerKind, order_id: U256) -> Result<TxOutcome, ExecutionError> {
    self.contract.signer()?;
    self
      .contract
      .submit(&self.contract.cancel_trigger_tx(kind, order_id))
      .await
  }

  /// Active orders of `kind` for `user`.
  #[instrument(skip(self))]
  pub async fn list(&self, kind: TriggerKind, user: Address) -> anyhow::Result<Vec<TriggerOrderView>> {
    let ids = self.contract.user_trigger_order_ids(kind, user).await?;
    let mut views = Vec::with_capacity(ids.len());
    for id in ids {
      match self.contract.trigger_order(kind, id).await {
        Ok(record) if record.active => {
          views.push(TriggerOrderView::from_record(id, kind, &record, &self.registry));
        }
        Ok(_) => {}
        Err(e) => warn!(%id, error = %e, "Failed to load {kind} order"),
      }
    }
    Ok(views)
  }
}
