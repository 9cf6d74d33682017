//! DCA Orders - Form, Creation, Cancellation and Listing
//!
//! A DCA order locks `total` of token in at the BaseFlow contract,
//! which the keepers then sell in `intervals` equal slices. Only the
//! order record lives here; cadence is enforced on-chain.

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::contract::BaseFlowContract;
use crate::domain::order::{DcaInterval, DcaOrderView, amount_per_interval};
use crate::domain::quote::TxOutcome;
use crate::domain::token::{Token, TokenRegistry};
use crate::domain::units;
use crate::errors::ExecutionError;
use crate::ports::chain_client::ChainClient;

/// Allowed interval counts.
pub const INTERVAL_RANGE: std::ops::RangeInclusive<u32> = 2..=365;

/// Default interval count.
pub const DEFAULT_INTERVALS: u32 = 30;

/// Shown when only the approval was sent.
pub const APPROVAL_NOTICE: &str = "Approval requested; re-run to create the order";

/// Result of a create attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
  /// The allowance was short; only `approve` was sent.
  ApprovalRequested(TxOutcome),
  /// The order transaction confirmed.
  Submitted(TxOutcome),
}

/// Editable DCA state.
#[derive(Debug, Clone)]
pub struct DcaForm {
  pub token_in: Token,
  pub token_out: Token,
  pub total_amount: String,
  pub intervals: u32,
  pub interval: DcaInterval,
}

impl DcaForm {
  /// ETH → USDC, 30 daily buys.
  pub fn new(registry: &TokenRegistry) -> Self {
    let token_in = registry.by_address(Address::ZERO);
    let token_out = registry
      .by_symbol("USDC")
      .cloned()
      .unwrap_or_else(|| token_in.clone());
    Self {
      token_in,
      token_out,
      total_amount: String::new(),
      intervals: DEFAULT_INTERVALS,
      interval: DcaInterval::default(),
    }
  }

  /// Per-interval amount with 6 decimals, `None` while the total is blank.
  pub fn amount_per_interval(&self) -> Option<String> {
    let total = Decimal::from_str(self.total_amount.trim()).ok()?;
    Some(amount_per_interval(total, self.intervals))
  }

  /// Validated total in base units.
  pub fn total_units(&self) -> Result<U256, ExecutionError> {
    if !INTERVAL_RANGE.contains(&self.intervals) {
      return Err(ExecutionError::InvalidInput(format!(
        "intervals must be between {} and {}, got {}",
        INTERVAL_RANGE.start(),
        INTERVAL_RANGE.end(),
        self.intervals
      )));
    }
    if self.token_in.address == self.token_out.address {
      return Err(ExecutionError::InvalidInput(
        "token in and token out must differ".to_string(),
      ));
    }
    let total = units::parse_amount(&self.total_amount, self.token_in.decimals)
      .map_err(|e| ExecutionError::InvalidInput(e.to_string()))?;
    if total.is_zero() {
      return Err(ExecutionError::InvalidInput("total amount must be positive".to_string()));
    }
    Ok(total)
  }
}

/// Creates, cancels and lists DCA orders for the connected account.
pub struct DcaService<C: ChainClient> {
  contract: Arc<BaseFlowContract<C>>,
  registry: TokenRegistry,
}

impl<C: ChainClient> DcaService<C> {
  /// Create a new service.
  pub fn new(contract: Arc<BaseFlowContract<C>>, registry: TokenRegistry) -> Self {
    Self { contract, registry }
  }

  /// Approve BaseFlow if the allowance is short, otherwise create the order.
  #[instrument(skip(self, form), fields(token_in = %form.token_in, token_out = %form.token_out))]
  pub async fn create(&self, form: &DcaForm) -> Result<SubmitOutcome, ExecutionError> {
    let owner = self.contract.signer()?;
    let total = form.total_units()?;
    let spender = self.contract.address();

    if self
      .contract
      .needs_approval(&form.token_in, owner, spender, total)
      .await?
    {
      let approve = self.contract.approve_tx(&form.token_in, spender, total);
      let outcome = self.contract.submit_approval(&approve).await?;
      info!(hash = %outcome.hash, "DCA approval confirmed");
      return Ok(SubmitOutcome::ApprovalRequested(outcome));
    }

    let tx = self.contract.create_dca_tx(
      &form.token_in,
      &form.token_out,
      total,
      form.intervals,
      form.interval.seconds(),
    );
    let outcome = self.contract.submit(&tx).await?;
    info!(hash = %outcome.hash, "DCA order created");
    Ok(SubmitOutcome::Submitted(outcome))
  }

  /// Cancel order `order_id`.
  #[instrument(skip(self))]
  pub async fn cancel(&self, order_id: U256) -> Result<TxOutcome, ExecutionError> {
    self.contract.signer()?;
    self.contract.submit(&self.contract.cancel_dca_tx(order_id)).await
  }

  /// Active orders of `user`.
  ///
  /// Records that fail to load are skipped with a warning.
  #[instrument(skip(self))]
  pub async fn list(&self, user: Address, now: DateTime<Utc>) -> anyhow::Result<Vec<DcaOrderView>> {
    let ids = self.contract.user_dca_order_ids(user).await?;
    let mut views = Vec::with_capacity(ids.len());
    for id in ids {
      match self.contract.dca_order(id).await {
        Ok(record) => {
          let view = DcaOrderView::from_record(id, &record, &self.registry, now);
          if view.active {
            views.push(view);
          }
        }
        Err(e) => warn!(%id, error = %e, "Failed to load DCA order"),
      }
    }
    Ok(views)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form(total: &str, intervals: u32) -> DcaForm {
    let mut f = DcaForm::new(&TokenRegistry::base());
    f.total_amount = total.to_string();
    f.intervals = intervals;
    f
  }

  #[test]
  fn test_defaults() {
    let f = DcaForm::new(&TokenRegistry::base());
    assert_eq!(f.intervals, 30);
    assert_eq!(f.interval, DcaInterval::Daily);
    assert_eq!(f.token_in.symbol, "ETH");
  }

  #[test]
  fn test_amount_per_interval_display() {
    assert_eq!(form("1", 30).amount_per_interval().as_deref(), Some("0.033333"));
    assert_eq!(form("", 30).amount_per_interval(), None);
  }

  #[test]
  fn test_interval_bounds() {
    assert!(form("1", 1).total_units().is_err());
    assert!(form("1", 366).total_units().is_err());
    assert!(form("1", 365).total_units().is_ok());
  }

  #[test]
  fn test_rejects_zero_total() {
    assert!(form("0", 30).total_units().is_err());
    assert!(form("abc", 30).total_units().is_err());
  }
}
