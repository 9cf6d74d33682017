//! Quote Provider Port - DEX Aggregator Interface
//!
//! One implementation per aggregator (0x, Odos). Each returns the
//! provider-neutral `AggregatorQuote`; an executable quote carries
//! the transaction payload the swap form submits verbatim.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::quote::AggregatorQuote;
use crate::domain::token::Token;
use crate::errors::QuoteError;

/// Parameters of a single quote request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
  /// Token being sold.
  pub sell_token: Token,
  /// Token being bought.
  pub buy_token: Token,
  /// Sell amount in base units.
  pub sell_amount: U256,
  /// Slippage tolerance in percent (0.5 = 0.5%).
  pub slippage_pct: Decimal,
  /// Account that will execute the swap, if connected.
  pub taker: Option<Address>,
}

/// Trait for DEX aggregation services.
#[async_trait]
pub trait QuoteProvider: Send + Sync + 'static {
  /// Provider label used in logs and route descriptions.
  fn name(&self) -> &'static str;

  /// Fetch the best route for `request`.
  ///
  /// # Errors
  /// Returns `QuoteError::Upstream` with the provider's reason when
  /// the aggregator rejects the request.
  async fn quote(&self, request: &QuoteRequest) -> Result<AggregatorQuote, QuoteError>;

  /// Expected output only, without building a transaction.
  ///
  /// Providers with a separate assembly step override this to skip it.
  async fn expected_output(&self, request: &QuoteRequest) -> Result<U256, QuoteError> {
    Ok(self.quote(request).await?.buy_amount)
  }
}
