//! Price Oracle Port - Spot USD Prices
//!
//! Used for USD valuations next to a quote and as the non-executable
//! fallback estimate when the aggregator is unavailable.

use std::collections::HashMap;

use alloy::primitives::Address;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait for spot-price lookups by token address.
#[async_trait]
pub trait PriceOracle: Send + Sync + 'static {
  /// USD price per whole token for each address the service knows.
  ///
  /// Addresses missing from the result have no known price.
  async fn usd_prices(&self, tokens: &[Address]) -> anyhow::Result<HashMap<Address, Decimal>>;
}
