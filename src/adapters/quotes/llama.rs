//! DefiLlama Price Adapter
//!
//! Spot USD prices from `GET /prices/current/base:{a},base:{b}`.
//! Only used for valuations and the degraded estimate; never for
//! anything that ends up in a transaction.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::client::QuoteHttpClient;
use super::types::LlamaPriceResponse;
use crate::ports::price_oracle::PriceOracle;

/// DefiLlama chain prefix for Base.
pub const CHAIN_PREFIX: &str = "base";

/// Spot-price adapter.
pub struct LlamaPriceClient {
  http: Arc<QuoteHttpClient>,
  base_url: String,
}

impl LlamaPriceClient {
  /// Create a new adapter.
  pub fn new(http: Arc<QuoteHttpClient>, base_url: impl Into<String>) -> Self {
    Self {
      http,
      base_url: base_url.into().trim_end_matches('/').to_string(),
    }
  }

  /// `base:0x..,base:0x..` path segment.
  pub fn coins_path(tokens: &[Address]) -> String {
    tokens
      .iter()
      .map(|t| format!("{CHAIN_PREFIX}:{t}"))
      .collect::<Vec<_>>()
      .join(",")
  }

  /// Map a response back onto the requested addresses.
  ///
  /// Keys are matched case-insensitively; missing coins are omitted.
  pub fn extract_prices(
    tokens: &[Address],
    response: &LlamaPriceResponse,
  ) -> HashMap<Address, Decimal> {
    let by_key: HashMap<String, f64> = response
      .coins
      .iter()
      .map(|(k, v)| (k.to_ascii_lowercase(), v.price))
      .collect();

    tokens
      .iter()
      .filter_map(|t| {
        let key = format!("{CHAIN_PREFIX}:{t}").to_ascii_lowercase();
        let price = by_key.get(&key)?;
        let price = Decimal::from_str(&price.to_string()).ok()?;
        (price > Decimal::ZERO).then_some((*t, price))
      })
      .collect()
  }
}

#[async_trait]
impl PriceOracle for LlamaPriceClient {
  #[instrument(skip(self), fields(count = tokens.len()))]
  async fn usd_prices(&self, tokens: &[Address]) -> Result<HashMap<Address, Decimal>> {
    if tokens.is_empty() {
      return Ok(HashMap::new());
    }
    let url = format!("{}/prices/current/{}", self.base_url, Self::coins_path(tokens));
    let response: LlamaPriceResponse = self
      .http
      .get_json(&url, &[], &[], "Error getting prices")
      .await
      .context("Failed to fetch spot prices")?;

    let prices = Self::extract_prices(tokens, &response);
    debug!(found = prices.len(), "Spot prices fetched");
    Ok(prices)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::token::WETH_ADDRESS;
  use alloy::primitives::address;
  use rust_decimal_macros::dec;

  const USDC: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

  #[test]
  fn test_coins_path() {
    let path = LlamaPriceClient::coins_path(&[WETH_ADDRESS, USDC]);
    assert!(path.starts_with("base:0x4200000000000000000000000000000000000006,base:"));
  }

  #[test]
  fn test_extract_prices_case_insensitive() {
    let json = r#"{"coins":{
      "base:0x4200000000000000000000000000000000000006":{"price":2500.25},
      "base:0x833589fcd6edb6e08f4c7c32d4f71b54bda02913":{"price":0.9998}
    }}"#;
    let response: LlamaPriceResponse = serde_json::from_str(json).unwrap();
    let prices = LlamaPriceClient::extract_prices(&[WETH_ADDRESS, USDC], &response);
    assert_eq!(prices[&WETH_ADDRESS], dec!(2500.25));
    assert_eq!(prices[&USDC], dec!(0.9998));
  }

  #[test]
  fn test_missing_coin_is_omitted() {
    let response: LlamaPriceResponse = serde_json::from_str(r#"{"coins":{}}"#).unwrap();
    assert!(LlamaPriceClient::extract_prices(&[USDC], &response).is_empty());
  }
}
