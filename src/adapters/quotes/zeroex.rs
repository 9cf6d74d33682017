//! 0x Swap API Adapter
//!
//! Implements `QuoteProvider` over `GET /swap/v1/quote` on the Base
//! host. The response is executable as returned: `to`, `data` and
//! `value` are sent verbatim, `allowanceTarget` is the ERC-20 spender.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::client::QuoteHttpClient;
use super::types::ZeroExQuoteResponse;
use crate::domain::quote::{AggregatorQuote, LiquiditySource, SwapTransaction};
use crate::errors::QuoteError;
use crate::ports::quote_provider::{QuoteProvider, QuoteRequest};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "0x-api-key";
/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "ZEROX_API_KEY";

const FALLBACK_REASON: &str = "Error getting quote";

/// 0x quote adapter.
pub struct ZeroExClient {
  http: Arc<QuoteHttpClient>,
  base_url: String,
  api_key: Option<String>,
}

impl ZeroExClient {
  /// Create a new adapter. `api_key` is optional; keyless requests are
  /// heavily rate limited upstream.
  pub fn new(http: Arc<QuoteHttpClient>, base_url: impl Into<String>, api_key: Option<String>) -> Self {
    Self {
      http,
      base_url: base_url.into().trim_end_matches('/').to_string(),
      api_key: api_key.filter(|k| !k.is_empty()),
    }
  }

  /// Build from `ZEROX_API_KEY` in the environment.
  pub fn from_env(http: Arc<QuoteHttpClient>, base_url: impl Into<String>) -> Self {
    Self::new(http, base_url, std::env::var(API_KEY_ENV).ok())
  }

  /// Query string for a quote request.
  pub fn query_params(request: &QuoteRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
      ("sellToken", request.sell_token.zeroex_id()),
      ("buyToken", request.buy_token.zeroex_id()),
      ("sellAmount", request.sell_amount.to_string()),
      ("slippagePercentage", slippage_fraction(request.slippage_pct)),
    ];
    if let Some(taker) = request.taker {
      params.push(("takerAddress", taker.to_string()));
    }
    params
  }

  /// Convert a 0x response into the provider-neutral quote.
  pub fn into_quote(
    request: &QuoteRequest,
    response: ZeroExQuoteResponse,
  ) -> Result<AggregatorQuote, QuoteError> {
    let allowance_target = if request.sell_token.is_native() {
      None
    } else {
      response.allowance_target.filter(|a| *a != Address::ZERO)
    };

    let sources = response
      .sources
      .iter()
      .map(|s| LiquiditySource {
        name: s.name.clone(),
        proportion: s.proportion.value(),
      })
      .collect();

    Ok(AggregatorQuote {
      provider: "0x".to_string(),
      sell_amount: response.sell_amount.to_u256()?,
      buy_amount: response.buy_amount.to_u256()?,
      gas_estimate: response.estimated_gas.as_ref().and_then(|g| g.to_gas()),
      sources,
      transaction: Some(SwapTransaction {
        to: response.to,
        data: response.data,
        value: response.value.to_u256()?,
        allowance_target,
      }),
    })
  }
}

/// Percent to fraction with four decimals: `0.5` → `0.005`.
pub fn slippage_fraction(pct: Decimal) -> String {
  (pct / Decimal::ONE_HUNDRED)
    .round_dp(4)
    .normalize()
    .to_string()
}

#[async_trait]
impl QuoteProvider for ZeroExClient {
  fn name(&self) -> &'static str {
    "0x"
  }

  #[instrument(skip(self, request), fields(sell = %request.sell_token, buy = %request.buy_token))]
  async fn quote(&self, request: &QuoteRequest) -> Result<AggregatorQuote, QuoteError> {
    if request.sell_amount.is_zero() {
      return Err(QuoteError::InvalidRequest("sell amount is zero".to_string()));
    }

    let url = format!("{}/swap/v1/quote", self.base_url);
    let headers: Vec<(&'static str, String)> = self
      .api_key
      .iter()
      .map(|k| (API_KEY_HEADER, k.clone()))
      .collect();

    let response: ZeroExQuoteResponse = self
      .http
      .get_json(&url, &Self::query_params(request), &headers, FALLBACK_REASON)
      .await?;

    let quote = Self::into_quote(request, response)?;
    debug!(
      buy_amount = %quote.buy_amount,
      route = %quote.route_label(),
      "0x quote received"
    );
    Ok(quote)
  }
}
