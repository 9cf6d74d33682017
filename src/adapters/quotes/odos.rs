//! Odos SOR Adapter - Quote + Assemble
//!
//! Odos splits routing into two calls: `POST /sor/quote/v2` returns a
//! path and expected output, `POST /sor/assemble` turns the path into
//! a transaction for a specific account. Both are composed here into
//! the same `AggregatorQuote` shape the 0x adapter produces.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, instrument};

use super::client::QuoteHttpClient;
use super::types::{
  OdosAssembleRequest, OdosAssembleResponse, OdosInputToken, OdosOutputToken, OdosQuoteRequest,
  OdosQuoteResponse,
};
use crate::domain::quote::{AggregatorQuote, LiquiditySource, SwapTransaction};
use crate::errors::QuoteError;
use crate::ports::quote_provider::{QuoteProvider, QuoteRequest};

const QUOTE_FALLBACK: &str = "Error getting quote";
const ASSEMBLE_FALLBACK: &str = "Error assembling route";

/// Odos quote adapter.
pub struct OdosClient {
  http: Arc<QuoteHttpClient>,
  base_url: String,
  chain_id: u64,
}

impl OdosClient {
  /// Create a new adapter for `chain_id`.
  pub fn new(http: Arc<QuoteHttpClient>, base_url: impl Into<String>, chain_id: u64) -> Self {
    Self {
      http,
      base_url: base_url.into().trim_end_matches('/').to_string(),
      chain_id,
    }
  }

  /// Body for the quote step.
  pub fn quote_body(&self, request: &QuoteRequest) -> OdosQuoteRequest {
    OdosQuoteRequest {
      chain_id: self.chain_id,
      input_tokens: vec![OdosInputToken {
        token_address: request.sell_token.odos_address(),
        amount: request.sell_amount.to_string(),
      }],
      output_tokens: vec![OdosOutputToken {
        token_address: request.buy_token.odos_address(),
        proportion: 1,
      }],
      slippage_limit_percent: slippage_percent(request),
      user_addr: request.taker.unwrap_or(Address::ZERO),
      compact: true,
    }
  }

  /// Quote step only.
  #[instrument(skip(self, request), fields(sell = %request.sell_token, buy = %request.buy_token))]
  pub async fn quote_path(&self, request: &QuoteRequest) -> Result<OdosQuoteResponse, QuoteError> {
    if request.sell_amount.is_zero() {
      return Err(QuoteError::InvalidRequest("sell amount is zero".to_string()));
    }
    let url = format!("{}/sor/quote/v2", self.base_url);
    self
      .http
      .post_json(&url, &self.quote_body(request), QUOTE_FALLBACK)
      .await
  }

  /// Assembly step for a quoted path.
  pub async fn assemble(
    &self,
    path_id: &str,
    account: Address,
    request: &QuoteRequest,
  ) -> Result<OdosAssembleResponse, QuoteError> {
    let url = format!("{}/sor/assemble", self.base_url);
    let body = OdosAssembleRequest {
      path_id: path_id.to_string(),
      user_addr: account,
      receiver: account,
      slippage_limit_percent: slippage_percent(request),
    };
    self.http.post_json(&url, &body, ASSEMBLE_FALLBACK).await
  }

  /// Compose quote (and, when assembled, transaction) into the
  /// provider-neutral shape.
  pub fn compose(
    request: &QuoteRequest,
    quote: &OdosQuoteResponse,
    assembled: Option<OdosAssembleResponse>,
  ) -> Result<AggregatorQuote, QuoteError> {
    let transaction = match assembled {
      Some(a) => Some(SwapTransaction {
        to: a.transaction.to,
        data: a.transaction.data,
        value: a.transaction.value.to_u256()?,
        allowance_target: (!request.sell_token.is_native()).then_some(a.transaction.to),
      }),
      None => None,
    };

    Ok(AggregatorQuote {
      provider: "Odos".to_string(),
      sell_amount: quote.in_amount().unwrap_or(request.sell_amount),
      buy_amount: quote.out_amount()?,
      gas_estimate: quote.gas_estimate.as_ref().and_then(|g| g.to_gas()),
      sources: vec![LiquiditySource {
        name: "Odos".to_string(),
        proportion: 1.0,
      }],
      transaction,
    })
  }
}

fn slippage_percent(request: &QuoteRequest) -> f64 {
  request.slippage_pct.to_f64().unwrap_or(0.5)
}

#[async_trait]
impl QuoteProvider for OdosClient {
  fn name(&self) -> &'static str {
    "Odos"
  }

  async fn quote(&self, request: &QuoteRequest) -> Result<AggregatorQuote, QuoteError> {
    let quote = self.quote_path(request).await?;

    // Assembly is bound to an account; without one the route is display-only.
    let assembled = match (request.taker, quote.path_id.as_deref()) {
      (Some(account), Some(path_id)) => Some(self.assemble(path_id, account, request).await?),
      (Some(_), None) => {
        return Err(QuoteError::Malformed("Odos quote has no pathId".to_string()));
      }
      (None, _) => None,
    };

    let composed = Self::compose(request, &quote, assembled)?;
    debug!(
      buy_amount = %composed.buy_amount,
      executable = composed.transaction.is_some(),
      "Odos quote received"
    );
    Ok(composed)
  }

  async fn expected_output(&self, request: &QuoteRequest) -> Result<U256, QuoteError> {
    self.quote_path(request).await?.out_amount()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::token::{ODOS_NATIVE_ADDRESS, TokenRegistry};
  use rust_decimal_macros::dec;

  fn client() -> OdosClient {
    let http = QuoteHttpClient::new(Default::default()).unwrap();
    OdosClient::new(Arc::new(http), "https://api.odos.xyz/", 8453)
  }

  fn request(sell: &str, buy: &str) -> QuoteRequest {
    let registry = TokenRegistry::base();
    QuoteRequest {
      sell_token: registry.by_symbol(sell).unwrap().clone(),
      buy_token: registry.by_symbol(buy).unwrap().clone(),
      sell_amount: U256::from(5_000_000u64),
      slippage_pct: dec!(0.5),
      taker: Some(Address::repeat_byte(0x22)),
    }
  }

  fn quote_response() -> OdosQuoteResponse {
    serde_json::from_str(
      r#"{"pathId":"abc123","inAmounts":["5000000"],"outAmounts":["2000000000000000"],"gasEstimate":183000.5}"#,
    )
    .unwrap()
  }

  fn assemble_response() -> OdosAssembleResponse {
    serde_json::from_str(
      r#"{"transaction":{"to":"0x19ceead7105607cd444f5ad10dd51356436095a1","data":"0x83bd37f9","value":"0","gas":250000}}"#,
    )
    .unwrap()
  }

  #[test]
  fn test_quote_body_uses_native_sentinel() {
    let body = client().quote_body(&request("USDC", "ETH"));
    assert_eq!(body.output_tokens[0].token_address, ODOS_NATIVE_ADDRESS);
    assert_eq!(body.input_tokens[0].amount, "5000000");
    assert_eq!(body.user_addr, Address::repeat_byte(0x22));
    assert!(body.compact);
  }

  #[test]
  fn test_compose_assembled() {
    let req = request("USDC", "ETH");
    let quote = OdosClient::compose(&req, &quote_response(), Some(assemble_response())).unwrap();
    let tx = quote.transaction.unwrap();
    assert_eq!(tx.allowance_target, Some(tx.to));
    assert_eq!(quote.buy_amount, U256::from(2_000_000_000_000_000u64));
    assert_eq!(quote.gas_estimate, Some(183_001));
    assert_eq!(quote.sources[0].name, "Odos");
  }

  #[test]
  fn test_compose_native_sell_has_no_spender() {
    let req = request("ETH", "USDC");
    let quote = OdosClient::compose(&req, &quote_response(), Some(assemble_response())).unwrap();
    assert_eq!(quote.transaction.unwrap().allowance_target, None);
  }

  #[test]
  fn test_compose_without_assembly() {
    let req = request("USDC", "ETH");
    let quote = OdosClient::compose(&req, &quote_response(), None).unwrap();
    assert!(quote.transaction.is_none());
    assert_eq!(quote.sell_amount, U256::from(5_000_000u64));
  }
}
