//! Quote API Request/Response Types
//!
//! Serialization types for the 0x Swap API, the Odos SOR API and the
//! DefiLlama coins API. Amounts arrive as decimal strings (sometimes
//! as bare JSON numbers) and are converted to `U256` at the edge.

use std::collections::HashMap;
use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::errors::QuoteError;

/// Integer amount encoded either as a string or as a JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
  /// `"123"` or `"0x7b"`.
  Text(String),
  /// `123`.
  Number(serde_json::Number),
}

impl NumericField {
  /// Parse as base units.
  pub fn to_u256(&self) -> Result<U256, QuoteError> {
    let text = match self {
      Self::Text(s) => s.clone(),
      Self::Number(n) => n.to_string(),
    };
    U256::from_str(text.trim())
      .map_err(|_| QuoteError::Malformed(format!("not an integer amount: {text}")))
  }

  /// Parse as a gas figure, tolerating fractional estimates.
  pub fn to_gas(&self) -> Option<u64> {
    match self {
      Self::Text(s) => s.trim().parse::<u64>().ok(),
      Self::Number(n) => n
        .as_u64()
        .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.ceil() as u64)),
    }
  }
}

impl Default for NumericField {
  fn default() -> Self {
    Self::Text("0".to_string())
  }
}

/// Error body shared (loosely) by 0x and Odos.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
  /// 0x top-level reason.
  pub reason: Option<String>,
  /// 0x per-field validation errors.
  #[serde(default)]
  pub validation_errors: Vec<ValidationError>,
  /// Generic message.
  pub message: Option<String>,
  /// Odos error detail.
  pub detail: Option<String>,
}

/// A single 0x validation failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationError {
  /// Offending field.
  pub field: Option<String>,
  /// Reason code.
  pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// 0x
// ---------------------------------------------------------------------------

/// Response from `GET /swap/v1/quote`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroExQuoteResponse {
  /// Expected output in base units.
  pub buy_amount: NumericField,
  /// Input in base units.
  pub sell_amount: NumericField,
  /// Transaction target.
  pub to: Address,
  /// Calldata.
  pub data: Bytes,
  /// Native value to attach.
  #[serde(default)]
  pub value: NumericField,
  /// ERC-20 spender; zero for native sells.
  pub allowance_target: Option<Address>,
  /// Gas estimate.
  pub estimated_gas: Option<NumericField>,
  /// Liquidity breakdown.
  #[serde(default)]
  pub sources: Vec<ZeroExSource>,
}

/// One liquidity source in a 0x route.
#[derive(Debug, Clone, Deserialize)]
pub struct ZeroExSource {
  /// Source name (e.g. `Uniswap_V3`).
  pub name: String,
  /// Share of the route, as a decimal string.
  pub proportion: ProportionField,
}

/// Proportion sent either as `"0.25"` or `0.25`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ProportionField {
  /// String form.
  Text(String),
  /// Number form.
  Number(f64),
}

impl ProportionField {
  /// Proportion as a float; unparsable values count as zero.
  pub fn value(&self) -> f64 {
    match self {
      Self::Text(s) => s.parse().unwrap_or(0.0),
      Self::Number(n) => *n,
    }
  }
}

// ---------------------------------------------------------------------------
// Odos
// ---------------------------------------------------------------------------

/// Body for `POST /sor/quote/v2`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosQuoteRequest {
  /// Chain ID (8453).
  pub chain_id: u64,
  /// Single input leg.
  pub input_tokens: Vec<OdosInputToken>,
  /// Single output leg with proportion 1.
  pub output_tokens: Vec<OdosOutputToken>,
  /// Slippage in percent.
  pub slippage_limit_percent: f64,
  /// Requesting account.
  pub user_addr: Address,
  /// Request compact calldata.
  pub compact: bool,
}

/// Input leg.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosInputToken {
  /// Token address (native sentinel for ETH).
  pub token_address: Address,
  /// Amount in base units.
  pub amount: String,
}

/// Output leg.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosOutputToken {
  /// Token address (native sentinel for ETH).
  pub token_address: Address,
  /// Share of output.
  pub proportion: u32,
}

/// Response from `POST /sor/quote/v2`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosQuoteResponse {
  /// Route identifier for assembly.
  pub path_id: Option<String>,
  /// Input amounts.
  #[serde(default)]
  pub in_amounts: Vec<NumericField>,
  /// Output amounts.
  #[serde(default)]
  pub out_amounts: Vec<NumericField>,
  /// Output legs (older response shape).
  #[serde(default)]
  pub output_tokens: Vec<OdosTokenAmount>,
  /// Gas estimate.
  pub gas_estimate: Option<NumericField>,
}

/// Token and amount pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosTokenAmount {
  /// Token address.
  pub token_address: Option<Address>,
  /// Amount in base units.
  pub amount: NumericField,
}

impl OdosQuoteResponse {
  /// First output amount.
  pub fn out_amount(&self) -> Result<U256, QuoteError> {
    self
      .out_amounts
      .first()
      .or_else(|| self.output_tokens.first().map(|t| &t.amount))
      .ok_or_else(|| QuoteError::Malformed("Odos quote has no output amount".to_string()))?
      .to_u256()
  }

  /// First input amount, if echoed.
  pub fn in_amount(&self) -> Option<U256> {
    self.in_amounts.first().and_then(|a| a.to_u256().ok())
  }
}

/// Body for `POST /sor/assemble`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosAssembleRequest {
  /// Route identifier from the quote step.
  pub path_id: String,
  /// Sender.
  pub user_addr: Address,
  /// Output recipient.
  pub receiver: Address,
  /// Slippage in percent.
  pub slippage_limit_percent: f64,
}

/// Response from `POST /sor/assemble`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosAssembleResponse {
  /// Ready-to-send transaction.
  pub transaction: OdosTransaction,
}

/// Transaction emitted by Odos assembly.
#[derive(Debug, Clone, Deserialize)]
pub struct OdosTransaction {
  /// Odos router.
  pub to: Address,
  /// Calldata.
  pub data: Bytes,
  /// Native value.
  #[serde(default)]
  pub value: NumericField,
  /// Gas limit suggested by Odos.
  pub gas: Option<NumericField>,
}

// ---------------------------------------------------------------------------
// DefiLlama
// ---------------------------------------------------------------------------

/// Response from `GET /prices/current/{coins}`.
#[derive(Debug, Clone, Deserialize)]
pub struct LlamaPriceResponse {
  /// Keyed by `base:{address}`.
  #[serde(default)]
  pub coins: HashMap<String, LlamaCoin>,
}

/// Price entry for one coin.
#[derive(Debug, Clone, Deserialize)]
pub struct LlamaCoin {
  /// USD price.
  pub price: f64,
  /// Symbol reported by the service.
  pub symbol: Option<String>,
  /// Confidence score.
  pub confidence: Option<f64>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_numeric_field_forms() {
    let text: NumericField = serde_json::from_str(r#""1000000""#).unwrap();
    assert_eq!(text.to_u256().unwrap(), U256::from(1_000_000u64));

    let num: NumericField = serde_json::from_str("42").unwrap();
    assert_eq!(num.to_u256().unwrap(), U256::from(42u64));

    let float: NumericField = serde_json::from_str("181234.7").unwrap();
    assert_eq!(float.to_gas(), Some(181_235));
    assert!(float.to_u256().is_err());
  }

  #[test]
  fn test_zeroex_quote_deserialization() {
    let json = r#"{
      "price": "2500.1",
      "buyAmount": "2500100000",
      "sellAmount": "1000000000000000000",
      "to": "0xdef1c0ded9bec7f1a1670819833240f027b25eff",
      "data": "0xd9627aa4",
      "value": "1000000000000000000",
      "allowanceTarget": "0x0000000000000000000000000000000000000000",
      "estimatedGas": "150000",
      "sources": [
        {"name": "Uniswap_V3", "proportion": "0.8"},
        {"name": "Aerodrome", "proportion": "0.2"},
        {"name": "Curve", "proportion": "0"}
      ]
    }"#;
    let resp: ZeroExQuoteResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.buy_amount.to_u256().unwrap(), U256::from(2_500_100_000u64));
    assert_eq!(resp.estimated_gas.unwrap().to_gas(), Some(150_000));
    assert_eq!(resp.sources.len(), 3);
    assert!((resp.sources[0].proportion.value() - 0.8).abs() < f64::EPSILON);
    assert_eq!(resp.allowance_target, Some(Address::ZERO));
  }

  #[test]
  fn test_odos_quote_request_shape() {
    let req = OdosQuoteRequest {
      chain_id: 8453,
      input_tokens: vec![OdosInputToken {
        token_address: Address::ZERO,
        amount: "100".to_string(),
      }],
      output_tokens: vec![OdosOutputToken {
        token_address: Address::ZERO,
        proportion: 1,
      }],
      slippage_limit_percent: 0.5,
      user_addr: Address::ZERO,
      compact: true,
    };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["chainId"], 8453);
    assert_eq!(json["inputTokens"][0]["amount"], "100");
    assert_eq!(json["outputTokens"][0]["proportion"], 1);
    assert_eq!(json["slippageLimitPercent"], 0.5);
    assert_eq!(json["compact"], true);
  }

  #[test]
  fn test_odos_out_amount_fallback() {
    let resp: OdosQuoteResponse =
      serde_json::from_str(r#"{"outputTokens":[{"tokenAddress":"0x4200000000000000000000000000000000000006","amount":"77"}]}"#)
        .unwrap();
    assert_eq!(resp.out_amount().unwrap(), U256::from(77u64));

    let empty: OdosQuoteResponse = serde_json::from_str("{}").unwrap();
    assert!(empty.out_amount().is_err());
  }

  #[test]
  fn test_llama_response() {
    let json = r#"{"coins":{"base:0x4200000000000000000000000000000000000006":{"decimals":18,"symbol":"WETH","price":2501.5,"timestamp":1700000000,"confidence":0.99}}}"#;
    let resp: LlamaPriceResponse = serde_json::from_str(json).unwrap();
    let coin = &resp.coins["base:0x4200000000000000000000000000000000000006"];
    assert_eq!(coin.symbol.as_deref(), Some("WETH"));
    assert!((coin.price - 2501.5).abs() < f64::EPSILON);
  }
}
