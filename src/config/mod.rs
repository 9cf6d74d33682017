//! Configuration Module - TOML-based Client Configuration
//!
//! Loads and validates configuration from `baseflow.toml` with
//! environment variable overrides via `.env` files.
//! Contract addresses and service endpoints are externalized here;
//! secrets (private key, API keys) only ever come from the environment.

pub mod loader;

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Top-level client configuration.
///
/// Loaded from `baseflow.toml` at startup. All fields are validated
/// before any command runs.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Identity and logging.
  #[serde(default)]
  pub app: AppSection,
  /// Chain connection.
  #[serde(default)]
  pub network: NetworkConfig,
  /// BaseFlow contract address.
  #[serde(default)]
  pub contracts: ContractConfig,
  /// Quote services.
  #[serde(default)]
  pub quote: QuoteConfig,
  /// Wallet session.
  #[serde(default)]
  pub wallet: WalletConfig,
}

/// Identity and logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
  /// Human-readable client name.
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Log output format.
  #[serde(default)]
  pub log_format: LogFormat,
}

/// Log line format written to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
  /// Human-readable lines.
  #[default]
  Pretty,
  /// One JSON object per line.
  Json,
}

/// Chain connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
  /// Expected chain ID (Base mainnet = 8453).
  #[serde(default = "default_chain_id")]
  pub chain_id: u64,
  /// JSON-RPC endpoint.
  #[serde(default = "default_rpc_url")]
  pub rpc_url: String,
  /// Maximum wait for a transaction receipt (seconds).
  #[serde(default = "default_receipt_timeout")]
  pub receipt_timeout_secs: u64,
  /// Receipt polling interval (milliseconds).
  #[serde(default = "default_receipt_poll")]
  pub receipt_poll_interval_ms: u64,
}

/// Contract address configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
  /// BaseFlow order-management contract.
  #[serde(default = "default_baseflow_address")]
  pub baseflow: String,
}

/// Which aggregator produces executable quotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
  /// 0x Swap API.
  #[default]
  Zeroex,
  /// Odos smart order router (quote + assemble).
  Odos,
}

impl FromStr for ProviderKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "zeroex" | "0x" => Ok(Self::Zeroex),
      "odos" => Ok(Self::Odos),
      other => Err(format!("unknown quote provider '{other}' (zeroex, odos)")),
    }
  }
}

/// Quote service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteConfig {
  /// Aggregator used for swaps.
  #[serde(default)]
  pub provider: ProviderKind,
  /// 0x API base URL (Base host).
  #[serde(default = "default_zeroex_url")]
  pub zeroex_url: String,
  /// Odos API base URL.
  #[serde(default = "default_odos_url")]
  pub odos_url: String,
  /// DefiLlama coins API base URL.
  #[serde(default = "default_price_url")]
  pub price_url: String,
  /// Default slippage tolerance in percent.
  #[serde(default = "default_slippage")]
  pub default_slippage_pct: f64,
  /// Quiet period before an edited form is re-quoted (milliseconds).
  #[serde(default = "default_debounce")]
  pub debounce_ms: u64,
  /// HTTP request timeout (milliseconds).
  #[serde(default = "default_timeout")]
  pub timeout_ms: u64,
}

impl QuoteConfig {
  /// Default slippage as an exact decimal.
  pub fn slippage_pct(&self) -> Decimal {
    Decimal::from_str(&self.default_slippage_pct.to_string()).unwrap_or_else(|_| Decimal::new(5, 1))
  }
}

/// Wallet session configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
  /// Read-only account used when no signer key is provided.
  pub account: Option<String>,
}

impl Default for AppSection {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
      log_format: LogFormat::default(),
    }
  }
}

impl Default for NetworkConfig {
  fn default() -> Self {
    Self {
      chain_id: default_chain_id(),
      rpc_url: default_rpc_url(),
      receipt_timeout_secs: default_receipt_timeout(),
      receipt_poll_interval_ms: default_receipt_poll(),
    }
  }
}

impl Default for ContractConfig {
  fn default() -> Self {
    Self {
      baseflow: default_baseflow_address(),
    }
  }
}

impl Default for QuoteConfig {
  fn default() -> Self {
    Self {
      provider: ProviderKind::default(),
      zeroex_url: default_zeroex_url(),
      odos_url: default_odos_url(),
      price_url: default_price_url(),
      default_slippage_pct: default_slippage(),
      debounce_ms: default_debounce(),
      timeout_ms: default_timeout(),
    }
  }
}

// Default value functions for serde

fn default_name() -> String {
  "baseflow".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_chain_id() -> u64 {
  8453
}

fn default_rpc_url() -> String {
  "https://mainnet.base.org".to_string()
}

fn default_receipt_timeout() -> u64 {
  120
}

fn default_receipt_poll() -> u64 {
  2_000
}

fn default_baseflow_address() -> String {
  "0x2314197354797917EE7C22eBdc61dB32dcDEf30B".to_string()
}

fn default_zeroex_url() -> String {
  "https://base.api.0x.org".to_string()
}

fn default_odos_url() -> String {
  "https://api.odos.xyz".to_string()
}

fn default_price_url() -> String {
  "https://coins.llama.fi".to_string()
}

fn default_slippage() -> f64 {
  0.5
}

fn default_debounce() -> u64 {
  500
}

fn default_timeout() -> u64 {
  10_000
}
