//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `baseflow.toml`, applying environment overrides,
//! validating all parameters, and providing clear error messages
//! for misconfiguration.

use std::path::Path;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Environment variable overriding `contracts.baseflow`.
pub const ENV_CONTRACT_ADDRESS: &str = "BASEFLOW_CONTRACT_ADDRESS";
/// Environment variable overriding `network.rpc_url`.
pub const ENV_RPC_URL: &str = "BASEFLOW_RPC_URL";
/// Environment variable overriding `wallet.account`.
pub const ENV_ACCOUNT: &str = "BASEFLOW_ACCOUNT";

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the baseflow.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let mut config = parse_config(&content)?;
  apply_env_overrides(&mut config, |key| std::env::var(key).ok());
  validate_config(&config)?;

  info!(
    chain_id = config.network.chain_id,
    provider = ?config.quote.provider,
    contract = %config.contracts.baseflow,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse TOML content without validation.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  toml::from_str(content).context("Failed to parse baseflow.toml")
}

/// Overlay environment values on top of the file.
///
/// `lookup` abstracts `std::env::var` so overrides are testable.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
  F: Fn(&str) -> Option<String>,
{
  if let Some(addr) = lookup(ENV_CONTRACT_ADDRESS).filter(|v| !v.is_empty()) {
    config.contracts.baseflow = addr;
  }
  if let Some(url) = lookup(ENV_RPC_URL).filter(|v| !v.is_empty()) {
    config.network.rpc_url = url;
  }
  if let Some(account) = lookup(ENV_ACCOUNT).filter(|v| !v.is_empty()) {
    config.wallet.account = Some(account);
  }
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Parseable contract and account addresses
/// - Non-empty endpoints
/// - Sensible slippage, debounce and timeout ranges
pub fn validate_config(config: &AppConfig) -> Result<()> {
  // Network validation
  anyhow::ensure!(config.network.chain_id > 0, "chain_id must be positive");
  anyhow::ensure!(
    !config.network.rpc_url.is_empty(),
    "RPC URL must not be empty"
  );
  anyhow::ensure!(
    config.network.receipt_poll_interval_ms > 0,
    "receipt_poll_interval_ms must be positive"
  );

  // Contract validation
  config
    .contracts
    .baseflow
    .parse::<Address>()
    .with_context(|| format!("Invalid BaseFlow contract address: {}", config.contracts.baseflow))?;

  if let Some(account) = &config.wallet.account {
    account
      .parse::<Address>()
      .with_context(|| format!("Invalid wallet account: {account}"))?;
  }

  // Quote validation
  anyhow::ensure!(
    config.quote.default_slippage_pct > 0.0 && config.quote.default_slippage_pct <= 50.0,
    "default_slippage_pct must be in (0, 50], got {}",
    config.quote.default_slippage_pct
  );
  anyhow::ensure!(
    config.quote.debounce_ms <= 10_000,
    "debounce_ms must be at most 10000, got {}",
    config.quote.debounce_ms
  );
  anyhow::ensure!(config.quote.timeout_ms > 0, "timeout_ms must be positive");
  for (name, url) in [
    ("zeroex_url", &config.quote.zeroex_url),
    ("odos_url", &config.quote.odos_url),
    ("price_url", &config.quote.price_url),
  ] {
    anyhow::ensure!(!url.is_empty(), "{name} must not be empty");
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{LogFormat, ProviderKind};
  use rust_decimal_macros::dec;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_empty_file_uses_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config.network.chain_id, 8453);
    assert_eq!(config.quote.provider, ProviderKind::Zeroex);
    assert_eq!(config.quote.debounce_ms, 500);
    assert_eq!(config.quote.slippage_pct(), dec!(0.5));
    assert_eq!(config.app.log_format, LogFormat::Pretty);
    assert!(config.wallet.account.is_none());
    validate_config(&config).unwrap();
  }

  #[test]
  fn test_sections_override_defaults() {
    let config = parse_config(
      r#"
        [app]
        log_format = "json"

        [quote]
        provider = "odos"
        default_slippage_pct = 1.0
      "#,
    )
    .unwrap();
    assert_eq!(config.app.log_format, LogFormat::Json);
    assert_eq!(config.quote.provider, ProviderKind::Odos);
    assert_eq!(config.quote.slippage_pct(), dec!(1));
  }

  #[test]
  fn test_rejects_bad_contract_address() {
    let mut config = parse_config("").unwrap();
    config.contracts.baseflow = "0x1234".to_string();
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn test_rejects_out_of_range_slippage() {
    let mut config = parse_config("").unwrap();
    config.quote.default_slippage_pct = 75.0;
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn test_env_overrides() {
    let mut config = parse_config("").unwrap();
    apply_env_overrides(&mut config, |key| match key {
      ENV_RPC_URL => Some("http://localhost:8545".to_string()),
      ENV_ACCOUNT => Some("0x1111111111111111111111111111111111111111".to_string()),
      _ => None,
    });
    assert_eq!(config.network.rpc_url, "http://localhost:8545");
    assert!(config.wallet.account.is_some());
    validate_config(&config).unwrap();
  }
}
