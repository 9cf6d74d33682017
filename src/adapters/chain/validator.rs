//! Contract Validator - On-chain Verification
//!
//! Confirms the configured BaseFlow address points to deployed code
//! before any order is submitted to it.

use alloy::primitives::Address;
use alloy::providers::Provider;
use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

/// Result of validating a single contract.
#[derive(Debug)]
pub struct ValidationResult {
    /// Contract name for logging.
    pub name: String,
    /// Address that was validated.
    pub address: Address,
    /// Size of the deployed bytecode.
    pub code_size: usize,
}

impl ValidationResult {
    /// Whether the address holds contract code.
    pub fn has_code(&self) -> bool {
        self.code_size > 0
    }
}

/// Validates contract addresses against on-chain state.
pub struct ContractValidator<'a> {
    provider: &'a (dyn Provider + Send + Sync),
}

impl<'a> ContractValidator<'a> {
    /// Create a new validator with the given provider.
    pub fn new(provider: &'a (dyn Provider + Send + Sync)) -> Self {
        Self { provider }
    }

    /// Check that `address` has deployed code.
    ///
    /// Returns an error when it does not.
    #[instrument(skip(self))]
    pub async fn require_code(&self, name: &str, address: Address) -> Result<ValidationResult> {
        let code = self
            .provider
            .get_code_at(address)
            .await
            .with_context(|| format!("Failed to query code for {name}"))?;

        let result = ValidationResult {
            name: name.to_string(),
            address,
            code_size: code.len(),
        };

        if !result.has_code() {
            warn!(contract = name, %address, "Contract has no code, possible misconfiguration");
            anyhow::bail!("{name} at {address} has no deployed code");
        }

        info!(contract = name, %address, bytes = result.code_size, "Contract validated");
        Ok(result)
    }
}
