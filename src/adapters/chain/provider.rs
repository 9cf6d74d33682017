//! Base RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Manages the connection to Base mainnet via alloy-rs.
//! Validates RPC connectivity at startup and exposes a shared provider
//! instance for all on-chain operations.
//!
//! When a signer key is present the provider is built with the
//! recommended fillers (nonce, gas, chain id) and an `EthereumWallet`,
//! so `send_transaction` signs locally before broadcasting.

use std::str::FromStr;
use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::config::NetworkConfig;

/// Environment variable holding the hex private key.
pub const PRIVATE_KEY_ENV: &str = "BASEFLOW_PRIVATE_KEY";

/// Shared Base RPC provider backed by alloy-rs 0.9.
///
/// Uses `dyn Provider` over a boxed transport for type erasure because
/// the filler stack differs between read-only and signing providers.
pub struct BaseProvider {
    /// The alloy HTTP provider (type-erased).
    provider: Arc<dyn Provider + Send + Sync>,
    /// Address of the local signer, if any.
    signer: Option<Address>,
}

impl BaseProvider {
    /// Connect to the configured RPC and validate the chain ID.
    ///
    /// `signer` enables transaction submission; without it the
    /// provider can only read.
    #[instrument(skip_all)]
    pub async fn connect(config: &NetworkConfig, signer: Option<PrivateKeySigner>) -> Result<Self> {
        let url: reqwest::Url = config.rpc_url.parse().context("Invalid RPC URL")?;
        let signer_address = signer.as_ref().map(|s| s.address());
        let client = RpcClient::new_http(url).boxed();

        let provider: Arc<dyn Provider + Send + Sync> = match signer {
            Some(signer) => Arc::new(
                ProviderBuilder::new()
                    .with_recommended_fillers()
                    .wallet(EthereumWallet::from(signer))
                    .on_client(client),
            ),
            None => Arc::new(ProviderBuilder::new().on_client(client)),
        };

        // Validate chain ID at startup
        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        if chain_id != config.chain_id {
            anyhow::bail!(
                "Expected chain_id={}, RPC reports {chain_id}",
                config.chain_id
            );
        }

        info!(chain_id, signer = ?signer_address, "Connected to Base RPC");

        Ok(Self {
            provider,
            signer: signer_address,
        })
    }

    /// Get a shared reference to the alloy provider (type-erased).
    pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
        Arc::clone(&self.provider)
    }

    /// Address of the local signer.
    pub fn signer_address(&self) -> Option<Address> {
        self.signer
    }
}

/// Load the signer from `BASEFLOW_PRIVATE_KEY`, if set.
///
/// An unset or empty variable means read-only mode; a malformed key
/// is an error rather than a silent downgrade.
pub fn signer_from_env() -> Result<Option<PrivateKeySigner>> {
    match std::env::var(PRIVATE_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => parse_signer(&key).map(Some),
        _ => Ok(None),
    }
}

/// Parse a hex private key, with or without `0x`.
pub fn parse_signer(key: &str) -> Result<PrivateKeySigner> {
    PrivateKeySigner::from_str(key.trim()).context("Invalid BASEFLOW_PRIVATE_KEY")
}
