//! Wallet Client - `ChainClient` over the alloy Provider
//!
//! Read calls go through `eth_call`; writes are signed by the wallet
//! filler on the provider and broadcast as-is. Receipts are polled
//! until mined or until the configured timeout elapses.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use super::provider::BaseProvider;
use crate::config::NetworkConfig;
use crate::domain::quote::{PreparedTx, TxOutcome};
use crate::ports::chain_client::ChainClient;

/// Connected wallet session.
pub struct WalletClient {
    provider: Arc<dyn Provider + Send + Sync>,
    account: Option<Address>,
    can_sign: bool,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl WalletClient {
    /// Build a session from a connected provider.
    ///
    /// The signer address wins over `read_only_account`; with neither
    /// the session is disconnected.
    pub fn new(base: &BaseProvider, read_only_account: Option<Address>, network: &NetworkConfig) -> Self {
        let signer = base.signer_address();
        Self {
            provider: base.inner(),
            account: signer.or(read_only_account),
            can_sign: signer.is_some(),
            receipt_timeout: Duration::from_secs(network.receipt_timeout_secs),
            poll_interval: Duration::from_millis(network.receipt_poll_interval_ms),
        }
    }
}

#[async_trait]
impl ChainClient for WalletClient {
    fn account(&self) -> Option<Address> {
        self.account
    }

    fn can_sign(&self) -> bool {
        self.can_sign
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest::default().to(to).input(data.into());
        self.provider
            .call(&tx)
            .await
            .with_context(|| format!("eth_call to {to} failed"))
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .context("Balance query failed")
    }

    #[instrument(skip(self, tx), fields(label = %tx.label, to = %tx.to))]
    async fn send_transaction(&self, tx: &PreparedTx) -> Result<TxHash> {
        let from = match (self.can_sign, self.account) {
            (true, Some(account)) => account,
            _ => anyhow::bail!("No signer configured; set BASEFLOW_PRIVATE_KEY"),
        };

        let request = TransactionRequest::default()
            .from(from)
            .to(tx.to)
            .input(tx.data.clone().into())
            .value(tx.value);

        let pending = self
            .provider
            .send_transaction(request)
            .await
            .with_context(|| format!("Failed to submit {} transaction", tx.label))?;

        let hash = *pending.tx_hash();
        info!(%hash, "Transaction submitted");
        Ok(hash)
    }

    #[instrument(skip(self))]
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxOutcome> {
        let deadline = Instant::now() + self.receipt_timeout;

        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(hash)
                .await
                .context("Receipt query failed")?;

            if let Some(receipt) = receipt {
                let outcome = TxOutcome {
                    hash,
                    success: receipt.status(),
                    block_number: receipt.block_number,
                };
                if outcome.success {
                    info!(block = ?outcome.block_number, "Transaction confirmed");
                } else {
                    warn!(block = ?outcome.block_number, "Transaction reverted");
                }
                return Ok(outcome);
            }

            if Instant::now() >= deadline {
                anyhow::bail!(
                    "Timed out after {}s waiting for receipt of {hash}",
                    self.receipt_timeout.as_secs()
                );
            }

            debug!("Receipt pending");
            sleep(self.poll_interval).await;
        }
    }

    async fn is_healthy(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}
