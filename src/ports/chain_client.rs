//! Chain Client Port - Wallet Session and On-chain Interaction
//!
//! The wallet/session boundary: connection state, read-only view
//! calls, native balance, signing + broadcast, and receipt polling.
//! Contract-specific encoding lives in `usecases::contract`, so this
//! port stays ABI-agnostic.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;

use crate::domain::quote::{PreparedTx, TxOutcome};

/// Trait for on-chain interactions via alloy-rs.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
  /// Connected account, `None` when disconnected.
  fn account(&self) -> Option<Address>;

  /// Whether the session can sign transactions.
  fn can_sign(&self) -> bool;

  /// Execute a read-only `eth_call` and return the raw result.
  async fn call(&self, to: Address, data: Bytes) -> anyhow::Result<Bytes>;

  /// Native balance of `owner` in wei.
  async fn native_balance(&self, owner: Address) -> anyhow::Result<U256>;

  /// Sign and broadcast a transaction from the connected account.
  ///
  /// # Errors
  /// Fails if the session cannot sign or the node rejects the transaction.
  async fn send_transaction(&self, tx: &PreparedTx) -> anyhow::Result<TxHash>;

  /// Wait until the transaction is mined and report its status.
  async fn wait_for_receipt(&self, hash: TxHash) -> anyhow::Result<TxOutcome>;

  /// Check if the RPC connection is healthy.
  async fn is_healthy(&self) -> bool;
}
