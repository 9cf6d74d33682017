//! Wallet Balances - Cached Token Balances for the Connected Account
//!
//! Balances shown next to the form inputs are refetched at most every
//! 15 seconds. Queries go through `BaseFlowContract::token_balance`
//! (native balance for ETH, `balanceOf` otherwise).

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::contract::BaseFlowContract;
use crate::domain::display::format_balance;
use crate::domain::token::Token;
use crate::domain::units;
use crate::ports::chain_client::ChainClient;

/// Default cache age before a balance is refetched.
pub const DEFAULT_BALANCE_TTL_SECS: i64 = 15;

/// Cached balance entry with staleness tracking.
#[derive(Debug, Clone)]
struct CachedBalance {
  value: U256,
  updated_at: DateTime<Utc>,
}

impl CachedBalance {
  fn is_stale(&self, max_age_secs: i64) -> bool {
    let age = Utc::now() - self.updated_at;
    age.num_seconds() >= max_age_secs
  }
}

/// Balance cache keyed by token address.
pub struct WalletBalances<C: ChainClient> {
  contract: Arc<BaseFlowContract<C>>,
  cache: RwLock<HashMap<Address, CachedBalance>>,
  cache_ttl_secs: i64,
}

impl<C: ChainClient> WalletBalances<C> {
  /// Create with the default 15 s TTL.
  pub fn new(contract: Arc<BaseFlowContract<C>>) -> Self {
    Self::with_cache_ttl(contract, DEFAULT_BALANCE_TTL_SECS)
  }

  /// Create with custom cache TTL.
  pub fn with_cache_ttl(contract: Arc<BaseFlowContract<C>>, cache_ttl_secs: i64) -> Self {
    Self {
      contract,
      cache: RwLock::new(HashMap::new()),
      cache_ttl_secs,
    }
  }

  /// Balance of the connected account in `token`, using cache if fresh.
  pub async fn balance(&self, token: &Token) -> Result<U256> {
    let owner = self
      .contract
      .chain()
      .account()
      .context("No account connected")?;

    {
      let cache = self.cache.read().await;
      if let Some(cached) = cache.get(&token.address) {
        if !cached.is_stale(self.cache_ttl_secs) {
          return Ok(cached.value);
        }
      }
    }

    let value = self
      .contract
      .token_balance(token, owner)
      .await
      .with_context(|| format!("Failed to query {token} balance"))?;
    debug!(token = %token, %value, "Balance refreshed");

    {
      let mut cache = self.cache.write().await;
      cache.insert(
        token.address,
        CachedBalance {
          value,
          updated_at: Utc::now(),
        },
      );
    }

    Ok(value)
  }

  /// Display string for the balance; `0.00` when it cannot be read.
  pub async fn display_balance(&self, token: &Token) -> String {
    let value = self.balance(token).await.ok();
    format_balance(value.and_then(|v| units::to_decimal(v, token.decimals)))
  }

  /// Drop all cached balances, e.g. after a confirmed transaction.
  pub async fn invalidate(&self) {
    self.cache.write().await.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cached_balance_staleness() {
    let fresh = CachedBalance {
      value: U256::from(100u64),
      updated_at: Utc::now(),
    };
    assert!(!fresh.is_stale(15));

    let old = CachedBalance {
      value: U256::from(100u64),
      updated_at: Utc::now() - chrono::Duration::seconds(20),
    };
    assert!(old.is_stale(15));
  }
}
