//! BaseFlow Contract Access - Typed Views and Transaction Builders
//!
//! Encodes `IBaseFlow` / `IERC20` calls with the `sol!` bindings and
//! sends them through the ABI-agnostic `ChainClient` port. Builders
//! return `PreparedTx` values so forms can show them before signing.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::domain::abi::{IBaseFlow, IERC20};
use crate::domain::order::{TriggerKind, TriggerOrderRecord};
use crate::domain::quote::{PreparedTx, TxOutcome};
use crate::domain::token::Token;
use crate::errors::ExecutionError;
use crate::ports::chain_client::ChainClient;

/// Fee and router configuration read from the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInfo {
  /// Contract address.
  pub address: Address,
  /// Swap fee as reported by `swapFee()`.
  pub swap_fee: U256,
  /// Automation fee as reported by `automationFee()`.
  pub automation_fee: U256,
  /// Whitelisted DEX routers.
  pub dex_routers: Vec<Address>,
  /// Native fees collected so far.
  pub collected_fees_eth: U256,
}

/// Typed access to the BaseFlow contract and ERC-20 tokens.
pub struct BaseFlowContract<C: ChainClient> {
  chain: Arc<C>,
  address: Address,
}

impl<C: ChainClient> BaseFlowContract<C> {
  /// Create a new contract handle.
  pub fn new(chain: Arc<C>, address: Address) -> Self {
    Self { chain, address }
  }

  /// Contract address.
  pub fn address(&self) -> Address {
    self.address
  }

  /// Underlying chain session.
  pub fn chain(&self) -> &Arc<C> {
    &self.chain
  }

  async fn view<T: SolCall>(&self, to: Address, call: T) -> Result<T::Return> {
    let data = call.abi_encode();
    let raw = self
      .chain
      .call(to, Bytes::from(data))
      .await
      .with_context(|| format!("{} call failed", T::SIGNATURE))?;
    T::abi_decode_returns(&raw, true).with_context(|| format!("Failed to decode {}", T::SIGNATURE))
  }

  // ── BaseFlow views ──

  /// `swapFee()`.
  pub async fn swap_fee(&self) -> Result<U256> {
    Ok(self.view(self.address, IBaseFlow::swapFeeCall {}).await?._0)
  }

  /// `automationFee()`.
  pub async fn automation_fee(&self) -> Result<U256> {
    Ok(self.view(self.address, IBaseFlow::automationFeeCall {}).await?._0)
  }

  /// `getDexRouters()`.
  pub async fn dex_routers(&self) -> Result<Vec<Address>> {
    Ok(self.view(self.address, IBaseFlow::getDexRoutersCall {}).await?._0)
  }

  /// `isDexRouter(router)`.
  pub async fn is_dex_router(&self, router: Address) -> Result<bool> {
    Ok(self.view(self.address, IBaseFlow::isDexRouterCall { router }).await?._0)
  }

  /// `collectedFeesETH()`.
  pub async fn collected_fees_eth(&self) -> Result<U256> {
    Ok(self.view(self.address, IBaseFlow::collectedFeesETHCall {}).await?._0)
  }

  /// `collectedFeesToken(token)`.
  pub async fn collected_fees_token(&self, token: Address) -> Result<U256> {
    Ok(self.view(self.address, IBaseFlow::collectedFeesTokenCall { token }).await?._0)
  }

  /// Fee and router summary in one round of calls.
  #[instrument(skip(self))]
  pub async fn info(&self) -> Result<ContractInfo> {
    let (swap_fee, automation_fee, dex_routers, collected_fees_eth) = tokio::try_join!(
      self.swap_fee(),
      self.automation_fee(),
      self.dex_routers(),
      self.collected_fees_eth(),
    )?;
    Ok(ContractInfo {
      address: self.address,
      swap_fee,
      automation_fee,
      dex_routers,
      collected_fees_eth,
    })
  }

  /// `getUserDCAOrders(user)`.
  pub async fn user_dca_order_ids(&self, user: Address) -> Result<Vec<U256>> {
    Ok(self.view(self.address, IBaseFlow::getUserDCAOrdersCall { user }).await?._0)
  }

  /// `dcaOrders(id)`.
  pub async fn dca_order(&self, order_id: U256) -> Result<IBaseFlow::dcaOrdersReturn> {
    self.view(self.address, IBaseFlow::dcaOrdersCall { orderId: order_id }).await
  }

  /// `getUserLimitOrders` or `getUserStopLossOrders`.
  pub async fn user_trigger_order_ids(&self, kind: TriggerKind, user: Address) -> Result<Vec<U256>> {
    match kind {
      TriggerKind::Limit => Ok(self.view(self.address, IBaseFlow::getUserLimitOrdersCall { user }).await?._0),
      TriggerKind::StopLoss => Ok(
        self
          .view(self.address, IBaseFlow::getUserStopLossOrdersCall { user })
          .await?
          ._0,
      ),
    }
  }

  /// `limitOrders(id)` or `stopLossOrders(id)`.
  pub async fn trigger_order(&self, kind: TriggerKind, order_id: U256) -> Result<TriggerOrderRecord> {
    match kind {
      TriggerKind::Limit => Ok(self.view(self.address, IBaseFlow::limitOrdersCall { orderId: order_id }).await?.into()),
      TriggerKind::StopLoss => Ok(
        self
          .view(self.address, IBaseFlow::stopLossOrdersCall { orderId: order_id })
          .await?
          .into(),
      ),
    }
  }

  // ── ERC-20 ──

  /// `allowance(owner, spender)` on `token`.
  pub async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
    Ok(self.view(token, IERC20::allowanceCall { owner, spender }).await?._0)
  }

  /// `balanceOf(owner)` on `token`.
  pub async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256> {
    Ok(self.view(token, IERC20::balanceOfCall { owner }).await?._0)
  }

  /// `decimals()` on `token`.
  pub async fn decimals(&self, token: Address) -> Result<u8> {
    Ok(self.view(token, IERC20::decimalsCall {}).await?._0)
  }

  /// `symbol()` on `token`.
  pub async fn symbol(&self, token: Address) -> Result<String> {
    Ok(self.view(token, IERC20::symbolCall {}).await?._0)
  }

  /// Balance of `owner` in `token`, native or ERC-20.
  pub async fn token_balance(&self, token: &Token, owner: Address) -> Result<U256> {
    if token.is_native() {
      self.chain.native_balance(owner).await
    } else {
      self.erc20_balance(token.address, owner).await
    }
  }

  /// Whether `owner` must approve `spender` before moving `amount`.
  ///
  /// Native input never needs an approval.
  pub async fn needs_approval(
    &self,
    token: &Token,
    owner: Address,
    spender: Address,
    amount: U256,
  ) -> Result<bool> {
    if token.is_native() {
      return Ok(false);
    }
    let current = self.allowance(token.address, owner, spender).await?;
    debug!(token = %token, %current, %amount, "Allowance checked");
    Ok(current < amount)
  }

  // ── Transaction builders ──

  /// `approve(spender, amount)` on `token`.
  pub fn approve_tx(&self, token: &Token, spender: Address, amount: U256) -> PreparedTx {
    let data = IERC20::approveCall { spender, amount }.abi_encode();
    PreparedTx::new(format!("approve {token}"), token.address, data.into(), U256::ZERO)
  }

  /// `swap(...)` routed through BaseFlow.
  pub fn swap_tx(
    &self,
    token_in: &Token,
    token_out: &Token,
    amount_in: U256,
    min_amount_out: U256,
    dex_router: Address,
    swap_data: Bytes,
  ) -> PreparedTx {
    let data = IBaseFlow::swapCall {
      tokenIn: token_in.address,
      tokenOut: token_out.address,
      amountIn: amount_in,
      minAmountOut: min_amount_out,
      dexRouter: dex_router,
      swapData: swap_data,
    }
    .abi_encode();
    PreparedTx::new("swap", self.address, data.into(), native_value(token_in, amount_in))
  }

  /// `createDCAOrder(...)`.
  pub fn create_dca_tx(
    &self,
    token_in: &Token,
    token_out: &Token,
    total_amount: U256,
    intervals: u32,
    interval_seconds: u64,
  ) -> PreparedTx {
    let data = IBaseFlow::createDCAOrderCall {
      tokenIn: token_in.address,
      tokenOut: token_out.address,
      totalAmount: total_amount,
      intervals: U256::from(intervals),
      intervalDuration: U256::from(interval_seconds),
    }
    .abi_encode();
    PreparedTx::new(
      "create DCA order",
      self.address,
      data.into(),
      native_value(token_in, total_amount),
    )
  }

  /// `cancelDCAOrder(id)`.
  pub fn cancel_dca_tx(&self, order_id: U256) -> PreparedTx {
    let data = IBaseFlow::cancelDCAOrderCall { orderId: order_id }.abi_encode();
    PreparedTx::new("cancel DCA order", self.address, data.into(), U256::ZERO)
  }

  /// `createLimitOrder(...)` or `createStopLossOrder(...)`.
  #[allow(clippy::too_many_arguments)]
  pub fn create_trigger_tx(
    &self,
    kind: TriggerKind,
    token_in: &Token,
    token_out: &Token,
    amount_in: U256,
    price_scaled: U256,
    min_amount_out: U256,
    duration_seconds: u64,
  ) -> PreparedTx {
    let duration = U256::from(duration_seconds);
    let data = match kind {
      TriggerKind::Limit => IBaseFlow::createLimitOrderCall {
        tokenIn: token_in.address,
        tokenOut: token_out.address,
        amountIn: amount_in,
        targetPrice: price_scaled,
        minAmountOut: min_amount_out,
        duration,
      }
      .abi_encode(),
      TriggerKind::StopLoss => IBaseFlow::createStopLossOrderCall {
        tokenIn: token_in.address,
        tokenOut: token_out.address,
        amountIn: amount_in,
        stopPrice: price_scaled,
        minAmountOut: min_amount_out,
        duration,
      }
      .abi_encode(),
    };
    PreparedTx::new(
      format!("create {kind} order"),
      self.address,
      data.into(),
      native_value(token_in, amount_in),
    )
  }

  /// `cancelLimitOrder(id)` or `cancelStopLossOrder(id)`.
  pub fn cancel_trigger_tx(&self, kind: TriggerKind, order_id: U256) -> PreparedTx {
    let data = match kind {
      TriggerKind::Limit => IBaseFlow::cancelLimitOrderCall { orderId: order_id }.abi_encode(),
      TriggerKind::StopLoss => IBaseFlow::cancelStopLossOrderCall { orderId: order_id }.abi_encode(),
    };
    PreparedTx::new(format!("cancel {kind} order"), self.address, data.into(), U256::ZERO)
  }

  // ── Submission ──

  /// Account that will sign, or `NotConnected`.
  pub fn signer(&self) -> Result<Address, ExecutionError> {
    match self.chain.account() {
      Some(account) if self.chain.can_sign() => Ok(account),
      _ => Err(ExecutionError::NotConnected),
    }
  }

  /// Broadcast `tx` and wait for its receipt; a revert is an error.
  #[instrument(skip(self, tx), fields(label = %tx.label))]
  pub async fn submit(&self, tx: &PreparedTx) -> Result<TxOutcome, ExecutionError> {
    let hash = self.chain.send_transaction(tx).await?;
    let outcome = self.chain.wait_for_receipt(hash).await?;
    if outcome.success {
      Ok(outcome)
    } else {
      Err(ExecutionError::Reverted(outcome.hash))
    }
  }

  /// Submit an approval; a revert becomes `ApprovalReverted`.
  pub async fn submit_approval(&self, tx: &PreparedTx) -> Result<TxOutcome, ExecutionError> {
    self.submit(tx).await.map_err(|e| match e {
      ExecutionError::Reverted(hash) => ExecutionError::ApprovalReverted(hash),
      other => other,
    })
  }
}

fn native_value(token_in: &Token, amount: U256) -> U256 {
  if token_in.is_native() { amount } else { U256::ZERO }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::token::TokenRegistry;
  use alloy::primitives::TxHash;
  use async_trait::async_trait;

  /// Chain stub that answers every call with a fixed payload.
  struct StaticChain {
    reply: Bytes,
  }

  #[async_trait]
  impl ChainClient for StaticChain {
    fn account(&self) -> Option<Address> {
      None
    }

    fn can_sign(&self) -> bool {
      false
    }

    async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes> {
      Ok(self.reply.clone())
    }

    async fn native_balance(&self, _owner: Address) -> Result<U256> {
      Ok(U256::from(5u64))
    }

    async fn send_transaction(&self, _tx: &PreparedTx) -> Result<TxHash> {
      anyhow::bail!("read-only")
    }

    async fn wait_for_receipt(&self, _hash: TxHash) -> Result<TxOutcome> {
      anyhow::bail!("read-only")
    }

    async fn is_healthy(&self) -> bool {
      true
    }
  }

  fn contract(reply: Vec<u8>) -> BaseFlowContract<StaticChain> {
    let chain = StaticChain { reply: reply.into() };
    BaseFlowContract::new(Arc::new(chain), Address::repeat_byte(0xBF))
  }

  #[test]
  fn test_native_dca_carries_value() {
    let registry = TokenRegistry::base();
    let eth = registry.by_symbol("ETH").unwrap();
    let usdc = registry.by_symbol("USDC").unwrap();
    let c = contract(vec![]);

    let tx = c.create_dca_tx(eth, usdc, U256::from(1_000u64), 10, 86_400);
    assert_eq!(tx.value, U256::from(1_000u64));
    assert_eq!(tx.to, c.address());
    assert_eq!(&tx.data[..4], &IBaseFlow::createDCAOrderCall::SELECTOR);

    let tx = c.create_dca_tx(usdc, eth, U256::from(1_000u64), 10, 86_400);
    assert_eq!(tx.value, U256::ZERO);
  }

  #[test]
  fn test_trigger_builders_pick_function() {
    let registry = TokenRegistry::base();
    let eth = registry.by_symbol("ETH").unwrap();
    let usdc = registry.by_symbol("USDC").unwrap();
    let c = contract(vec![]);

    let limit = c.create_trigger_tx(TriggerKind::Limit, usdc, eth, U256::from(1u64), U256::from(2u64), U256::ZERO, 604_800);
    assert_eq!(&limit.data[..4], &IBaseFlow::createLimitOrderCall::SELECTOR);

    let stop = c.cancel_trigger_tx(TriggerKind::StopLoss, U256::from(4u64));
    assert_eq!(&stop.data[..4], &IBaseFlow::cancelStopLossOrderCall::SELECTOR);
    assert_eq!(stop.label, "cancel stop-loss order");
  }

  #[test]
  fn test_approve_targets_token() {
    let registry = TokenRegistry::base();
    let usdc = registry.by_symbol("USDC").unwrap();
    let c = contract(vec![]);
    let tx = c.approve_tx(usdc, c.address(), U256::from(9u64));
    assert_eq!(tx.to, usdc.address);
    assert_eq!(&tx.data[..4], &IERC20::approveCall::SELECTOR);
  }

  #[tokio::test]
  async fn test_allowance_decoding() {
    let registry = TokenRegistry::base();
    let usdc = registry.by_symbol("USDC").unwrap();
    let eth = registry.by_symbol("ETH").unwrap();
    let c = contract(U256::from(100u64).to_be_bytes::<32>().to_vec());

    assert!(c.needs_approval(usdc, Address::ZERO, c.address(), U256::from(101u64)).await.unwrap());
    assert!(!c.needs_approval(usdc, Address::ZERO, c.address(), U256::from(100u64)).await.unwrap());
    assert!(!c.needs_approval(eth, Address::ZERO, c.address(), U256::MAX).await.unwrap());
  }

  #[tokio::test]
  async fn test_native_balance_bypasses_erc20() {
    let registry = TokenRegistry::base();
    let eth = registry.by_symbol("ETH").unwrap();
    let c = contract(vec![]);
    assert_eq!(c.token_balance(eth, Address::ZERO).await.unwrap(), U256::from(5u64));
  }

  #[test]
  fn test_read_only_session_cannot_sign() {
    let c = contract(vec![]);
    assert!(matches!(c.signer(), Err(ExecutionError::NotConnected)));
  }
}
