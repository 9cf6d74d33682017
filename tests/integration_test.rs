//! Integration Tests - Use Cases Against Mocked Ports
//!
//! Exercises quoting, swap execution and order management through
//! the public API, with mockall standing in for the aggregator, the
//! price oracle and the wallet session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use mockall::{Sequence, mock};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use baseflow::domain::abi::{IBaseFlow, IERC20};
use baseflow::domain::order::TriggerKind;
use baseflow::domain::quote::{AggregatorQuote, LiquiditySource, PreparedTx, QuoteOutcome, SwapTransaction, TxOutcome};
use baseflow::domain::token::{Token, TokenRegistry, WETH_ADDRESS};
use baseflow::errors::{ExecutionError, QuoteError};
use baseflow::ports::chain_client::ChainClient;
use baseflow::ports::price_oracle::PriceOracle;
use baseflow::ports::quote_provider::{QuoteProvider, QuoteRequest};
use baseflow::usecases::contract::BaseFlowContract;
use baseflow::usecases::dca::{DcaForm, DcaService, SubmitOutcome};
use baseflow::usecases::limit_order::{TriggerOrderForm, TriggerOrderService};
use baseflow::usecases::quote_orchestrator::{CONNECT_NOTICE, FALLBACK_NOTICE, QuoteInput, QuoteOrchestrator};
use baseflow::usecases::quote_session::QuoteSession;
use baseflow::usecases::swap::{SwapExecutor, SwapForm, SwapRoute};

// ---- Mock Definitions ----

mock! {
    pub Aggregator {}

    #[async_trait]
    impl QuoteProvider for Aggregator {
        fn name(&self) -> &'static str;
        async fn quote(&self, request: &QuoteRequest) -> Result<AggregatorQuote, QuoteError>;
    }
}

mock! {
    pub Oracle {}

    #[async_trait]
    impl PriceOracle for Oracle {
        async fn usd_prices(&self, tokens: &[Address]) -> anyhow::Result<HashMap<Address, Decimal>>;
    }
}

mock! {
    pub Chain {}

    #[async_trait]
    impl ChainClient for Chain {
        fn account(&self) -> Option<Address>;
        fn can_sign(&self) -> bool;
        async fn call(&self, to: Address, data: Bytes) -> anyhow::Result<Bytes>;
        async fn native_balance(&self, owner: Address) -> anyhow::Result<U256>;
        async fn send_transaction(&self, tx: &PreparedTx) -> anyhow::Result<TxHash>;
        async fn wait_for_receipt(&self, hash: TxHash) -> anyhow::Result<TxOutcome>;
        async fn is_healthy(&self) -> bool;
    }
}

// ---- Fixtures ----

const USER: Address = Address::repeat_byte(0x11);
const BASEFLOW: Address = Address::repeat_byte(0xBF);
const ROUTER: Address = Address::repeat_byte(0x0E);

fn token(symbol: &str) -> Token {
    TokenRegistry::base().by_symbol(symbol).cloned().unwrap()
}

fn input(from: &str, to: &str, amount: &str) -> QuoteInput {
    QuoteInput {
        token_in: token(from),
        token_out: token(to),
        amount_in: amount.to_string(),
        slippage_pct: dec!(0.5),
        taker: Some(USER),
    }
}

fn swap_tx(value: U256) -> SwapTransaction {
    SwapTransaction {
        to: ROUTER,
        data: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
        value,
        allowance_target: Some(ROUTER),
    }
}

fn aggregator_quote(request: &QuoteRequest, buy_amount: U256, transaction: Option<SwapTransaction>) -> AggregatorQuote {
    AggregatorQuote {
        provider: "0x".to_string(),
        sell_amount: request.sell_amount,
        buy_amount,
        gas_estimate: Some(150_000),
        sources: vec![LiquiditySource {
            name: "Uniswap_V3".to_string(),
            proportion: 1.0,
        }],
        transaction,
    }
}

fn silent_oracle() -> MockOracle {
    let mut oracle = MockOracle::new();
    oracle
        .expect_usd_prices()
        .returning(|_| Ok(HashMap::new()));
    oracle
}

fn selector(data: &Bytes) -> [u8; 4] {
    data[..4].try_into().unwrap()
}

fn hash(byte: u8) -> TxHash {
    TxHash::repeat_byte(byte)
}

fn mined(hash: TxHash, success: bool) -> TxOutcome {
    TxOutcome {
        hash,
        success,
        block_number: Some(100),
    }
}

/// Signing session whose `allowance` reads return `allowance`.
fn signing_chain(allowance: U256) -> MockChain {
    let mut chain = MockChain::new();
    chain.expect_account().returning(|| Some(USER));
    chain.expect_can_sign().returning(|| true);
    chain.expect_call().returning(move |_, data| {
        let sel = selector(&data);
        if sel == IERC20::allowanceCall::SELECTOR {
            Ok(allowance.abi_encode().into())
        } else if sel == IBaseFlow::isDexRouterCall::SELECTOR {
            Ok(true.abi_encode().into())
        } else {
            anyhow::bail!("unexpected call {sel:?}")
        }
    });
    chain
        .expect_wait_for_receipt()
        .returning(|h| Ok(mined(h, true)));
    chain
}

fn contract(chain: MockChain) -> Arc<BaseFlowContract<MockChain>> {
    Arc::new(BaseFlowContract::new(Arc::new(chain), BASEFLOW))
}

fn executable_form(from: &str, to: &str, amount: &str, value: U256) -> SwapForm {
    let mut form = SwapForm::with_tokens(token(from), token(to));
    form.set_amount_in(amount);
    let sell_amount = baseflow::domain::units::parse_amount(amount, form.token_in.decimals).unwrap();
    let transaction = swap_tx(value);
    let quote = AggregatorQuote {
        provider: "0x".to_string(),
        sell_amount,
        buy_amount: U256::from(2_500_000_000u64),
        gas_estimate: None,
        sources: vec![],
        transaction: Some(transaction.clone()),
    };
    form.apply(QuoteOutcome::Executable(baseflow::domain::quote::ExecutableQuote {
        amount_out: "2500".to_string(),
        quote,
        transaction,
        usd: Default::default(),
    }));
    form
}

// ---- Quoting ----

#[tokio::test]
async fn test_zero_or_empty_amount_never_requests_quote() {
    let mut aggregator = MockAggregator::new();
    aggregator.expect_quote().never();
    aggregator.expect_name().return_const("0x");
    let mut oracle = MockOracle::new();
    oracle.expect_usd_prices().never();

    let orchestrator = QuoteOrchestrator::new(Arc::new(aggregator), Arc::new(oracle));
    for amount in ["", "0", "0.000", "  ", "abc", "-1"] {
        let outcome = orchestrator.quote(&input("ETH", "USDC", amount)).await;
        assert_eq!(outcome, QuoteOutcome::Idle, "amount {amount:?}");
    }
}

#[tokio::test]
async fn test_same_token_mirrors_input_without_network() {
    let mut aggregator = MockAggregator::new();
    aggregator.expect_quote().never();
    let mut oracle = MockOracle::new();
    oracle.expect_usd_prices().never();

    let orchestrator = QuoteOrchestrator::new(Arc::new(aggregator), Arc::new(oracle));
    let outcome = orchestrator.quote(&input("USDC", "USDC", "12.5")).await;
    assert_eq!(
        outcome,
        QuoteOutcome::SameToken {
            amount_out: "12.5".to_string()
        }
    );
}

#[tokio::test]
async fn test_aggregator_error_falls_back_to_spot_estimate() {
    let mut aggregator = MockAggregator::new();
    aggregator.expect_name().return_const("0x");
    aggregator.expect_quote().times(1).returning(|_| {
        Err(QuoteError::Upstream {
            status: 400,
            reason: "Insufficient liquidity".to_string(),
        })
    });
    let usdc = token("USDC").address;
    let mut oracle = MockOracle::new();
    oracle.expect_usd_prices().returning(move |_| {
        Ok(HashMap::from([(WETH_ADDRESS, dec!(2500)), (usdc, dec!(1))]))
    });

    let orchestrator = QuoteOrchestrator::new(Arc::new(aggregator), Arc::new(oracle));
    let outcome = orchestrator.quote(&input("ETH", "USDC", "2")).await;

    assert!(!outcome.is_executable());
    assert!(outcome.swap_transaction().is_none());
    assert_eq!(outcome.amount_out(), Some("5000"));
    assert_eq!(outcome.message(), Some(FALLBACK_NOTICE));
}

#[tokio::test]
async fn test_aggregator_error_without_prices_surfaces_reason() {
    let mut aggregator = MockAggregator::new();
    aggregator.expect_name().return_const("0x");
    aggregator.expect_quote().returning(|_| {
        Err(QuoteError::Upstream {
            status: 400,
            reason: "Insufficient liquidity".to_string(),
        })
    });
    let mut oracle = MockOracle::new();
    oracle
        .expect_usd_prices()
        .returning(|_| Err(anyhow::anyhow!("price service down")));

    let orchestrator = QuoteOrchestrator::new(Arc::new(aggregator), Arc::new(oracle));
    let outcome = orchestrator.quote(&input("ETH", "USDC", "1")).await;
    assert_eq!(
        outcome,
        QuoteOutcome::Failed {
            message: "Insufficient liquidity".to_string()
        }
    );
}

#[tokio::test]
async fn test_successful_quote_is_executable_with_usd_values() {
    let mut aggregator = MockAggregator::new();
    aggregator.expect_name().return_const("0x");
    aggregator
        .expect_quote()
        .withf(|req| req.sell_amount == U256::from(10u64).pow(U256::from(18u64)) && req.taker == Some(USER))
        .returning(|req| Ok(aggregator_quote(req, U256::from(2_500_000_000u64), Some(swap_tx(req.sell_amount)))));
    let usdc = token("USDC").address;
    let mut oracle = MockOracle::new();
    oracle.expect_usd_prices().returning(move |_| {
        Ok(HashMap::from([(WETH_ADDRESS, dec!(2500)), (usdc, dec!(1))]))
    });

    let orchestrator = QuoteOrchestrator::new(Arc::new(aggregator), Arc::new(oracle));
    let QuoteOutcome::Executable(quote) = orchestrator.quote(&input("ETH", "USDC", "1")).await else {
        panic!("expected an executable quote");
    };
    assert_eq!(quote.amount_out, "2500");
    assert_eq!(quote.transaction.to, ROUTER);
    assert_eq!(quote.usd.amount_in_usd, Some(dec!(2500)));
    assert_eq!(quote.usd.amount_out_usd, Some(dec!(2500)));
    assert_eq!(quote.quote.route_label(), "Best price via Uniswap_V3");
}

#[tokio::test]
async fn test_route_without_account_asks_to_connect() {
    let mut aggregator = MockAggregator::new();
    aggregator.expect_name().return_const("odos");
    aggregator
        .expect_quote()
        .withf(|req| req.taker.is_none())
        .times(1)
        .returning(|req| Ok(aggregator_quote(req, U256::from(5_000_000u64), None)));
    let mut oracle = MockOracle::new();
    oracle.expect_usd_prices().never();

    let orchestrator = QuoteOrchestrator::new(Arc::new(aggregator), Arc::new(oracle));
    let mut request = input("USDC", "USDbC", "5");
    request.taker = None;
    let outcome = orchestrator.quote(&request).await;
    assert_eq!(
        outcome,
        QuoteOutcome::Estimate {
            amount_out: "5".to_string(),
            notice: CONNECT_NOTICE.to_string(),
        }
    );
    assert!(!outcome.is_executable());
}

#[tokio::test]
async fn test_switch_tokens_swaps_displayed_amounts() {
    let mut form = SwapForm::with_tokens(token("ETH"), token("USDC"));
    form.set_amount_in("1");
    form.apply(QuoteOutcome::Estimate {
        amount_out: "2500".to_string(),
        notice: FALLBACK_NOTICE.to_string(),
    });
    form.switch_tokens();

    let next = form.quote_input(None);
    assert_eq!(next.token_in.symbol, "USDC");
    assert_eq!(next.token_out.symbol, "ETH");
    assert_eq!(next.amount_in, "2500");
    assert_eq!(form.amount_out, "1");
}

// ---- Quote session ----

/// Provider whose 1-unit quotes are slow, so a later edit overtakes them.
struct SlowForOne;

#[async_trait]
impl QuoteProvider for SlowForOne {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn quote(&self, request: &QuoteRequest) -> Result<AggregatorQuote, QuoteError> {
        if request.sell_amount == U256::from(1_000_000u64) {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        Ok(aggregator_quote(request, request.sell_amount, None))
    }
}

#[tokio::test]
async fn test_session_discards_stale_quote() {
    let orchestrator = Arc::new(QuoteOrchestrator::new(Arc::new(SlowForOne), Arc::new(silent_oracle())));
    let (session, mut outcomes) = QuoteSession::spawn(orchestrator, Duration::from_millis(10));

    session.edit(input("USDC", "USDbC", "1"));
    // Past the debounce: the slow quote for "1" is in flight.
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.edit(input("USDC", "USDbC", "2"));

    let first = tokio::time::timeout(Duration::from_secs(2), outcomes.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.amount_out(), Some("2"));

    let late = tokio::time::timeout(Duration::from_millis(700), outcomes.recv()).await;
    assert!(late.is_err(), "stale outcome was emitted: {late:?}");

    session.close().await;
}

#[tokio::test]
async fn test_session_debounces_rapid_edits() {
    let mut aggregator = MockAggregator::new();
    aggregator.expect_name().return_const("0x");
    aggregator
        .expect_quote()
        .times(1)
        .returning(|req| Ok(aggregator_quote(req, req.sell_amount, None)));
    let orchestrator = Arc::new(QuoteOrchestrator::new(Arc::new(aggregator), Arc::new(silent_oracle())));
    let (session, mut outcomes) = QuoteSession::spawn(orchestrator, Duration::from_millis(200));

    for amount in ["1", "12", "123"] {
        session.edit(input("USDC", "USDbC", amount));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let outcome = tokio::time::timeout(Duration::from_secs(2), outcomes.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.amount_out(), Some("123"));
    session.close().await;
}

#[tokio::test]
async fn test_session_clearing_amount_resets_in_flight_quote() {
    let orchestrator = Arc::new(QuoteOrchestrator::new(Arc::new(SlowForOne), Arc::new(silent_oracle())));
    let (session, mut outcomes) = QuoteSession::spawn(orchestrator, Duration::from_millis(10));

    session.edit(input("USDC", "USDbC", "1"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.edit(input("USDC", "USDbC", ""));

    // Idle arrives well before the slow quote could have finished.
    let first = tokio::time::timeout(Duration::from_millis(200), outcomes.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, QuoteOutcome::Idle);

    let late = tokio::time::timeout(Duration::from_millis(700), outcomes.recv()).await;
    assert!(late.is_err(), "stale outcome was emitted: {late:?}");

    session.close().await;
}

#[tokio::test]
async fn test_session_quotes_pending_edit_on_close() {
    let mut aggregator = MockAggregator::new();
    aggregator.expect_name().return_const("0x");
    aggregator
        .expect_quote()
        .times(1)
        .returning(|req| Ok(aggregator_quote(req, req.sell_amount, None)));
    let orchestrator = Arc::new(QuoteOrchestrator::new(Arc::new(aggregator), Arc::new(silent_oracle())));
    let (session, mut outcomes) = QuoteSession::spawn(orchestrator, Duration::from_millis(50));

    session.edit(input("USDC", "USDbC", "7"));
    session.close().await;

    let outcome = outcomes.recv().await.expect("pending edit was dropped");
    assert_eq!(outcome.amount_out(), Some("7"));
    assert!(outcomes.recv().await.is_none());
}

#[tokio::test]
async fn test_session_finishes_in_flight_quote_on_close() {
    let orchestrator = Arc::new(QuoteOrchestrator::new(Arc::new(SlowForOne), Arc::new(silent_oracle())));
    let (session, mut outcomes) = QuoteSession::spawn(orchestrator, Duration::from_millis(10));

    session.edit(input("USDC", "USDbC", "1"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.close().await;

    let outcome = outcomes.recv().await.expect("in-flight quote was dropped");
    assert_eq!(outcome.amount_out(), Some("1"));
    assert!(outcomes.recv().await.is_none());
}

// ---- Swap execution ----

#[tokio::test]
async fn test_native_swap_sends_payload_verbatim() {
    let mut chain = MockChain::new();
    chain.expect_account().returning(|| Some(USER));
    chain.expect_can_sign().returning(|| true);
    chain.expect_call().never();
    let value = U256::from(10u64).pow(U256::from(18u64));
    chain
        .expect_send_transaction()
        .times(1)
        .withf(move |tx| tx.to == ROUTER && tx.data == Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]) && tx.value == value)
        .returning(|_| Ok(hash(1)));
    chain
        .expect_wait_for_receipt()
        .returning(|h| Ok(mined(h, true)));

    let executor = SwapExecutor::new(contract(chain));
    let form = executable_form("ETH", "USDC", "1", value);
    let receipt = executor.execute(&form, SwapRoute::Direct).await.unwrap();
    assert!(receipt.approval.is_none());
    assert_eq!(receipt.swap.hash, hash(1));
}

#[tokio::test]
async fn test_swap_approves_first_when_allowance_short() {
    let mut chain = signing_chain(U256::ZERO);
    let mut seq = Sequence::new();
    let usdc = token("USDC").address;
    chain
        .expect_send_transaction()
        .times(1)
        .in_sequence(&mut seq)
        .withf(move |tx| {
            tx.to == usdc
                && IERC20::approveCall::abi_decode(&tx.data, true)
                    .is_ok_and(|c| c.spender == ROUTER && c.amount == U256::from(100_000_000u64))
        })
        .returning(|_| Ok(hash(1)));
    chain
        .expect_send_transaction()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|tx| tx.to == ROUTER)
        .returning(|_| Ok(hash(2)));

    let executor = SwapExecutor::new(contract(chain));
    let form = executable_form("USDC", "ETH", "100", U256::ZERO);
    let receipt = executor.execute(&form, SwapRoute::Direct).await.unwrap();
    assert_eq!(receipt.approval.map(|a| a.hash), Some(hash(1)));
    assert_eq!(receipt.swap.hash, hash(2));
}

#[tokio::test]
async fn test_swap_skips_approval_when_allowance_sufficient() {
    let mut chain = signing_chain(U256::MAX);
    chain
        .expect_send_transaction()
        .times(1)
        .withf(|tx| tx.to == ROUTER)
        .returning(|_| Ok(hash(2)));

    let executor = SwapExecutor::new(contract(chain));
    let form = executable_form("USDC", "ETH", "100", U256::ZERO);
    let receipt = executor.execute(&form, SwapRoute::Direct).await.unwrap();
    assert!(receipt.approval.is_none());
}

#[tokio::test]
async fn test_baseflow_route_wraps_payload_with_min_out() {
    let mut chain = signing_chain(U256::MAX);
    chain
        .expect_send_transaction()
        .times(1)
        .withf(|tx| {
            tx.to == BASEFLOW
                && IBaseFlow::swapCall::abi_decode(&tx.data, true).is_ok_and(|c| {
                    c.dexRouter == ROUTER
                        && c.amountIn == U256::from(100_000_000u64)
                        && c.minAmountOut == U256::from(2_487_500_000u64)
                        && c.swapData == Bytes::from(vec![0xde, 0xad, 0xbe, 0xef])
                })
        })
        .returning(|_| Ok(hash(3)));

    let executor = SwapExecutor::new(contract(chain));
    let form = executable_form("USDC", "ETH", "100", U256::ZERO);
    let receipt = executor.execute(&form, SwapRoute::BaseFlow).await.unwrap();
    assert_eq!(receipt.swap.hash, hash(3));
}

#[tokio::test]
async fn test_swap_without_executable_quote_is_rejected() {
    let mut chain = MockChain::new();
    chain.expect_account().returning(|| Some(USER));
    chain.expect_can_sign().returning(|| true);
    chain.expect_send_transaction().never();

    let executor = SwapExecutor::new(contract(chain));
    let mut form = SwapForm::with_tokens(token("ETH"), token("USDC"));
    form.set_amount_in("1");
    form.apply(QuoteOutcome::Estimate {
        amount_out: "2500".to_string(),
        notice: FALLBACK_NOTICE.to_string(),
    });
    let err = executor.execute(&form, SwapRoute::Direct).await.unwrap_err();
    assert!(matches!(err, ExecutionError::NoExecutableQuote));
}

#[tokio::test]
async fn test_reverted_swap_surfaces_error() {
    let mut chain = MockChain::new();
    chain.expect_account().returning(|| Some(USER));
    chain.expect_can_sign().returning(|| true);
    chain.expect_send_transaction().returning(|_| Ok(hash(9)));
    chain
        .expect_wait_for_receipt()
        .returning(|h| Ok(mined(h, false)));

    let executor = SwapExecutor::new(contract(chain));
    let form = executable_form("ETH", "USDC", "1", U256::from(1u64));
    let err = executor.execute(&form, SwapRoute::Direct).await.unwrap_err();
    assert!(matches!(err, ExecutionError::Reverted(h) if h == hash(9)));
}

#[tokio::test]
async fn test_read_only_session_cannot_swap() {
    let mut chain = MockChain::new();
    chain.expect_account().returning(|| Some(USER));
    chain.expect_can_sign().returning(|| false);
    chain.expect_send_transaction().never();

    let executor = SwapExecutor::new(contract(chain));
    let form = executable_form("ETH", "USDC", "1", U256::from(1u64));
    let err = executor.execute(&form, SwapRoute::Direct).await.unwrap_err();
    assert!(matches!(err, ExecutionError::NotConnected));
}

// ---- DCA ----

fn dca_form(from: &str, to: &str, total: &str) -> DcaForm {
    let registry = TokenRegistry::base();
    let mut form = DcaForm::new(&registry);
    form.token_in = token(from);
    form.token_out = token(to);
    form.total_amount = total.to_string();
    form
}

#[tokio::test]
async fn test_dca_short_allowance_sends_only_approval() {
    let mut chain = signing_chain(U256::from(1u64));
    chain
        .expect_send_transaction()
        .times(1)
        .withf(|tx| {
            IERC20::approveCall::abi_decode(&tx.data, true)
                .is_ok_and(|c| c.spender == BASEFLOW && c.amount == U256::from(300_000_000u64))
        })
        .returning(|_| Ok(hash(4)));

    let service = DcaService::new(contract(chain), TokenRegistry::base());
    let outcome = service.create(&dca_form("USDC", "ETH", "300")).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::ApprovalRequested(tx) if tx.hash == hash(4)));
}

#[tokio::test]
async fn test_dca_native_input_carries_value() {
    let mut chain = signing_chain(U256::ZERO);
    let total = U256::from(5u64) * U256::from(10u64).pow(U256::from(17u64));
    chain
        .expect_send_transaction()
        .times(1)
        .withf(move |tx| {
            tx.to == BASEFLOW
                && tx.value == total
                && IBaseFlow::createDCAOrderCall::abi_decode(&tx.data, true).is_ok_and(|c| {
                    c.totalAmount == total
                        && c.intervals == U256::from(30u64)
                        && c.intervalDuration == U256::from(86_400u64)
                })
        })
        .returning(|_| Ok(hash(5)));

    let service = DcaService::new(contract(chain), TokenRegistry::base());
    let outcome = service.create(&dca_form("ETH", "USDC", "0.5")).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Submitted(tx) if tx.hash == hash(5)));
}

#[tokio::test]
async fn test_dca_list_excludes_inactive_orders() {
    let usdc = token("USDC").address;
    let mut chain = MockChain::new();
    chain.expect_call().returning(move |_, data| {
        let sel = selector(&data);
        if sel == IBaseFlow::getUserDCAOrdersCall::SELECTOR {
            return Ok(vec![U256::from(1u64), U256::from(2u64)].abi_encode().into());
        }
        if sel == IBaseFlow::dcaOrdersCall::SELECTOR {
            let id = IBaseFlow::dcaOrdersCall::abi_decode(&data, true)?.orderId;
            let active = id == U256::from(1u64);
            let record = (
                USER,
                usdc,
                Address::ZERO,
                U256::from(10_000_000u64),
                U256::from(29u64),
                U256::from(86_400u64),
                U256::ZERO,
                active,
            );
            return Ok(record.abi_encode_params().into());
        }
        anyhow::bail!("unexpected call")
    });

    let service = DcaService::new(contract(chain), TokenRegistry::base());
    let orders = service.list(USER, chrono::Utc::now()).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, U256::from(1u64));
    assert_eq!(orders[0].amount_per_interval, "10");
    assert_eq!(orders[0].token_in.symbol, "USDC");
}

// ---- Limit / stop-loss ----

fn trigger_form(kind: TriggerKind, amount: &str, price: &str) -> TriggerOrderForm {
    let mut form = TriggerOrderForm::new(kind, &TokenRegistry::base());
    form.amount_in = amount.to_string();
    form.price = price.to_string();
    form
}

#[tokio::test]
async fn test_limit_order_min_out_below_quote() {
    let quoted = U256::from(40_000_000_000_000_000u64);
    let mut aggregator = MockAggregator::new();
    aggregator.expect_name().return_const("Odos");
    aggregator
        .expect_quote()
        .returning(move |req| Ok(aggregator_quote(req, quoted, None)));

    let mut chain = signing_chain(U256::MAX);
    chain
        .expect_send_transaction()
        .times(1)
        .withf(move |tx| {
            tx.value == U256::ZERO
                && IBaseFlow::createLimitOrderCall::abi_decode(&tx.data, true).is_ok_and(|c| {
                    c.minAmountOut <= quoted
                        && c.minAmountOut == U256::from(39_800_000_000_000_000u64)
                        && c.targetPrice == U256::from(400_000_000_000_000u64)
                        && c.duration == U256::from(604_800u64)
                })
        })
        .returning(|_| Ok(hash(6)));

    let service = TriggerOrderService::new(contract(chain), Arc::new(aggregator), TokenRegistry::base());
    let outcome = service
        .create(&trigger_form(TriggerKind::Limit, "100", "0.0004"))
        .await
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Submitted(tx) if tx.hash == hash(6)));
}

#[tokio::test]
async fn test_stop_loss_min_out_zero_when_quote_fails() {
    let mut aggregator = MockAggregator::new();
    aggregator.expect_name().return_const("Odos");
    aggregator
        .expect_quote()
        .returning(|_| Err(QuoteError::Malformed("no path".to_string())));

    let mut chain = signing_chain(U256::MAX);
    chain
        .expect_send_transaction()
        .times(1)
        .withf(|tx| {
            IBaseFlow::createStopLossOrderCall::abi_decode(&tx.data, true)
                .is_ok_and(|c| c.minAmountOut.is_zero())
        })
        .returning(|_| Ok(hash(7)));

    let service = TriggerOrderService::new(contract(chain), Arc::new(aggregator), TokenRegistry::base());
    let outcome = service
        .create(&trigger_form(TriggerKind::StopLoss, "100", "0.0003"))
        .await
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
}

#[tokio::test]
async fn test_limit_order_short_allowance_sends_only_approval() {
    let mut aggregator = MockAggregator::new();
    aggregator.expect_quote().never();

    let mut chain = signing_chain(U256::ZERO);
    chain
        .expect_send_transaction()
        .times(1)
        .withf(|tx| tx.data[..4] == IERC20::approveCall::SELECTOR)
        .returning(|_| Ok(hash(8)));

    let service = TriggerOrderService::new(contract(chain), Arc::new(aggregator), TokenRegistry::base());
    let outcome = service
        .create(&trigger_form(TriggerKind::Limit, "100", "0.0004"))
        .await
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::ApprovalRequested(_)));
}

#[tokio::test]
async fn test_reverted_approval_is_reported_as_approval_failure() {
    let mut chain = MockChain::new();
    chain.expect_account().returning(|| Some(USER));
    chain.expect_can_sign().returning(|| true);
    chain
        .expect_call()
        .returning(|_, _| Ok(U256::ZERO.abi_encode().into()));
    chain.expect_send_transaction().returning(|_| Ok(hash(10)));
    chain
        .expect_wait_for_receipt()
        .returning(|h| Ok(mined(h, false)));

    let service = DcaService::new(contract(chain), TokenRegistry::base());
    let err = service.create(&dca_form("USDC", "ETH", "10")).await.unwrap_err();
    assert!(matches!(err, ExecutionError::ApprovalReverted(h) if h == hash(10)));
}
