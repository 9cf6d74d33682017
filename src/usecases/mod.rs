//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the client's workflows. Each use case is a self-contained
//! operation the CLI drives.
//!
//! Use cases:
//! - `BaseFlowContract`: Typed contract views and transaction builders
//! - `QuoteOrchestrator`: Aggregator quote with spot-price fallback
//! - `QuoteSession`: Debounced, last-write-wins quoting
//! - `SwapForm` / `SwapExecutor`: Swap state, approval and submission
//! - `DcaService`: DCA order create/cancel/list
//! - `TriggerOrderService`: Limit and stop-loss create/cancel/list
//! - `WalletBalances`: Cached balances for the connected account

pub mod contract;
pub mod dca;
pub mod limit_order;
pub mod quote_orchestrator;
pub mod quote_session;
pub mod swap;
pub mod wallet;
