//! Domain layer - Core types for quoting and order management.
//!
//! Pure data and arithmetic: token registry, unit conversion,
//! quote payloads, on-chain order records, and the contract ABI.
//! Nothing in here performs I/O (hexagonal architecture inner ring).

pub mod abi;
pub mod display;
pub mod order;
pub mod quote;
pub mod token;
pub mod units;

// Re-export core types for convenience
pub use order::{
    DcaInterval, DcaOrderView, OrderDuration, TriggerKind, TriggerOrderView,
};
pub use quote::{
    AggregatorQuote, LiquiditySource, PreparedTx, QuoteOutcome, SwapTransaction,
    TxOutcome,
};
pub use token::{Token, TokenRegistry};
