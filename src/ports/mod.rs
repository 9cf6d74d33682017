//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use cases require from
//! the outside world. Adapters implement these traits; tests mock them.
//!
//! Port categories:
//! - `QuoteProvider`: DEX aggregator routing + executable calldata
//! - `PriceOracle`: Spot USD prices (degraded fallback only)
//! - `ChainClient`: Wallet session, view calls, transaction broadcast

pub mod chain_client;
pub mod price_oracle;
pub mod quote_provider;
