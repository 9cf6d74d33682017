//! Quote Service Adapters
//!
//! HTTP clients for the off-chain services a swap needs before it
//! touches the chain.
//!
//! Sub-modules:
//! - `client`: shared reqwest client and error-body parsing
//! - `types`: request/response types for all three services
//! - `zeroex`: 0x Swap API (`QuoteProvider`)
//! - `odos`: Odos quote + assemble (`QuoteProvider`)
//! - `llama`: DefiLlama spot prices (`PriceOracle`)

pub mod client;
pub mod llama;
pub mod odos;
pub mod types;
pub mod zeroex;

pub use client::{QuoteClientConfig, QuoteHttpClient};
pub use llama::LlamaPriceClient;
pub use odos::OdosClient;
pub use zeroex::ZeroExClient;
