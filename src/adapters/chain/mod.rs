//! Chain Adapters - Base Blockchain Interaction Layer
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - RPC provider management with optional local signer
//! - The `ChainClient` wallet session (calls, balances, broadcast, receipts)
//! - Startup verification that configured contracts are deployed

pub mod provider;
pub mod validator;
pub mod wallet;

pub use provider::BaseProvider;
pub use validator::ContractValidator;
pub use wallet::WalletClient;
