//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP quote APIs, Base JSON-RPC).
//!
//! Adapter categories:
//! - `chain`: Base RPC provider, wallet session and contract checks via alloy-rs
//! - `quotes`: 0x and Odos aggregators, DefiLlama spot prices

pub mod chain;
pub mod quotes;
