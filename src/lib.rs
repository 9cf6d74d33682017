//! BaseFlow - Library Root
//!
//! Quoting, swap execution and DCA / limit / stop-loss order management
//! against the BaseFlow contract on Base. Re-exports all modules for
//! the CLI binary and integration tests.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod usecases;
