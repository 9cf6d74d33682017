//! Typed errors at the quoting and execution seams.
//!
//! Adapters and `main` use `anyhow` with context; these enums exist
//! where callers branch on the failure kind (fallback to a spot
//! estimate, prompt for approval, surface a revert).

use alloy::primitives::TxHash;
use thiserror::Error;

/// Failure to obtain a quote from an aggregator.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Request rejected locally before any network call.
    #[error("invalid quote request: {0}")]
    InvalidRequest(String),

    /// Aggregator answered with a non-success status.
    #[error("{reason}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Reason extracted from the error body.
        reason: String,
    },

    /// Network-level failure (connect, timeout, TLS).
    #[error("quote transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("malformed quote response: {0}")]
    Malformed(String),
}

/// Failure while submitting a swap or order transaction.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// No account is connected, or it cannot sign.
    #[error("wallet not connected")]
    NotConnected,

    /// The current quote carries no executable payload.
    #[error("no executable quote; refresh the quote before swapping")]
    NoExecutableQuote,

    /// Input rejected before submission.
    #[error("{0}")]
    InvalidInput(String),

    /// The approval transaction was mined but reverted.
    #[error("approval transaction {0} reverted")]
    ApprovalReverted(TxHash),

    /// The main transaction was mined but reverted.
    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    /// Wallet, RPC or contract rejected the request.
    #[error("{0}")]
    Rejected(String),
}

impl From<anyhow::Error> for ExecutionError {
    fn from(e: anyhow::Error) -> Self {
        Self::Rejected(format!("{e:#}"))
    }
}
