//! Ledger client port.
//!
//! Read-only access to the external ledger that records stablecoin payments.
//! The system only inspects transactions a subscriber already submitted; it
//! never builds or signs one.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::subscription::LedgerTransaction;

/// Faults talking to the ledger.
///
/// A transaction that exists but does not prove the payment is NOT a fault;
/// that is decided by `evaluate_payment`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Network failure, timeout or server-side error.
    #[error("ledger unreachable: {0}")]
    Unreachable(String),

    /// The ledger answered with something that could not be decoded.
    #[error("unexpected ledger response: {0}")]
    InvalidResponse(String),
}

impl LedgerError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}

/// Fetches transactions by hash.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Returns the transaction with its operations, or `None` if the ledger
    /// has no transaction with this hash.
    async fn fetch_transaction(&self, hash: &str) -> Result<Option<LedgerTransaction>, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_client_is_object_safe() {
        fn _accepts_dyn(_client: &dyn LedgerClient) {}
    }

    #[test]
    fn ledger_error_displays_cause() {
        assert_eq!(
            LedgerError::unreachable("connect timeout").to_string(),
            "ledger unreachable: connect timeout"
        );
    }
}
