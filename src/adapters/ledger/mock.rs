//! Mock ledger client for testing.
//!
//! # Example
//!
//! ```ignore
//! let ledger = MockLedgerClient::new()
//!     .with_payment("abc...", "USDC", ISSUER, "GSUBSCRIBER", "GPROVIDER", "10");
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::domain::subscription::{LedgerOperation, LedgerTransaction};
use crate::ports::{LedgerClient, LedgerError};

/// Ledger client answering from a fixed set of transactions.
#[derive(Debug, Default)]
pub struct MockLedgerClient {
    transactions: Mutex<HashMap<String, LedgerTransaction>>,
    force_error: Mutex<Option<LedgerError>>,
    lookups: AtomicUsize,
}

impl MockLedgerClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn transactions(&self) -> MutexGuard<'_, HashMap<String, LedgerTransaction>> {
        self.transactions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a transaction.
    pub fn with_transaction(self, tx: LedgerTransaction) -> Self {
        self.add_transaction(tx);
        self
    }

    /// Registers a successful transaction with one payment operation.
    pub fn with_payment(
        self,
        hash: &str,
        asset_code: &str,
        asset_issuer: &str,
        from: &str,
        to: &str,
        amount: &str,
    ) -> Self {
        self.add_payment(hash, asset_code, asset_issuer, from, to, amount);
        self
    }

    /// Makes every lookup fail with `error`.
    pub fn with_error(self, error: LedgerError) -> Self {
        *self.force_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
        self
    }

    pub fn add_transaction(&self, tx: LedgerTransaction) {
        self.transactions().insert(tx.hash.clone(), tx);
    }

    pub fn add_payment(
        &self,
        hash: &str,
        asset_code: &str,
        asset_issuer: &str,
        from: &str,
        to: &str,
        amount: &str,
    ) {
        self.add_transaction(LedgerTransaction {
            hash: hash.to_string(),
            successful: true,
            operations: vec![LedgerOperation {
                kind: "payment".to_string(),
                asset_code: Some(asset_code.to_string()),
                asset_issuer: Some(asset_issuer.to_string()),
                from: Some(from.to_string()),
                to: Some(to.to_string()),
                amount: Some(amount.to_string()),
            }],
        });
    }

    /// Number of `fetch_transaction` calls so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    async fn fetch_transaction(&self, hash: &str) -> Result<Option<LedgerTransaction>, LedgerError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self
            .force_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return Err(error);
        }

        Ok(self.transactions().get(hash).cloned())
    }
}
