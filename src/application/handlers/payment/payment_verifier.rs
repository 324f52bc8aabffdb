//! PaymentVerifier - Confirms that a ledger transaction pays a subscription.
//!
//! Looks the transaction up through the `LedgerClient` port and evaluates it
//! against the expected amount and wallets. Business mismatches come back as
//! an invalid `VerificationResult`; only ledger faults are errors, so callers
//! can tell "the payment is wrong" apart from "we could not check".

use std::sync::Arc;

use crate::domain::foundation::Money;
use crate::domain::subscription::{
    evaluate_payment, PaymentExpectation, StablecoinAsset, VerificationResult,
};
use crate::ports::{LedgerClient, LedgerError};

/// Verifies stablecoin payments against the ledger.
pub struct PaymentVerifier {
    ledger: Arc<dyn LedgerClient>,
    asset: StablecoinAsset,
}

impl PaymentVerifier {
    pub fn new(ledger: Arc<dyn LedgerClient>, asset: StablecoinAsset) -> Self {
        Self { ledger, asset }
    }

    /// The accepted asset.
    pub fn asset(&self) -> &StablecoinAsset {
        &self.asset
    }

    /// Checks that `tx_hash` moved at least `expected_amount` of the pinned
    /// asset from `expected_sender` to `expected_receiver`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` only when the ledger could not be consulted.
    pub async fn verify(
        &self,
        tx_hash: &str,
        expected_amount: Money,
        expected_sender: &str,
        expected_receiver: &str,
    ) -> Result<VerificationResult, LedgerError> {
        let tx_hash = tx_hash.trim();
        if tx_hash.is_empty() {
            return Ok(VerificationResult::rejected(
                &self.asset,
                "Transaction hash is required",
            ));
        }

        tracing::debug!(tx_hash, %expected_amount, "Verifying ledger payment");

        let Some(tx) = self.ledger.fetch_transaction(tx_hash).await? else {
            tracing::warn!(tx_hash, "Ledger transaction not found");
            return Ok(VerificationResult::rejected(
                &self.asset,
                "Transaction not found on ledger",
            ));
        };

        let expected = PaymentExpectation {
            amount: expected_amount,
            sender: expected_sender.to_string(),
            receiver: expected_receiver.to_string(),
        };
        let result = evaluate_payment(&tx, &expected, &self.asset);

        if result.valid {
            tracing::info!(
                tx_hash,
                paid = ?result.paid_amount.map(|m| m.to_string()),
                "Ledger payment verified"
            );
        } else {
            tracing::warn!(tx_hash, reason = result.reason(), "Ledger payment rejected");
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ledger::MockLedgerClient;
    use crate::domain::subscription::LedgerTransaction;

    const ISSUER: &str = "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN";
    const SUBSCRIBER: &str = "GSUBSCRIBER";
    const PROVIDER: &str = "GPROVIDER";

    fn usdc() -> StablecoinAsset {
        StablecoinAsset::new("USDC", ISSUER)
    }

    fn money(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    fn verifier(ledger: Arc<MockLedgerClient>) -> PaymentVerifier {
        PaymentVerifier::new(ledger, usdc())
    }

    #[tokio::test]
    async fn accepts_exact_payment() {
        let ledger = Arc::new(
            MockLedgerClient::new().with_payment("tx1", "USDC", ISSUER, SUBSCRIBER, PROVIDER, "10"),
        );

        let result = verifier(ledger)
            .verify("tx1", money("10"), SUBSCRIBER, PROVIDER)
            .await
            .unwrap();

        assert!(result.valid);
        assert_eq!(result.paid_amount, Some(money("10")));
        assert_eq!(result.sender.as_deref(), Some(SUBSCRIBER));
        assert_eq!(result.receiver.as_deref(), Some(PROVIDER));
    }

    #[tokio::test]
    async fn empty_hash_is_rejected_without_lookup() {
        let ledger = Arc::new(MockLedgerClient::new());

        let result = verifier(ledger.clone())
            .verify("  ", money("10"), SUBSCRIBER, PROVIDER)
            .await
            .unwrap();

        assert!(!result.valid);
        assert_eq!(ledger.lookup_count(), 0);
    }

    #[tokio::test]
    async fn unknown_transaction_is_rejected() {
        let ledger = Arc::new(MockLedgerClient::new());

        let result = verifier(ledger)
            .verify("missing", money("10"), SUBSCRIBER, PROVIDER)
            .await
            .unwrap();

        assert!(!result.valid);
        assert_eq!(result.reason(), "Transaction not found on ledger");
    }

    #[tokio::test]
    async fn underpayment_beyond_tolerance_is_rejected() {
        let ledger = Arc::new(
            MockLedgerClient::new().with_payment(
                "tx1", "USDC", ISSUER, SUBSCRIBER, PROVIDER, "9.9999998",
            ),
        );

        let result = verifier(ledger)
            .verify("tx1", money("10"), SUBSCRIBER, PROVIDER)
            .await
            .unwrap();

        assert!(!result.valid);
        assert!(result.reason().contains("Insufficient payment"));
    }

    #[tokio::test]
    async fn underpayment_within_one_unit_is_accepted() {
        let ledger = Arc::new(
            MockLedgerClient::new().with_payment(
                "tx1", "USDC", ISSUER, SUBSCRIBER, PROVIDER, "9.9999999",
            ),
        );

        let result = verifier(ledger)
            .verify("tx1", money("10"), SUBSCRIBER, PROVIDER)
            .await
            .unwrap();

        assert!(result.valid);
    }

    #[tokio::test]
    async fn wrong_issuer_is_rejected() {
        let ledger = Arc::new(
            MockLedgerClient::new().with_payment("tx1", "USDC", "GFAKEISSUER", SUBSCRIBER, PROVIDER, "10"),
        );

        let result = verifier(ledger)
            .verify("tx1", money("10"), SUBSCRIBER, PROVIDER)
            .await
            .unwrap();

        assert!(!result.valid);
        assert!(result.reason().starts_with("No USDC payment"));
    }

    #[tokio::test]
    async fn failed_transaction_is_rejected() {
        let ledger = Arc::new(MockLedgerClient::new().with_transaction(LedgerTransaction {
            hash: "tx1".to_string(),
            successful: false,
            operations: vec![],
        }));

        let result = verifier(ledger)
            .verify("tx1", money("10"), SUBSCRIBER, PROVIDER)
            .await
            .unwrap();

        assert!(!result.valid);
    }

    #[tokio::test]
    async fn ledger_fault_is_an_error() {
        let ledger = Arc::new(MockLedgerClient::new().with_error(LedgerError::unreachable("timeout")));

        let result = verifier(ledger)
            .verify("tx1", money("10"), SUBSCRIBER, PROVIDER)
            .await;

        assert!(matches!(result, Err(LedgerError::Unreachable(_))));
    }
}
