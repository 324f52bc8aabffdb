//! Evaluation of ledger transactions as subscription payments.
//!
//! The ledger client fetches a transaction; this module decides whether it
//! proves the expected payment. Every business mismatch yields a
//! `VerificationResult` with `valid = false` and a readable reason.

use crate::domain::foundation::Money;
use serde::{Deserialize, Serialize};

/// The single stablecoin accepted for payments, pinned by code AND issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StablecoinAsset {
    pub code: String,
    pub issuer: String,
}

impl StablecoinAsset {
    pub fn new(code: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            issuer: issuer.into(),
        }
    }

    fn matches(&self, op: &LedgerOperation) -> bool {
        op.asset_code.as_deref() == Some(self.code.as_str())
            && op.asset_issuer.as_deref() == Some(self.issuer.as_str())
    }
}

/// A transaction as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub hash: String,
    pub successful: bool,
    pub operations: Vec<LedgerOperation>,
}

/// One operation inside a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOperation {
    /// Operation type as named by the ledger (`payment`, `create_account`, ...).
    pub kind: String,
    pub asset_code: Option<String>,
    pub asset_issuer: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Amount as the ledger's decimal string.
    pub amount: Option<String>,
}

impl LedgerOperation {
    pub fn is_payment(&self) -> bool {
        self.kind == "payment"
    }
}

/// What the caller expects the transaction to contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentExpectation {
    pub amount: Money,
    pub sender: String,
    pub receiver: String,
}

/// Outcome of checking a transaction against a `PaymentExpectation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub valid: bool,
    pub paid_amount: Option<Money>,
    pub asset: String,
    pub issuer: String,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub error: Option<String>,
}

impl VerificationResult {
    /// A rejection with no matching operation to report.
    pub fn rejected(asset: &StablecoinAsset, error: impl Into<String>) -> Self {
        Self {
            valid: false,
            paid_amount: None,
            asset: asset.code.clone(),
            issuer: asset.issuer.clone(),
            sender: None,
            receiver: None,
            error: Some(error.into()),
        }
    }

    /// The error message, or a generic one for valid results.
    pub fn reason(&self) -> &str {
        self.error.as_deref().unwrap_or("payment verification failed")
    }
}

fn same_wallet(a: Option<&str>, b: &str) -> bool {
    a.map(|a| a.eq_ignore_ascii_case(b)).unwrap_or(false)
}

/// Checks `tx` for a payment of the pinned asset from `expected.sender` to
/// `expected.receiver` covering `expected.amount` within one ledger unit.
pub fn evaluate_payment(
    tx: &LedgerTransaction,
    expected: &PaymentExpectation,
    asset: &StablecoinAsset,
) -> VerificationResult {
    if !tx.successful {
        return VerificationResult::rejected(asset, "Transaction failed on the ledger");
    }

    let asset_payments: Vec<&LedgerOperation> = tx
        .operations
        .iter()
        .filter(|op| op.is_payment() && asset.matches(op))
        .collect();

    if asset_payments.is_empty() {
        return VerificationResult::rejected(
            asset,
            format!("No {} payment from issuer {} found in transaction", asset.code, asset.issuer),
        );
    }

    let routed: Vec<(&LedgerOperation, Option<Money>)> = asset_payments
        .into_iter()
        .filter(|op| {
            same_wallet(op.from.as_deref(), &expected.sender)
                && same_wallet(op.to.as_deref(), &expected.receiver)
        })
        .map(|op| (op, op.amount.as_deref().and_then(|a| Money::parse(a).ok())))
        .collect();

    // Largest amount first so a transaction with several matching legs is
    // judged by its best one.
    let best = routed
        .into_iter()
        .max_by(|(_, a), (_, b)| a.cmp(b));

    let Some((op, paid)) = best else {
        return VerificationResult::rejected(
            asset,
            format!(
                "Payment sender/receiver mismatch: expected {} -> {}",
                expected.sender, expected.receiver
            ),
        );
    };

    let Some(paid) = paid else {
        return VerificationResult {
            sender: op.from.clone(),
            receiver: op.to.clone(),
            ..VerificationResult::rejected(asset, "Payment amount is missing or malformed")
        };
    };

    let valid = paid.covers(&expected.amount);
    VerificationResult {
        valid,
        paid_amount: Some(paid),
        asset: asset.code.clone(),
        issuer: asset.issuer.clone(),
        sender: op.from.clone(),
        receiver: op.to.clone(),
        error: (!valid).then(|| {
            format!(
                "Insufficient payment: expected {}, received {}",
                expected.amount, paid
            )
        }),
    }
}
