//! Payment handlers.
//!
//! Ledger-backed verification of stablecoin payments.

mod payment_verifier;

pub use payment_verifier::PaymentVerifier;
