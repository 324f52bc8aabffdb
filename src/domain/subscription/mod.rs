//! Subscription domain module.
//!
//! Tiers, subscriptions, revenue accounting and payment evaluation.
//!
//! # Module Structure
//!
//! - `tier` - SubscriptionTier aggregate and TierLevel
//! - `aggregate` - UserSubscription aggregate
//! - `status` - SubscriptionStatus state machine and PaymentStatus
//! - `billing` - BillingPolicy (cycle length, notice window, failure limit)
//! - `revenue` - RevenueSplitter
//! - `payment` - PaymentRecord history entries
//! - `verification` - ledger transaction evaluation
//! - `errors` - SubscriptionError

mod aggregate;
mod billing;
mod errors;
mod payment;
mod revenue;
mod status;
mod tier;
mod verification;

pub use aggregate::{NewSubscription, UserSubscription};
pub use billing::BillingPolicy;
pub use errors::SubscriptionError;
pub use payment::{PaymentKind, PaymentRecord};
pub use revenue::{CommissionRate, RevenueSplit, RevenueSplitter};
pub use status::{PaymentStatus, SubscriptionStatus};
pub use tier::{SubscriptionTier, TierLevel, TierPatch, TierSpec};
pub use verification::{
    evaluate_payment, LedgerOperation, LedgerTransaction, PaymentExpectation, StablecoinAsset,
    VerificationResult,
};
