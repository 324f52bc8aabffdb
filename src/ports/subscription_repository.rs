//! Subscription repository port (write side).
//!
//! Every method that moves money or seats is a single atomic unit covering
//! the subscription row(s), the one affected tier row and, for payments, the
//! payment record. Ledger verification always happens before any of these
//! is called.
//!
//! # Counter rules
//!
//! | Operation | subscriber_count | total_revenue |
//! |-----------|------------------|---------------|
//! | `insert_active` | +1 | +gross |
//! | `apply_renewal` | unchanged | +gross |
//! | `cancel_immediately` | -1, floored at 0 | unchanged |
//! | `expire` | -1, floored at 0 (only if the row changed) | unchanged |
//! | `revoke_for_tier` | -affected, floored at 0 | unchanged |

use crate::domain::foundation::{DomainError, SubscriptionId, TierId, Timestamp, UserId};
use crate::domain::subscription::{PaymentRecord, SubscriptionStatus, UserSubscription};
use async_trait::async_trait;

/// Repository port for subscription persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a new ACTIVE subscription and bump its tier's counters.
    ///
    /// `payment` is `None` for FREE tiers.
    ///
    /// # Errors
    ///
    /// - `SubscriptionExists` if the user already has an ACTIVE subscription to the tier
    /// - `PaymentAlreadyApplied` if the payment's transaction hash was used before
    /// - `TierNotFound` if the tier row is gone
    /// - `TierInactive` if the tier stopped accepting subscribers
    async fn insert_active(
        &self,
        subscription: &UserSubscription,
        payment: Option<&PaymentRecord>,
    ) -> Result<(), DomainError>;

    /// Write the subscription's fields without touching any counter.
    ///
    /// Used for failure bookkeeping, deferred cancellation, suspend and restore.
    /// The write only applies while the stored row still has `expected_status`
    /// and the same `period_end`.
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` if the stored row moved on
    /// - `SubscriptionExists` if the write would make a second ACTIVE row for
    ///   the same user and tier
    async fn update(
        &self,
        subscription: &UserSubscription,
        expected_status: SubscriptionStatus,
    ) -> Result<(), DomainError>;

    /// Persist an immediate cancellation and release the tier seat.
    ///
    /// Refused with `ConcurrentModification` unless the stored row is still
    /// ACTIVE or SUSPENDED in the same period.
    async fn cancel_immediately(&self, subscription: &UserSubscription) -> Result<(), DomainError>;

    /// Persist a renewed subscription, record the payment and add the gross
    /// to the tier's revenue. `payment` is `None` for FREE tiers.
    ///
    /// The write only applies if the stored `period_end` still equals
    /// `previous_period_end`; otherwise another renewal won and
    /// `ConcurrentModification` is returned. Reactivating a SUSPENDED row is
    /// refused with `SubscriptionExists` when the user already holds another
    /// ACTIVE subscription to the tier.
    async fn apply_renewal(
        &self,
        subscription: &UserSubscription,
        previous_period_end: Timestamp,
        payment: Option<&PaymentRecord>,
    ) -> Result<(), DomainError>;

    /// Move an ACTIVE or SUSPENDED subscription to EXPIRED and release its seat.
    ///
    /// Returns `false` without side effects if the subscription was already
    /// terminal, so repeated sweeps are harmless.
    async fn expire(&self, id: &SubscriptionId, at: Timestamp) -> Result<bool, DomainError>;

    /// Cancel every ACTIVE subscription of a tier, releasing their seats.
    ///
    /// Returns the number of subscriptions cancelled.
    async fn revoke_for_tier(
        &self,
        tier_id: &TierId,
        reason: &str,
        at: Timestamp,
    ) -> Result<u64, DomainError>;

    /// Find a subscription by ID.
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<UserSubscription>, DomainError>;

    /// The user's ACTIVE subscription to a tier, if any.
    async fn find_active_for_user_and_tier(
        &self,
        user_id: &UserId,
        tier_id: &TierId,
    ) -> Result<Option<UserSubscription>, DomainError>;
}
