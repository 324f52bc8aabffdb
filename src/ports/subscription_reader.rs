//! Subscription reader port (read side).
//!
//! Queries used by the access gate, the renewal scheduler and provider
//! dashboards. Results may lag the write side slightly.

use crate::domain::foundation::{DomainError, Money, TierId, Timestamp, UserId};
use crate::domain::subscription::{SubscriptionStatus, UserSubscription};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reader port for subscription queries.
#[async_trait]
pub trait SubscriptionReader: Send + Sync {
    /// All subscriptions of a user, newest first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<UserSubscription>, DomainError>;

    /// ACTIVE subscriptions a user holds with one provider.
    async fn list_active_for_user_and_provider(
        &self,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<Vec<UserSubscription>, DomainError>;

    /// ACTIVE subscriptions across all of a provider's tiers.
    async fn list_active_by_provider(
        &self,
        provider_id: &UserId,
    ) -> Result<Vec<UserSubscription>, DomainError>;

    /// ACTIVE, auto-renewing subscriptions with `renews_at <= now`.
    async fn find_due_for_renewal(&self, now: Timestamp) -> Result<Vec<UserSubscription>, DomainError>;

    /// ACTIVE or SUSPENDED subscriptions with `period_end <= now`.
    async fn find_expired_candidates(
        &self,
        now: Timestamp,
    ) -> Result<Vec<UserSubscription>, DomainError>;

    /// ACTIVE, auto-renewing subscriptions with `start <= renews_at < end`.
    async fn find_renewing_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<UserSubscription>, DomainError>;

    /// All subscriptions in a status.
    async fn find_by_status(
        &self,
        status: SubscriptionStatus,
    ) -> Result<Vec<UserSubscription>, DomainError>;

    /// Sums of completed payments recorded against a tier.
    async fn payment_totals_for_tier(&self, tier_id: &TierId) -> Result<PaymentTotals, DomainError>;

    /// Number of ACTIVE subscriptions to a tier.
    async fn count_active_for_tier(&self, tier_id: &TierId) -> Result<u64, DomainError>;
}

/// Aggregated completed payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentTotals {
    pub payment_count: u64,
    pub gross: Money,
    pub platform_commission: Money,
    pub provider_earnings: Money,
}

impl PaymentTotals {
    /// Adds another set of totals.
    pub fn combine(&self, other: &PaymentTotals) -> PaymentTotals {
        PaymentTotals {
            payment_count: self.payment_count + other.payment_count,
            gross: self.gross.saturating_add(&other.gross),
            platform_commission: self.platform_commission.saturating_add(&other.platform_commission),
            provider_earnings: self.provider_earnings.saturating_add(&other.provider_earnings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_reader_is_object_safe() {
        fn _accepts_dyn(_reader: &dyn SubscriptionReader) {}
    }

    #[test]
    fn totals_combine_fieldwise() {
        let a = PaymentTotals {
            payment_count: 1,
            gross: Money::parse("10").unwrap(),
            platform_commission: Money::parse("2").unwrap(),
            provider_earnings: Money::parse("8").unwrap(),
        };

        let sum = a.combine(&a);

        assert_eq!(sum.payment_count, 2);
        assert_eq!(sum.gross, Money::parse("20").unwrap());
        assert_eq!(sum.provider_earnings, Money::parse("16").unwrap());
    }
}
