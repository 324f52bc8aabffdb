//! In-memory ledger store for testing and local development.
//!
//! Implements the tier repository, subscription repository and subscription
//! reader over one shared state. Every write takes the single write lock for
//! its whole duration, which gives each composite operation the same
//! all-or-nothing behaviour the PostgreSQL adapter gets from a transaction.
//! Not suitable for multi-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{
    DomainError, ErrorCode, SubscriptionId, TierId, Timestamp, UserId,
};
use crate::domain::subscription::{
    PaymentRecord, SubscriptionStatus, SubscriptionTier, UserSubscription,
};
use crate::ports::{PaymentTotals, SubscriptionReader, SubscriptionRepository, TierRepository};

#[derive(Debug, Default)]
struct LedgerState {
    tiers: HashMap<TierId, SubscriptionTier>,
    subscriptions: HashMap<SubscriptionId, UserSubscription>,
    /// Keyed by ledger transaction hash.
    payments: HashMap<String, PaymentRecord>,
}

impl LedgerState {
    fn tier_mut(&mut self, id: &TierId) -> Result<&mut SubscriptionTier, DomainError> {
        self.tiers
            .get_mut(id)
            .ok_or_else(|| tier_not_found(id))
    }

    fn release_seats(&mut self, tier_id: &TierId, seats: u32) {
        if let Some(tier) = self.tiers.get_mut(tier_id) {
            tier.subscriber_count = tier.subscriber_count.saturating_sub(seats);
        }
    }

    /// True if another ACTIVE row holds the same (user, tier) pair.
    fn has_other_active(&self, subscription: &UserSubscription) -> bool {
        self.subscriptions.values().any(|s| {
            s.id != subscription.id
                && s.user_id == subscription.user_id
                && s.tier_id == subscription.tier_id
                && s.status == SubscriptionStatus::Active
        })
    }

    fn record_payment(&mut self, payment: &PaymentRecord) -> Result<(), DomainError> {
        if self.payments.contains_key(&payment.ledger_tx_hash) {
            return Err(payment_already_applied(&payment.ledger_tx_hash));
        }
        self.payments
            .insert(payment.ledger_tx_hash.clone(), payment.clone());
        Ok(())
    }
}

/// Shared in-memory store. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded payments (for tests and diagnostics).
    pub async fn payment_count(&self) -> usize {
        self.state.read().await.payments.len()
    }
}

fn tier_not_found(id: &TierId) -> DomainError {
    DomainError::new(ErrorCode::TierNotFound, format!("Tier not found: {}", id))
}

fn subscription_not_found(id: &SubscriptionId) -> DomainError {
    DomainError::new(
        ErrorCode::SubscriptionNotFound,
        format!("Subscription not found: {}", id),
    )
}

fn tier_closed(id: &TierId) -> DomainError {
    DomainError::new(
        ErrorCode::TierInactive,
        "Tier is not accepting new subscribers",
    )
    .with_detail("tier_id", id.to_string())
}

fn subscription_exists() -> DomainError {
    DomainError::new(
        ErrorCode::SubscriptionExists,
        "User already has an active subscription to this tier",
    )
}

fn payment_already_applied(hash: &str) -> DomainError {
    DomainError::new(
        ErrorCode::PaymentAlreadyApplied,
        "Ledger transaction has already been applied to a subscription",
    )
    .with_detail("ledger_tx_hash", hash)
}

fn concurrent_modification(id: &SubscriptionId) -> DomainError {
    DomainError::new(
        ErrorCode::ConcurrentModification,
        "Subscription was modified concurrently; reload and retry",
    )
    .with_detail("subscription_id", id.to_string())
}

#[async_trait]
impl TierRepository for InMemoryLedgerStore {
    async fn save(&self, tier: &SubscriptionTier) -> Result<(), DomainError> {
        let mut state = self.state.write().await;

        if tier.is_free() && tier.active {
            let duplicate = state.tiers.values().any(|t| {
                t.provider_id == tier.provider_id && t.is_free() && t.active && t.id != tier.id
            });
            if duplicate {
                return Err(DomainError::new(
                    ErrorCode::FreeTierExists,
                    "Provider already has an active free tier",
                ));
            }
        }

        state.tiers.insert(tier.id, tier.clone());
        Ok(())
    }

    async fn update(&self, tier: &SubscriptionTier) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let stored = state.tier_mut(&tier.id)?;

        if !stored.active {
            return Err(DomainError::new(
                ErrorCode::TierInactive,
                "Tier has been cancelled",
            ));
        }
        if stored.price != tier.price && stored.is_price_locked() {
            return Err(DomainError::new(
                ErrorCode::PriceLocked,
                "Price cannot change while the tier has subscribers",
            ));
        }

        stored.name = tier.name.clone();
        stored.description = tier.description.clone();
        stored.price = tier.price;
        stored.signal_limit = tier.signal_limit;
        stored.benefits = tier.benefits.clone();
        stored.accepting_new_subscribers = tier.accepting_new_subscribers;
        stored.updated_at = tier.updated_at;
        Ok(())
    }

    async fn find_by_id(&self, id: &TierId) -> Result<Option<SubscriptionTier>, DomainError> {
        Ok(self.state.read().await.tiers.get(id).cloned())
    }

    async fn list_by_provider(
        &self,
        provider_id: &UserId,
        include_inactive: bool,
    ) -> Result<Vec<SubscriptionTier>, DomainError> {
        let state = self.state.read().await;
        let mut tiers: Vec<SubscriptionTier> = state
            .tiers
            .values()
            .filter(|t| &t.provider_id == provider_id && (include_inactive || t.active))
            .cloned()
            .collect();
        tiers.sort_by(|a, b| a.price.cmp(&b.price).then(a.created_at.cmp(&b.created_at)));
        Ok(tiers)
    }

    async fn find_active_free_tier(
        &self,
        provider_id: &UserId,
    ) -> Result<Option<SubscriptionTier>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .tiers
            .values()
            .find(|t| &t.provider_id == provider_id && t.is_free() && t.active)
            .cloned())
    }

    async fn deactivate_with_cascade(
        &self,
        id: &TierId,
        reason: &str,
        at: Timestamp,
    ) -> Result<u64, DomainError> {
        let mut state = self.state.write().await;

        // Validate before touching any subscription.
        let mut tier = state.tier_mut(id)?.clone();
        tier.deactivate(at)?;

        let mut cancelled = 0u64;
        for sub in state
            .subscriptions
            .values_mut()
            .filter(|s| &s.tier_id == id && s.status == SubscriptionStatus::Active)
        {
            sub.cancel(Some(reason.to_string()), true, at)?;
            cancelled += 1;
        }

        state.tiers.insert(tier.id, tier);
        Ok(cancelled)
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryLedgerStore {
    async fn insert_active(
        &self,
        subscription: &UserSubscription,
        payment: Option<&PaymentRecord>,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;

        match state.tiers.get(&subscription.tier_id) {
            None => return Err(tier_not_found(&subscription.tier_id)),
            Some(tier) if !tier.is_open_for_subscription() => {
                return Err(tier_closed(&subscription.tier_id))
            }
            Some(_) => {}
        }
        if state.has_other_active(subscription) {
            return Err(subscription_exists());
        }
        if let Some(payment) = payment {
            state.record_payment(payment)?;
        }

        let tier = state.tier_mut(&subscription.tier_id)?;
        tier.subscriber_count = tier.subscriber_count.saturating_add(1);
        tier.total_revenue = tier.total_revenue.saturating_add(&subscription.amount_paid);

        state
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn update(
        &self,
        subscription: &UserSubscription,
        expected_status: SubscriptionStatus,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let stored = state
            .subscriptions
            .get(&subscription.id)
            .ok_or_else(|| subscription_not_found(&subscription.id))?;

        if stored.status != expected_status || stored.period_end != subscription.period_end {
            return Err(concurrent_modification(&subscription.id));
        }
        if subscription.status == SubscriptionStatus::Active
            && expected_status != SubscriptionStatus::Active
            && state.has_other_active(subscription)
        {
            return Err(subscription_exists());
        }

        state
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn cancel_immediately(&self, subscription: &UserSubscription) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let stored = state
            .subscriptions
            .get_mut(&subscription.id)
            .ok_or_else(|| subscription_not_found(&subscription.id))?;

        if !stored.status.is_counted() || stored.period_end != subscription.period_end {
            return Err(concurrent_modification(&subscription.id));
        }
        *stored = subscription.clone();

        state.release_seats(&subscription.tier_id, 1);
        Ok(())
    }

    async fn apply_renewal(
        &self,
        subscription: &UserSubscription,
        previous_period_end: Timestamp,
        payment: Option<&PaymentRecord>,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let stored = state
            .subscriptions
            .get(&subscription.id)
            .ok_or_else(|| subscription_not_found(&subscription.id))?;

        if stored.period_end != previous_period_end || !stored.status.is_counted() {
            return Err(concurrent_modification(&subscription.id));
        }
        if stored.status == SubscriptionStatus::Suspended && state.has_other_active(subscription) {
            return Err(subscription_exists());
        }
        if !state.tiers.contains_key(&subscription.tier_id) {
            return Err(tier_not_found(&subscription.tier_id));
        }
        if let Some(payment) = payment {
            state.record_payment(payment)?;
            let tier = state.tier_mut(&subscription.tier_id)?;
            tier.total_revenue = tier.total_revenue.saturating_add(&payment.split.gross);
        }

        state
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn expire(&self, id: &SubscriptionId, at: Timestamp) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        let Some(stored) = state.subscriptions.get_mut(id) else {
            return Err(subscription_not_found(id));
        };

        if !stored.status.is_counted() {
            return Ok(false);
        }
        stored.expire(at)?;
        let tier_id = stored.tier_id;

        state.release_seats(&tier_id, 1);
        Ok(true)
    }

    async fn revoke_for_tier(
        &self,
        tier_id: &TierId,
        reason: &str,
        at: Timestamp,
    ) -> Result<u64, DomainError> {
        let mut state = self.state.write().await;

        let mut revoked = 0u32;
        for sub in state
            .subscriptions
            .values_mut()
            .filter(|s| &s.tier_id == tier_id && s.status == SubscriptionStatus::Active)
        {
            sub.cancel(Some(reason.to_string()), true, at)?;
            revoked += 1;
        }

        state.release_seats(tier_id, revoked);
        Ok(u64::from(revoked))
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<UserSubscription>, DomainError> {
        Ok(self.state.read().await.subscriptions.get(id).cloned())
    }

    async fn find_active_for_user_and_tier(
        &self,
        user_id: &UserId,
        tier_id: &TierId,
    ) -> Result<Option<UserSubscription>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .values()
            .find(|s| {
                &s.user_id == user_id
                    && &s.tier_id == tier_id
                    && s.status == SubscriptionStatus::Active
            })
            .cloned())
    }
}

impl InMemoryLedgerStore {
    async fn select<F>(&self, predicate: F) -> Vec<UserSubscription>
    where
        F: Fn(&UserSubscription) -> bool,
    {
        let state = self.state.read().await;
        let mut found: Vec<UserSubscription> = state
            .subscriptions
            .values()
            .filter(|s| predicate(s))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }
}

#[async_trait]
impl SubscriptionReader for InMemoryLedgerStore {
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<UserSubscription>, DomainError> {
        Ok(self.select(|s| &s.user_id == user_id).await)
    }

    async fn list_active_for_user_and_provider(
        &self,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<Vec<UserSubscription>, DomainError> {
        Ok(self
            .select(|s| {
                &s.user_id == user_id
                    && &s.provider_id == provider_id
                    && s.status == SubscriptionStatus::Active
            })
            .await)
    }

    async fn list_active_by_provider(
        &self,
        provider_id: &UserId,
    ) -> Result<Vec<UserSubscription>, DomainError> {
        Ok(self
            .select(|s| &s.provider_id == provider_id && s.status == SubscriptionStatus::Active)
            .await)
    }

    async fn find_due_for_renewal(&self, now: Timestamp) -> Result<Vec<UserSubscription>, DomainError> {
        Ok(self.select(|s| s.is_due_for_renewal(now)).await)
    }

    async fn find_expired_candidates(
        &self,
        now: Timestamp,
    ) -> Result<Vec<UserSubscription>, DomainError> {
        Ok(self.select(|s| s.is_expiry_candidate(now)).await)
    }

    async fn find_renewing_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<UserSubscription>, DomainError> {
        Ok(self
            .select(|s| {
                s.status == SubscriptionStatus::Active
                    && s.auto_renew
                    && s.renews_at >= start
                    && s.renews_at < end
            })
            .await)
    }

    async fn find_by_status(
        &self,
        status: SubscriptionStatus,
    ) -> Result<Vec<UserSubscription>, DomainError> {
        Ok(self.select(|s| s.status == status).await)
    }

    async fn payment_totals_for_tier(&self, tier_id: &TierId) -> Result<PaymentTotals, DomainError> {
        let state = self.state.read().await;
        let totals = state
            .payments
            .values()
            .filter(|p| &p.tier_id == tier_id)
            .fold(PaymentTotals::default(), |acc, p| {
                acc.combine(&PaymentTotals {
                    payment_count: 1,
                    gross: p.split.gross,
                    platform_commission: p.split.platform_commission,
                    provider_earnings: p.split.provider_earnings,
                })
            });
        Ok(totals)
    }

    async fn count_active_for_tier(&self, tier_id: &TierId) -> Result<u64, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .values()
            .filter(|s| &s.tier_id == tier_id && s.status == SubscriptionStatus::Active)
            .count() as u64)
    }
}
