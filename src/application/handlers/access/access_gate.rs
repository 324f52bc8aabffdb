//! AccessGate - Answers "may this user see this provider's content?".
//!
//! Read-mostly: besides the access queries it only exposes the narrow status
//! writes (suspend, restore, bulk revoke) other components need.

use std::sync::Arc;

use futures::future::try_join_all;

use crate::domain::foundation::{ErrorCode, SubscriptionId, TierId, Timestamp, UserId};
use crate::domain::subscription::{
    SubscriptionError, SubscriptionStatus, SubscriptionTier, TierLevel, UserSubscription,
};
use crate::ports::{SubscriptionReader, SubscriptionRepository, TierRepository};

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub has_access: bool,
    /// The subscription granting access, on the most expensive tier held.
    pub subscription: Option<UserSubscription>,
    pub tier_level: Option<TierLevel>,
    /// `None` means unlimited (or no access).
    pub signal_limit: Option<u32>,
}

impl AccessDecision {
    fn denied() -> Self {
        Self {
            has_access: false,
            subscription: None,
            tier_level: None,
            signal_limit: None,
        }
    }
}

pub struct AccessGate {
    tiers: Arc<dyn TierRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    reader: Arc<dyn SubscriptionReader>,
}

impl AccessGate {
    pub fn new(
        tiers: Arc<dyn TierRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        reader: Arc<dyn SubscriptionReader>,
    ) -> Self {
        Self {
            tiers,
            subscriptions,
            reader,
        }
    }

    /// Picks the live subscription whose tier has the highest price.
    pub async fn check_access(
        &self,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<AccessDecision, SubscriptionError> {
        let now = Timestamp::now();
        let live: Vec<UserSubscription> = self
            .reader
            .list_active_for_user_and_provider(user_id, provider_id)
            .await?
            .into_iter()
            .filter(|s| s.is_live_at(now))
            .collect();

        if live.is_empty() {
            return Ok(AccessDecision::denied());
        }

        let tiers = try_join_all(live.iter().map(|s| self.tiers.find_by_id(&s.tier_id))).await?;

        let best = live
            .into_iter()
            .zip(tiers)
            .filter_map(|(sub, tier)| tier.map(|t| (sub, t)))
            .max_by(|(_, a), (_, b)| a.price.cmp(&b.price));

        Ok(match best {
            Some((subscription, tier)) => grant(subscription, &tier),
            None => AccessDecision::denied(),
        })
    }

    /// FREE or untagged content is always visible; anything else needs access.
    pub async fn can_user_view_signal(
        &self,
        user_id: &UserId,
        provider_id: &UserId,
        content_level: Option<TierLevel>,
    ) -> Result<bool, SubscriptionError> {
        match content_level {
            None | Some(TierLevel::Free) => Ok(true),
            Some(_) => Ok(self.check_access(user_id, provider_id).await?.has_access),
        }
    }

    /// Cancels every ACTIVE subscription of a tier. Returns the affected count.
    ///
    /// Standalone bulk revoke for moderation or tooling that must cut access
    /// while the tier itself stays live. Tier cancellation does not come
    /// through here: it cascades inside `TierRepository::deactivate_with_cascade`
    /// so the tier flag and the revocations commit together.
    pub async fn revoke_access_for_tier(
        &self,
        tier_id: &TierId,
        reason: &str,
    ) -> Result<u64, SubscriptionError> {
        let revoked = self
            .subscriptions
            .revoke_for_tier(tier_id, reason, Timestamp::now())
            .await?;
        tracing::info!(tier_id = %tier_id, revoked, reason, "Access revoked for tier");
        Ok(revoked)
    }

    /// ACTIVE → SUSPENDED.
    pub async fn suspend_subscription(
        &self,
        id: &SubscriptionId,
        reason: &str,
    ) -> Result<UserSubscription, SubscriptionError> {
        let mut subscription = self.load(id).await?;
        subscription.suspend(reason, Timestamp::now())?;
        self.subscriptions
            .update(&subscription, SubscriptionStatus::Active)
            .await?;
        tracing::warn!(subscription_id = %id, reason, "Subscription suspended");
        Ok(subscription)
    }

    /// SUSPENDED → ACTIVE.
    ///
    /// Refused while the user holds another ACTIVE subscription to the tier.
    pub async fn restore_subscription(
        &self,
        id: &SubscriptionId,
    ) -> Result<UserSubscription, SubscriptionError> {
        let mut subscription = self.load(id).await?;
        subscription.restore(Timestamp::now())?;
        if self
            .subscriptions
            .find_active_for_user_and_tier(&subscription.user_id, &subscription.tier_id)
            .await?
            .is_some()
        {
            return Err(SubscriptionError::conflict(
                ErrorCode::SubscriptionExists,
                "User already has an active subscription to this tier",
            ));
        }
        self.subscriptions
            .update(&subscription, SubscriptionStatus::Suspended)
            .await?;
        tracing::info!(subscription_id = %id, "Subscription restored");
        Ok(subscription)
    }

    async fn load(&self, id: &SubscriptionId) -> Result<UserSubscription, SubscriptionError> {
        self.subscriptions
            .find_by_id(id)
            .await?
            .ok_or(SubscriptionError::subscription_not_found(*id))
    }
}

fn grant(subscription: UserSubscription, tier: &SubscriptionTier) -> AccessDecision {
    AccessDecision {
        has_access: true,
        subscription: Some(subscription),
        tier_level: Some(tier.level),
        signal_limit: tier.signal_limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedgerStore;
    use crate::domain::foundation::Money;
    use crate::domain::subscription::{BillingPolicy, NewSubscription, RevenueSplit, TierSpec};

    fn provider() -> UserId {
        UserId::new("provider-1").unwrap()
    }

    fn subscriber() -> UserId {
        UserId::new("subscriber-1").unwrap()
    }

    struct Fixture {
        store: InMemoryLedgerStore,
        gate: AccessGate,
    }

    impl Fixture {
        fn new() -> Self {
            let store = InMemoryLedgerStore::new();
            let gate = AccessGate::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                Arc::new(store.clone()),
            );
            Self { store, gate }
        }

        async fn tier(&self, level: TierLevel, price: &str, limit: Option<u32>) -> SubscriptionTier {
            let tier = SubscriptionTier::create(
                provider(),
                TierSpec {
                    name: level.as_str().to_string(),
                    description: String::new(),
                    level,
                    price: Money::parse(price).unwrap(),
                    signal_limit: limit,
                    benefits: vec![],
                },
                Timestamp::now(),
            )
            .unwrap();
            self.store.save(&tier).await.unwrap();
            tier
        }

        async fn subscribe(&self, tier: &SubscriptionTier, start: Timestamp) -> UserSubscription {
            let sub = UserSubscription::open(
                NewSubscription {
                    user_id: subscriber(),
                    tier_id: tier.id,
                    provider_id: provider(),
                    ledger_tx_hash: None,
                    subscriber_wallet: None,
                    provider_wallet: None,
                    auto_renew: true,
                },
                RevenueSplit::zero(),
                &BillingPolicy::default(),
                start,
            );
            self.store.insert_active(&sub, None).await.unwrap();
            sub
        }
    }

    #[tokio::test]
    async fn no_subscription_means_no_access() {
        let fx = Fixture::new();

        let decision = fx.gate.check_access(&subscriber(), &provider()).await.unwrap();

        assert_eq!(decision, AccessDecision::denied());
    }

    #[tokio::test]
    async fn picks_the_most_expensive_tier() {
        let fx = Fixture::new();
        let cheap = fx.tier(TierLevel::Basic, "5", Some(3)).await;
        let pricey = fx.tier(TierLevel::Premium, "20", Some(30)).await;
        fx.subscribe(&cheap, Timestamp::now()).await;
        let expected = fx.subscribe(&pricey, Timestamp::now()).await;

        let decision = fx.gate.check_access(&subscriber(), &provider()).await.unwrap();

        assert!(decision.has_access);
        assert_eq!(decision.subscription.map(|s| s.id), Some(expected.id));
        assert_eq!(decision.tier_level, Some(TierLevel::Premium));
        assert_eq!(decision.signal_limit, Some(30));
    }

    #[tokio::test]
    async fn lapsed_period_grants_nothing() {
        let fx = Fixture::new();
        let tier = fx.tier(TierLevel::Basic, "5", None).await;
        fx.subscribe(&tier, Timestamp::now().minus_days(31)).await;

        let decision = fx.gate.check_access(&subscriber(), &provider()).await.unwrap();

        assert!(!decision.has_access);
    }

    #[tokio::test]
    async fn free_and_untagged_signals_are_always_visible() {
        let fx = Fixture::new();

        assert!(fx
            .gate
            .can_user_view_signal(&subscriber(), &provider(), None)
            .await
            .unwrap());
        assert!(fx
            .gate
            .can_user_view_signal(&subscriber(), &provider(), Some(TierLevel::Free))
            .await
            .unwrap());
        assert!(!fx
            .gate
            .can_user_view_signal(&subscriber(), &provider(), Some(TierLevel::Vip))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn suspended_subscription_loses_access_until_restored() {
        let fx = Fixture::new();
        let tier = fx.tier(TierLevel::Basic, "5", None).await;
        let sub = fx.subscribe(&tier, Timestamp::now()).await;

        let suspended = fx.gate.suspend_subscription(&sub.id, "payment failed").await.unwrap();
        assert_eq!(suspended.status, SubscriptionStatus::Suspended);
        assert!(!fx.gate.check_access(&subscriber(), &provider()).await.unwrap().has_access);

        let restored = fx.gate.restore_subscription(&sub.id).await.unwrap();
        assert_eq!(restored.status, SubscriptionStatus::Active);
        assert!(fx.gate.check_access(&subscriber(), &provider()).await.unwrap().has_access);
    }

    #[tokio::test]
    async fn restore_requires_suspension() {
        let fx = Fixture::new();
        let tier = fx.tier(TierLevel::Basic, "5", None).await;
        let sub = fx.subscribe(&tier, Timestamp::now()).await;

        let err = fx.gate.restore_subscription(&sub.id).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn restore_refuses_when_user_resubscribed() {
        let fx = Fixture::new();
        let tier = fx.tier(TierLevel::Basic, "5", None).await;
        let first = fx.subscribe(&tier, Timestamp::now()).await;
        fx.gate.suspend_subscription(&first.id, "payment failed").await.unwrap();
        fx.subscribe(&tier, Timestamp::now()).await;

        let err = fx.gate.restore_subscription(&first.id).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::SubscriptionExists);
        assert_eq!(fx.store.count_active_for_tier(&tier.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn suspend_does_not_revive_expired_row() {
        let fx = Fixture::new();
        let tier = fx.tier(TierLevel::Basic, "5", None).await;
        let sub = fx.subscribe(&tier, Timestamp::now()).await;
        fx.store.expire(&sub.id, Timestamp::now()).await.unwrap();

        // Status write computed from a copy read before the expiry.
        let mut stale = sub.clone();
        stale.suspend("payment failed", Timestamp::now()).unwrap();
        let err = SubscriptionRepository::update(&fx.store, &stale, SubscriptionStatus::Active)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ConcurrentModification);
        let stored = SubscriptionRepository::find_by_id(&fx.store, &sub.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Expired);
    }

    #[tokio::test]
    async fn revoke_cancels_active_subscriptions_and_releases_seats() {
        let fx = Fixture::new();
        let tier = fx.tier(TierLevel::Basic, "5", None).await;
        fx.subscribe(&tier, Timestamp::now()).await;

        let revoked = fx.gate.revoke_access_for_tier(&tier.id, "abuse").await.unwrap();

        assert_eq!(revoked, 1);
        let stored = TierRepository::find_by_id(&fx.store, &tier.id).await.unwrap().unwrap();
        assert_eq!(stored.subscriber_count, 0);
        assert!(!fx.gate.check_access(&subscriber(), &provider()).await.unwrap().has_access);
    }

    #[tokio::test]
    async fn unknown_subscription_is_not_found() {
        let fx = Fixture::new();

        let err = fx
            .gate
            .suspend_subscription(&SubscriptionId::new(), "x")
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::SubscriptionNotFound);
    }
}
