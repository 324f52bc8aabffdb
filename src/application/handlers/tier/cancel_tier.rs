//! CancelTierHandler - Command handler for retiring a tier.
//!
//! Cancelling a tier is a soft deactivation: the row stays for reporting,
//! and every ACTIVE subscription on it is cancelled in the same unit of work.

use std::sync::Arc;

use crate::domain::foundation::{ErrorCode, OwnedByUser, TierId, Timestamp, UserId};
use crate::domain::subscription::SubscriptionError;
use crate::ports::TierRepository;

/// Reason recorded on subscriptions ended by a tier cancellation.
pub const TIER_CANCELLED_REASON: &str = "tier cancelled";

#[derive(Debug, Clone)]
pub struct CancelTierCommand {
    pub tier_id: TierId,
    pub provider_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelTierResult {
    pub tier_id: TierId,
    pub cancelled_subscriptions: u64,
}

pub struct CancelTierHandler {
    tiers: Arc<dyn TierRepository>,
}

impl CancelTierHandler {
    pub fn new(tiers: Arc<dyn TierRepository>) -> Self {
        Self { tiers }
    }

    pub async fn handle(&self, cmd: CancelTierCommand) -> Result<CancelTierResult, SubscriptionError> {
        // 1. Load and authorize
        let tier = self
            .tiers
            .find_by_id(&cmd.tier_id)
            .await?
            .ok_or(SubscriptionError::tier_not_found(cmd.tier_id))?;
        tier.check_ownership(&cmd.provider_id)?;

        if !tier.active {
            return Err(SubscriptionError::InvalidState {
                code: ErrorCode::TierInactive,
                message: "Tier is already cancelled".to_string(),
            });
        }

        // 2. Deactivate and cascade atomically
        let cancelled = self
            .tiers
            .deactivate_with_cascade(&tier.id, TIER_CANCELLED_REASON, Timestamp::now())
            .await?;

        tracing::info!(
            tier_id = %tier.id,
            cancelled_subscriptions = cancelled,
            "Subscription tier cancelled"
        );

        Ok(CancelTierResult {
            tier_id: tier.id,
            cancelled_subscriptions: cancelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedgerStore;
    use crate::domain::foundation::Money;
    use crate::domain::subscription::{
        BillingPolicy, NewSubscription, RevenueSplit, SubscriptionStatus, SubscriptionTier,
        TierLevel, TierSpec, UserSubscription,
    };
    use crate::ports::SubscriptionRepository;

    fn provider() -> UserId {
        UserId::new("provider-1").unwrap()
    }

    async fn seed_tier(store: &InMemoryLedgerStore) -> SubscriptionTier {
        let tier = SubscriptionTier::create(
            provider(),
            TierSpec {
                name: "Free".to_string(),
                description: String::new(),
                level: TierLevel::Free,
                price: Money::zero(),
                signal_limit: None,
                benefits: vec![],
            },
            Timestamp::now(),
        )
        .unwrap();
        store.save(&tier).await.unwrap();
        tier
    }

    async fn seed_subscription(store: &InMemoryLedgerStore, tier: &SubscriptionTier, user: &str) -> UserSubscription {
        let sub = UserSubscription::open(
            NewSubscription {
                user_id: UserId::new(user).unwrap(),
                tier_id: tier.id,
                provider_id: tier.provider_id.clone(),
                ledger_tx_hash: None,
                subscriber_wallet: None,
                provider_wallet: None,
                auto_renew: true,
            },
            RevenueSplit::zero(),
            &BillingPolicy::default(),
            Timestamp::now(),
        );
        store.insert_active(&sub, None).await.unwrap();
        sub
    }

    #[tokio::test]
    async fn cancels_tier_and_its_active_subscriptions() {
        let store = InMemoryLedgerStore::new();
        let tier = seed_tier(&store).await;
        let a = seed_subscription(&store, &tier, "user-a").await;
        let b = seed_subscription(&store, &tier, "user-b").await;
        let handler = CancelTierHandler::new(Arc::new(store.clone()));

        let result = handler
            .handle(CancelTierCommand {
                tier_id: tier.id,
                provider_id: provider(),
            })
            .await
            .unwrap();

        assert_eq!(result.cancelled_subscriptions, 2);
        let stored = TierRepository::find_by_id(&store, &tier.id).await.unwrap().unwrap();
        assert!(!stored.active);
        assert_eq!(stored.subscriber_count, 0);
        for id in [a.id, b.id] {
            let sub = SubscriptionRepository::find_by_id(&store, &id).await.unwrap().unwrap();
            assert_eq!(sub.status, SubscriptionStatus::Cancelled);
            assert_eq!(sub.cancellation_reason.as_deref(), Some(TIER_CANCELLED_REASON));
        }
    }

    #[tokio::test]
    async fn second_cancel_is_rejected() {
        let store = InMemoryLedgerStore::new();
        let tier = seed_tier(&store).await;
        let handler = CancelTierHandler::new(Arc::new(store));
        let cmd = CancelTierCommand {
            tier_id: tier.id,
            provider_id: provider(),
        };
        handler.handle(cmd.clone()).await.unwrap();

        let err = handler.handle(cmd).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::TierInactive);
    }

    #[tokio::test]
    async fn non_owner_is_forbidden() {
        let store = InMemoryLedgerStore::new();
        let tier = seed_tier(&store).await;
        let handler = CancelTierHandler::new(Arc::new(store));

        let err = handler
            .handle(CancelTierCommand {
                tier_id: tier.id,
                provider_id: UserId::new("someone-else").unwrap(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
