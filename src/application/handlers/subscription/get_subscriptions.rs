//! Subscription query handlers.

use std::sync::Arc;

use crate::domain::foundation::{OwnedByUser, SubscriptionId, UserId};
use crate::domain::subscription::{SubscriptionError, UserSubscription};
use crate::ports::{SubscriptionReader, SubscriptionRepository};

/// Query for one subscription.
#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub subscription_id: SubscriptionId,
    /// When set, only this user may read the subscription.
    pub requested_by: Option<UserId>,
}

pub struct GetSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl GetSubscriptionHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<UserSubscription, SubscriptionError> {
        let subscription = self
            .subscriptions
            .find_by_id(&query.subscription_id)
            .await?
            .ok_or(SubscriptionError::subscription_not_found(query.subscription_id))?;

        if let Some(user_id) = &query.requested_by {
            subscription.check_ownership(user_id)?;
        }

        Ok(subscription)
    }
}

/// Query for all of a user's subscriptions, newest first.
#[derive(Debug, Clone)]
pub struct ListUserSubscriptionsQuery {
    pub user_id: UserId,
}

pub struct ListUserSubscriptionsHandler {
    reader: Arc<dyn SubscriptionReader>,
}

impl ListUserSubscriptionsHandler {
    pub fn new(reader: Arc<dyn SubscriptionReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: ListUserSubscriptionsQuery,
    ) -> Result<Vec<UserSubscription>, SubscriptionError> {
        Ok(self.reader.list_by_user(&query.user_id).await?)
    }
}

/// Query for a provider's ACTIVE subscribers. Only the provider may ask.
#[derive(Debug, Clone)]
pub struct ListActiveSubscribersQuery {
    pub provider_id: UserId,
    pub requested_by: UserId,
}

pub struct ListActiveSubscribersHandler {
    reader: Arc<dyn SubscriptionReader>,
}

impl ListActiveSubscribersHandler {
    pub fn new(reader: Arc<dyn SubscriptionReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: ListActiveSubscribersQuery,
    ) -> Result<Vec<UserSubscription>, SubscriptionError> {
        if query.requested_by != query.provider_id {
            return Err(SubscriptionError::forbidden(
                "Only the provider can list its subscribers",
            ));
        }
        Ok(self.reader.list_active_by_provider(&query.provider_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::foundation::{ErrorCode, Timestamp};
    use crate::domain::subscription::{
        BillingPolicy, NewSubscription, RevenueSplit, SubscriptionTier, TierLevel,
    };

    async fn open(h: &Harness, tier: &SubscriptionTier, user: &str) -> UserSubscription {
        let sub = UserSubscription::open(
            NewSubscription {
                user_id: UserId::new(user).unwrap(),
                tier_id: tier.id,
                provider_id: provider(),
                ledger_tx_hash: None,
                subscriber_wallet: None,
                provider_wallet: None,
                auto_renew: true,
            },
            RevenueSplit::zero(),
            &BillingPolicy::default(),
            Timestamp::now(),
        );
        h.store.insert_active(&sub, None).await.unwrap();
        sub
    }

    #[tokio::test]
    async fn owner_can_read_their_subscription() {
        let h = Harness::new();
        let tier = h.tier(TierLevel::Free, "0").await;
        let sub = open(&h, &tier, "subscriber-1").await;
        let handler = GetSubscriptionHandler::new(Arc::new(h.store.clone()));

        let found = handler
            .handle(GetSubscriptionQuery {
                subscription_id: sub.id,
                requested_by: Some(subscriber()),
            })
            .await
            .unwrap();

        assert_eq!(found.id, sub.id);
    }

    #[tokio::test]
    async fn other_users_are_forbidden() {
        let h = Harness::new();
        let tier = h.tier(TierLevel::Free, "0").await;
        let sub = open(&h, &tier, "subscriber-1").await;
        let handler = GetSubscriptionHandler::new(Arc::new(h.store.clone()));

        let err = handler
            .handle(GetSubscriptionQuery {
                subscription_id: sub.id,
                requested_by: Some(UserId::new("snoop").unwrap()),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn lists_only_the_callers_subscriptions() {
        let h = Harness::new();
        let free = h.tier(TierLevel::Free, "0").await;
        let basic = h.tier(TierLevel::Basic, "5").await;
        open(&h, &free, "subscriber-1").await;
        open(&h, &basic, "subscriber-1").await;
        open(&h, &free, "subscriber-2").await;
        let handler = ListUserSubscriptionsHandler::new(Arc::new(h.store.clone()));

        let subs = handler
            .handle(ListUserSubscriptionsQuery {
                user_id: subscriber(),
            })
            .await
            .unwrap();

        assert_eq!(subs.len(), 2);
        assert!(subs.iter().all(|s| s.user_id == subscriber()));
    }

    #[tokio::test]
    async fn provider_lists_active_subscribers() {
        let h = Harness::new();
        let tier = h.tier(TierLevel::Free, "0").await;
        open(&h, &tier, "subscriber-1").await;
        open(&h, &tier, "subscriber-2").await;
        let handler = ListActiveSubscribersHandler::new(Arc::new(h.store.clone()));

        let subs = handler
            .handle(ListActiveSubscribersQuery {
                provider_id: provider(),
                requested_by: provider(),
            })
            .await
            .unwrap();
        assert_eq!(subs.len(), 2);

        let err = handler
            .handle(ListActiveSubscribersQuery {
                provider_id: provider(),
                requested_by: subscriber(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
