//! RevenueSummaryHandler - Query handler for a provider's earnings.
//!
//! Figures come from the payment history, not from the tier accumulators, so
//! the summary can be audited against individual ledger transactions.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;

use crate::domain::foundation::{Money, TierId, UserId};
use crate::domain::subscription::{SubscriptionError, TierLevel};
use crate::ports::{PaymentTotals, SubscriptionReader, TierRepository};

#[derive(Debug, Clone)]
pub struct RevenueSummaryQuery {
    pub provider_id: UserId,
    pub requested_by: UserId,
}

/// Revenue of one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierRevenue {
    pub tier_id: TierId,
    pub tier_name: String,
    pub level: TierLevel,
    pub price: Money,
    pub active: bool,
    pub active_subscribers: u64,
    pub payments: PaymentTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueSummary {
    pub provider_id: UserId,
    pub tiers: Vec<TierRevenue>,
    pub totals: PaymentTotals,
    pub active_subscribers: u64,
}

pub struct RevenueSummaryHandler {
    tiers: Arc<dyn TierRepository>,
    reader: Arc<dyn SubscriptionReader>,
}

impl RevenueSummaryHandler {
    pub fn new(tiers: Arc<dyn TierRepository>, reader: Arc<dyn SubscriptionReader>) -> Self {
        Self { tiers, reader }
    }

    pub async fn handle(&self, query: RevenueSummaryQuery) -> Result<RevenueSummary, SubscriptionError> {
        if query.requested_by != query.provider_id {
            return Err(SubscriptionError::forbidden(
                "Only the provider can view its revenue",
            ));
        }

        // Cancelled tiers still carry historical revenue.
        let tiers = self.tiers.list_by_provider(&query.provider_id, true).await?;

        let per_tier = try_join_all(tiers.into_iter().map(|tier| async move {
            let payments = self.reader.payment_totals_for_tier(&tier.id).await?;
            let active_subscribers = self.reader.count_active_for_tier(&tier.id).await?;
            Ok::<_, SubscriptionError>(TierRevenue {
                tier_id: tier.id,
                tier_name: tier.name,
                level: tier.level,
                price: tier.price,
                active: tier.active,
                active_subscribers,
                payments,
            })
        }))
        .await?;

        let totals = per_tier
            .iter()
            .fold(PaymentTotals::default(), |acc, t| acc.combine(&t.payments));
        let active_subscribers = per_tier.iter().map(|t| t.active_subscribers).sum();

        Ok(RevenueSummary {
            provider_id: query.provider_id,
            tiers: per_tier,
            totals,
            active_subscribers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{SubscribeCommand, SubscribeHandler};
    use super::*;
    use crate::domain::foundation::ErrorCode;

    fn money(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    #[tokio::test]
    async fn sums_payment_history_per_tier() {
        let h = Harness::new();
        let basic = h.tier(TierLevel::Basic, "10").await;
        let vip = h.tier(TierLevel::Vip, "50").await;
        let subscribe = SubscribeHandler::new(
            Arc::new(h.store.clone()),
            Arc::new(h.store.clone()),
            Arc::new(h.wallets.clone()),
            h.verifier.clone(),
            h.splitter,
            h.policy,
        );
        for (i, (tier, amount)) in [(&basic, "10"), (&basic, "10"), (&vip, "50")].iter().enumerate() {
            let hash = format!("tx-{}", i);
            h.pay(&hash, amount);
            subscribe
                .handle(SubscribeCommand {
                    user_id: UserId::new(format!("subscriber-{}", i)).unwrap(),
                    tier_id: tier.id,
                    ledger_tx_hash: Some(hash),
                    subscriber_wallet: Some(SUBSCRIBER_WALLET.to_string()),
                    auto_renew: true,
                })
                .await
                .unwrap();
        }
        let handler = RevenueSummaryHandler::new(Arc::new(h.store.clone()), Arc::new(h.store.clone()));

        let summary = handler
            .handle(RevenueSummaryQuery {
                provider_id: provider(),
                requested_by: provider(),
            })
            .await
            .unwrap();

        assert_eq!(summary.tiers.len(), 2);
        let basic_rev = summary.tiers.iter().find(|t| t.tier_id == basic.id).unwrap();
        assert_eq!(basic_rev.payments.payment_count, 2);
        assert_eq!(basic_rev.payments.gross, money("20"));
        assert_eq!(basic_rev.active_subscribers, 2);
        assert_eq!(summary.totals.gross, money("70"));
        assert_eq!(summary.totals.platform_commission, money("14"));
        assert_eq!(summary.totals.provider_earnings, money("56"));
        assert_eq!(summary.active_subscribers, 3);
    }

    #[tokio::test]
    async fn only_the_provider_may_ask() {
        let h = Harness::new();
        let handler = RevenueSummaryHandler::new(Arc::new(h.store.clone()), Arc::new(h.store.clone()));

        let err = handler
            .handle(RevenueSummaryQuery {
                provider_id: provider(),
                requested_by: subscriber(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn provider_without_tiers_has_zero_totals() {
        let h = Harness::new();
        let handler = RevenueSummaryHandler::new(Arc::new(h.store.clone()), Arc::new(h.store.clone()));

        let summary = handler
            .handle(RevenueSummaryQuery {
                provider_id: provider(),
                requested_by: provider(),
            })
            .await
            .unwrap();

        assert!(summary.tiers.is_empty());
        assert!(summary.totals.gross.is_zero());
    }
}
