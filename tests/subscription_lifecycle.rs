//! End-to-end lifecycle tests over the in-memory ledger store.
//!
//! These drive the application handlers the way the HTTP layer does, with a
//! mock ledger standing in for Horizon.

use std::sync::Arc;

use futures::future::join_all;

use tier_ledger::adapters::ledger::MockLedgerClient;
use tier_ledger::adapters::memory::{InMemoryLedgerStore, InMemoryWalletDirectory};
use tier_ledger::adapters::notify::TracingRenewalNotifier;
use tier_ledger::application::handlers::{
    CancelTierCommand, CancelTierHandler, CreateTierCommand, CreateTierHandler,
    RevenueSummaryHandler, RevenueSummaryQuery, SubscribeCommand, SubscribeHandler,
    TIER_CANCELLED_REASON,
};
use tier_ledger::application::{AccessGate, PaymentVerifier, RenewalScheduler};
use tier_ledger::domain::foundation::{ErrorCode, Money, Timestamp, UserId};
use tier_ledger::domain::subscription::{
    BillingPolicy, RevenueSplitter, StablecoinAsset, SubscriptionStatus, SubscriptionTier,
    TierLevel, TierSpec,
};
use tier_ledger::ports::{SubscriptionRepository, TierRepository};

const ISSUER: &str = "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN";
const PROVIDER_WALLET: &str = "GPROVIDERWALLET";

struct Ledger {
    store: InMemoryLedgerStore,
    ledger: Arc<MockLedgerClient>,
    provider: UserId,
    subscribe: SubscribeHandler,
}

impl Ledger {
    fn new() -> Self {
        let store = InMemoryLedgerStore::new();
        let ledger = Arc::new(MockLedgerClient::new());
        let provider = user("provider-1");
        let wallets = InMemoryWalletDirectory::new().with_wallet(provider.clone(), PROVIDER_WALLET);
        let verifier = Arc::new(PaymentVerifier::new(
            ledger.clone(),
            StablecoinAsset::new("USDC", ISSUER),
        ));
        let subscribe = SubscribeHandler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(wallets),
            verifier,
            RevenueSplitter::default(),
            BillingPolicy::default(),
        );
        Self {
            store,
            ledger,
            provider,
            subscribe,
        }
    }

    async fn tier(&self, level: TierLevel, price: &str) -> SubscriptionTier {
        CreateTierHandler::new(Arc::new(self.store.clone()))
            .handle(CreateTierCommand {
                provider_id: self.provider.clone(),
                spec: TierSpec {
                    name: format!("{} {}", level.as_str(), price),
                    description: String::new(),
                    level,
                    price: money(price),
                    signal_limit: None,
                    benefits: vec![],
                },
            })
            .await
            .unwrap()
            .tier
    }

    /// Records a payment on the mock ledger and returns the matching command.
    fn paid_command(&self, who: &UserId, tier: &SubscriptionTier, hash: &str) -> SubscribeCommand {
        let wallet = format!("GWALLET{}", who.as_str().to_uppercase());
        self.ledger.add_payment(
            hash,
            "USDC",
            ISSUER,
            &wallet,
            PROVIDER_WALLET,
            &tier.price.to_string(),
        );
        SubscribeCommand {
            user_id: who.clone(),
            tier_id: tier.id,
            ledger_tx_hash: Some(hash.to_string()),
            subscriber_wallet: Some(wallet),
            auto_renew: true,
        }
    }

    fn gate(&self) -> AccessGate {
        AccessGate::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
        )
    }

    async fn stored_tier(&self, tier: &SubscriptionTier) -> SubscriptionTier {
        TierRepository::find_by_id(&self.store, &tier.id)
            .await
            .unwrap()
            .unwrap()
    }
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn money(raw: &str) -> Money {
    Money::parse(raw).unwrap()
}

#[tokio::test]
async fn concurrent_subscribers_are_all_counted() {
    let ledger = Ledger::new();
    let tier = ledger.tier(TierLevel::Premium, "10").await;

    let commands: Vec<SubscribeCommand> = (0..50)
        .map(|i| ledger.paid_command(&user(&format!("sub-{i}")), &tier, &format!("tx-{i}")))
        .collect();
    let results = join_all(commands.into_iter().map(|cmd| ledger.subscribe.handle(cmd))).await;

    assert!(results.iter().all(Result::is_ok));
    let stored = ledger.stored_tier(&tier).await;
    assert_eq!(stored.subscriber_count, 50);
    assert_eq!(stored.total_revenue, money("500"));
    assert_eq!(ledger.store.payment_count().await, 50);
}

#[tokio::test]
async fn paid_subscription_splits_twenty_percent_commission() {
    let ledger = Ledger::new();
    let tier = ledger.tier(TierLevel::Basic, "10").await;
    let subscriber = user("subscriber-1");

    let result = ledger
        .subscribe
        .handle(ledger.paid_command(&subscriber, &tier, "tx-split"))
        .await
        .unwrap();

    assert_eq!(result.subscription.platform_commission, money("2"));
    assert_eq!(result.subscription.provider_earnings, money("8"));

    let summary = RevenueSummaryHandler::new(Arc::new(ledger.store.clone()), Arc::new(ledger.store.clone()))
        .handle(RevenueSummaryQuery {
            provider_id: ledger.provider.clone(),
            requested_by: ledger.provider.clone(),
        })
        .await
        .unwrap();
    assert_eq!(summary.totals.gross, money("10"));
    assert_eq!(summary.totals.provider_earnings, money("8"));
    assert_eq!(summary.active_subscribers, 1);
}

#[tokio::test]
async fn access_resolves_to_the_most_expensive_tier() {
    let ledger = Ledger::new();
    let cheap = ledger.tier(TierLevel::Basic, "5").await;
    let pricey = ledger.tier(TierLevel::Vip, "20").await;
    let subscriber = user("subscriber-1");

    ledger
        .subscribe
        .handle(ledger.paid_command(&subscriber, &cheap, "tx-cheap"))
        .await
        .unwrap();
    let top = ledger
        .subscribe
        .handle(ledger.paid_command(&subscriber, &pricey, "tx-pricey"))
        .await
        .unwrap()
        .subscription;

    let decision = ledger
        .gate()
        .check_access(&subscriber, &ledger.provider)
        .await
        .unwrap();

    assert!(decision.has_access);
    assert_eq!(decision.subscription.map(|s| s.id), Some(top.id));
    assert_eq!(decision.tier_level, Some(TierLevel::Vip));
}

#[tokio::test]
async fn expiry_sweep_is_idempotent() {
    let ledger = Ledger::new();
    let tier = ledger.tier(TierLevel::Premium, "10").await;
    ledger
        .subscribe
        .handle(ledger.paid_command(&user("subscriber-1"), &tier, "tx-expire"))
        .await
        .unwrap();

    let scheduler = RenewalScheduler::new(
        Arc::new(ledger.store.clone()),
        Arc::new(ledger.store.clone()),
        Arc::new(TracingRenewalNotifier::new()),
    );
    let later = Timestamp::now().add_days(31);

    let first = scheduler.expire_sweep(later).await.unwrap();
    let second = scheduler.expire_sweep(later).await.unwrap();

    assert_eq!(first.applied, 1);
    assert_eq!(second.applied, 0);
    assert_eq!(ledger.stored_tier(&tier).await.subscriber_count, 0);
}

#[tokio::test]
async fn cancelling_a_tier_cancels_its_subscriptions() {
    let ledger = Ledger::new();
    let tier = ledger.tier(TierLevel::Premium, "10").await;
    let sub = ledger
        .subscribe
        .handle(ledger.paid_command(&user("subscriber-1"), &tier, "tx-cascade"))
        .await
        .unwrap()
        .subscription;

    let result = CancelTierHandler::new(Arc::new(ledger.store.clone()))
        .handle(CancelTierCommand {
            tier_id: tier.id,
            provider_id: ledger.provider.clone(),
        })
        .await
        .unwrap();

    assert_eq!(result.cancelled_subscriptions, 1);
    let stored_tier = ledger.stored_tier(&tier).await;
    assert!(!stored_tier.active);
    assert_eq!(stored_tier.subscriber_count, 0);

    let stored_sub = SubscriptionRepository::find_by_id(&ledger.store, &sub.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored_sub.status, SubscriptionStatus::Cancelled);
    assert_eq!(stored_sub.cancellation_reason.as_deref(), Some(TIER_CANCELLED_REASON));
}

#[tokio::test]
async fn a_transaction_pays_for_one_subscription_only() {
    let ledger = Ledger::new();
    let first_tier = ledger.tier(TierLevel::Basic, "10").await;
    let second_tier = ledger.tier(TierLevel::Premium, "10").await;
    let subscriber = user("subscriber-1");

    ledger
        .subscribe
        .handle(ledger.paid_command(&subscriber, &first_tier, "tx-shared"))
        .await
        .unwrap();
    let err = ledger
        .subscribe
        .handle(ledger.paid_command(&subscriber, &second_tier, "tx-shared"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::PaymentAlreadyApplied);
    assert_eq!(ledger.stored_tier(&second_tier).await.subscriber_count, 0);
}
