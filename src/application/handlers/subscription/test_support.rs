//! Shared fixtures for subscription handler tests.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::adapters::ledger::MockLedgerClient;
use crate::adapters::memory::{InMemoryLedgerStore, InMemoryWalletDirectory};
use crate::application::handlers::access::AccessGate;
use crate::application::handlers::payment::PaymentVerifier;
use crate::domain::foundation::{Money, Timestamp, UserId};
use crate::domain::subscription::{
    BillingPolicy, LedgerTransaction, RevenueSplitter, StablecoinAsset, SubscriptionTier,
    TierLevel, TierSpec,
};
use crate::ports::{LedgerClient, LedgerError, TierRepository};

pub const ISSUER: &str = "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN";
pub const SUBSCRIBER_WALLET: &str = "GSUBSCRIBERWALLET";
pub const PROVIDER_WALLET: &str = "GPROVIDERWALLET";

pub fn provider() -> UserId {
    UserId::new("provider-1").unwrap()
}

pub fn subscriber() -> UserId {
    UserId::new("subscriber-1").unwrap()
}

pub struct Harness {
    pub store: InMemoryLedgerStore,
    pub ledger: Arc<MockLedgerClient>,
    pub wallets: InMemoryWalletDirectory,
    pub verifier: Arc<PaymentVerifier>,
    pub gate: Arc<AccessGate>,
    pub policy: BillingPolicy,
    pub splitter: RevenueSplitter,
}

impl Harness {
    pub fn new() -> Self {
        let store = InMemoryLedgerStore::new();
        let ledger = Arc::new(MockLedgerClient::new());
        let wallets = InMemoryWalletDirectory::new().with_wallet(provider(), PROVIDER_WALLET);
        let verifier = Arc::new(PaymentVerifier::new(
            ledger.clone(),
            StablecoinAsset::new("USDC", ISSUER),
        ));
        let gate = Arc::new(AccessGate::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        ));
        Self {
            store,
            ledger,
            wallets,
            verifier,
            gate,
            policy: BillingPolicy::default(),
            splitter: RevenueSplitter::default(),
        }
    }

    pub async fn tier(&self, level: TierLevel, price: &str) -> SubscriptionTier {
        let tier = SubscriptionTier::create(
            provider(),
            TierSpec {
                name: format!("{} tier", level.as_str()),
                description: String::new(),
                level,
                price: Money::parse(price).unwrap(),
                signal_limit: None,
                benefits: vec![],
            },
            Timestamp::now(),
        )
        .unwrap();
        self.store.save(&tier).await.unwrap();
        tier
    }

    /// Registers a USDC payment from the subscriber to the provider.
    pub fn pay(&self, hash: &str, amount: &str) {
        self.ledger
            .add_payment(hash, "USDC", ISSUER, SUBSCRIBER_WALLET, PROVIDER_WALLET, amount);
    }

    /// Swaps in a ledger that runs `during` while each lookup is in flight.
    pub fn interleave<F>(&mut self, during: F)
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        let ledger = Arc::new(InterleavedLedger {
            inner: self.ledger.clone(),
            during: Box::new(during),
        });
        self.verifier = Arc::new(PaymentVerifier::new(ledger, self.verifier.asset().clone()));
    }
}

/// Answers from the mock ledger after another write has landed.
struct InterleavedLedger {
    inner: Arc<MockLedgerClient>,
    during: Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>,
}

#[async_trait]
impl LedgerClient for InterleavedLedger {
    async fn fetch_transaction(&self, hash: &str) -> Result<Option<LedgerTransaction>, LedgerError> {
        (self.during)().await;
        self.inner.fetch_transaction(hash).await
    }
}
