//! SubscribeHandler - Command handler for buying a tier.

use std::sync::Arc;

use crate::application::handlers::payment::PaymentVerifier;
use crate::domain::foundation::{ErrorCode, TierId, Timestamp, UserId};
use crate::domain::subscription::{
    BillingPolicy, NewSubscription, PaymentKind, PaymentRecord, RevenueSplit, RevenueSplitter,
    SubscriptionError, SubscriptionTier, UserSubscription, VerificationResult,
};
use crate::ports::{SubscriptionRepository, TierRepository, WalletDirectory};

/// Command to subscribe the caller to a tier.
#[derive(Debug, Clone)]
pub struct SubscribeCommand {
    pub user_id: UserId,
    pub tier_id: TierId,
    /// Required for paid tiers.
    pub ledger_tx_hash: Option<String>,
    /// Required for paid tiers.
    pub subscriber_wallet: Option<String>,
    pub auto_renew: bool,
}

#[derive(Debug, Clone)]
pub struct SubscribeResult {
    pub subscription: UserSubscription,
    /// `None` for FREE tiers.
    pub verification: Option<VerificationResult>,
}

/// Handler for new subscriptions.
///
/// Paid tiers are verified against the ledger before anything is written.
/// The subscription row, the payment record and the tier counters are then
/// persisted as one atomic unit.
pub struct SubscribeHandler {
    tiers: Arc<dyn TierRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    wallets: Arc<dyn WalletDirectory>,
    verifier: Arc<PaymentVerifier>,
    splitter: RevenueSplitter,
    policy: BillingPolicy,
}

impl SubscribeHandler {
    pub fn new(
        tiers: Arc<dyn TierRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        wallets: Arc<dyn WalletDirectory>,
        verifier: Arc<PaymentVerifier>,
        splitter: RevenueSplitter,
        policy: BillingPolicy,
    ) -> Self {
        Self {
            tiers,
            subscriptions,
            wallets,
            verifier,
            splitter,
            policy,
        }
    }

    pub async fn handle(&self, cmd: SubscribeCommand) -> Result<SubscribeResult, SubscriptionError> {
        // 1. Load the tier and check it is open
        let tier = self
            .tiers
            .find_by_id(&cmd.tier_id)
            .await?
            .ok_or(SubscriptionError::tier_not_found(cmd.tier_id))?;

        if !tier.is_open_for_subscription() {
            return Err(SubscriptionError::InvalidState {
                code: ErrorCode::TierInactive,
                message: "Tier is not accepting new subscribers".to_string(),
            });
        }

        // 2. Reject duplicates early (storage enforces it again)
        if self
            .subscriptions
            .find_active_for_user_and_tier(&cmd.user_id, &tier.id)
            .await?
            .is_some()
        {
            return Err(SubscriptionError::conflict(
                ErrorCode::SubscriptionExists,
                "User already has an active subscription to this tier",
            ));
        }

        // 3. Verify payment for paid tiers
        let (payment, verification) = if tier.is_free() {
            (None, None)
        } else {
            let (proof, verification) = self.verify_initial_payment(&cmd, &tier).await?;
            (Some(proof), Some(verification))
        };

        // 4. Build the subscription and its payment record
        let now = Timestamp::now();
        let split = match &payment {
            Some(_) => self.splitter.split(tier.price),
            None => RevenueSplit::zero(),
        };
        let (ledger_tx_hash, provider_wallet) = match payment {
            Some(PaidProof { tx_hash, provider_wallet }) => (Some(tx_hash), Some(provider_wallet)),
            None => (None, None),
        };

        let subscription = UserSubscription::open(
            NewSubscription {
                user_id: cmd.user_id,
                tier_id: tier.id,
                provider_id: tier.provider_id.clone(),
                ledger_tx_hash: ledger_tx_hash.clone(),
                subscriber_wallet: cmd.subscriber_wallet.map(|w| w.trim().to_string()),
                provider_wallet,
                auto_renew: cmd.auto_renew,
            },
            split,
            &self.policy,
            now,
        );

        let record = ledger_tx_hash.map(|hash| PaymentRecord {
            ledger_tx_hash: hash,
            subscription_id: subscription.id,
            tier_id: tier.id,
            provider_id: tier.provider_id.clone(),
            user_id: subscription.user_id.clone(),
            kind: PaymentKind::Initial,
            split,
            recorded_at: now,
        });

        // 5. Persist atomically
        self.subscriptions
            .insert_active(&subscription, record.as_ref())
            .await?;

        tracing::info!(
            subscription_id = %subscription.id,
            tier_id = %tier.id,
            user_id = %subscription.user_id,
            amount_paid = %subscription.amount_paid,
            "Subscription created"
        );

        Ok(SubscribeResult {
            subscription,
            verification,
        })
    }

    async fn verify_initial_payment(
        &self,
        cmd: &SubscribeCommand,
        tier: &SubscriptionTier,
    ) -> Result<(PaidProof, VerificationResult), SubscriptionError> {
        let tx_hash = required(cmd.ledger_tx_hash.as_deref(), "ledger_tx_hash")?;
        let subscriber_wallet = required(cmd.subscriber_wallet.as_deref(), "subscriber_wallet")?;

        let provider_wallet = self
            .wallets
            .wallet_for(&tier.provider_id)
            .await?
            .filter(|w| !w.trim().is_empty())
            .ok_or_else(|| {
                SubscriptionError::validation("provider_wallet", "Provider has no registered wallet")
            })?;

        let verification = self
            .verifier
            .verify(&tx_hash, tier.price, &subscriber_wallet, &provider_wallet)
            .await
            .map_err(|e| SubscriptionError::ledger_unavailable(e.to_string()))?;

        if !verification.valid {
            return Err(SubscriptionError::payment_rejected(verification.reason()));
        }

        Ok((
            PaidProof {
                tx_hash,
                provider_wallet,
            },
            verification,
        ))
    }
}

struct PaidProof {
    tx_hash: String,
    provider_wallet: String,
}

fn required(value: Option<&str>, field: &str) -> Result<String, SubscriptionError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SubscriptionError::validation(field, "Required for paid tiers"))
}
