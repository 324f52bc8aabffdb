//! RenewSubscriptionHandler - Command handler for paying the next period.
//!
//! Verification happens before any write. A rejected payment is recorded as a
//! failure on the subscription (and may suspend it); a ledger outage changes
//! nothing and is reported as retryable.

use std::sync::Arc;

use crate::application::handlers::access::AccessGate;
use crate::application::handlers::payment::PaymentVerifier;
use crate::domain::foundation::{ErrorCode, OwnedByUser, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{
    BillingPolicy, PaymentKind, PaymentRecord, RevenueSplit, RevenueSplitter, SubscriptionError,
    SubscriptionStatus, SubscriptionTier, UserSubscription, VerificationResult,
};
use crate::ports::{SubscriptionRepository, TierRepository};

/// Command to renew a subscription. The caller must own it.
#[derive(Debug, Clone)]
pub struct RenewSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    pub user_id: UserId,
    /// Required unless the tier is FREE.
    pub ledger_tx_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RenewSubscriptionResult {
    pub subscription: UserSubscription,
    pub verification: Option<VerificationResult>,
}

pub struct RenewSubscriptionHandler {
    tiers: Arc<dyn TierRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    verifier: Arc<PaymentVerifier>,
    access_gate: Arc<AccessGate>,
    splitter: RevenueSplitter,
    policy: BillingPolicy,
}

impl RenewSubscriptionHandler {
    pub fn new(
        tiers: Arc<dyn TierRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        verifier: Arc<PaymentVerifier>,
        access_gate: Arc<AccessGate>,
        splitter: RevenueSplitter,
        policy: BillingPolicy,
    ) -> Self {
        Self {
            tiers,
            subscriptions,
            verifier,
            access_gate,
            splitter,
            policy,
        }
    }

    pub async fn handle(
        &self,
        cmd: RenewSubscriptionCommand,
    ) -> Result<RenewSubscriptionResult, SubscriptionError> {
        // 1. Load, authorize and check the lifecycle allows renewal
        let mut subscription = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or(SubscriptionError::subscription_not_found(cmd.subscription_id))?;
        subscription.check_ownership(&cmd.user_id)?;
        subscription.ensure_renewable()?;
        if subscription.status == SubscriptionStatus::Suspended
            && self
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

        // 2. Renewals are charged at the tier's current price
        let tier = self
            .tiers
            .find_by_id(&subscription.tier_id)
            .await?
            .ok_or(SubscriptionError::tier_not_found(subscription.tier_id))?;
        if !tier.active {
            return Err(SubscriptionError::InvalidState {
                code: ErrorCode::TierInactive,
                message: "Tier has been cancelled".to_string(),
            });
        }

        // 3. Verify the payment (paid tiers only)
        let (tx_hash, verification) = if tier.is_free() {
            (None, None)
        } else {
            let (tx_hash, verification) = self.verify(&cmd, &subscription, &tier).await?;
            if !verification.valid {
                return Err(self.record_failure(subscription, verification.reason()).await);
            }
            (Some(tx_hash), Some(verification))
        };

        // 4. Extend the period from the old period end
        let now = Timestamp::now();
        let previous_period_end = subscription.period_end;
        let split = if tier.is_free() {
            RevenueSplit::zero()
        } else {
            self.splitter.split(tier.price)
        };
        subscription.apply_renewal(tx_hash.clone(), split, &self.policy, now)?;

        let record = tx_hash.map(|hash| PaymentRecord {
            ledger_tx_hash: hash,
            subscription_id: subscription.id,
            tier_id: tier.id,
            provider_id: tier.provider_id.clone(),
            user_id: subscription.user_id.clone(),
            kind: PaymentKind::Renewal,
            split,
            recorded_at: now,
        });

        // 5. Persist, guarded on the period we extended
        self.subscriptions
            .apply_renewal(&subscription, previous_period_end, record.as_ref())
            .await?;

        tracing::info!(
            subscription_id = %subscription.id,
            renewal_count = subscription.renewal_count,
            period_end = %subscription.period_end,
            "Subscription renewed"
        );

        Ok(RenewSubscriptionResult {
            subscription,
            verification,
        })
    }

    async fn verify(
        &self,
        cmd: &RenewSubscriptionCommand,
        subscription: &UserSubscription,
        tier: &SubscriptionTier,
    ) -> Result<(String, VerificationResult), SubscriptionError> {
        let tx_hash = cmd
            .ledger_tx_hash
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SubscriptionError::validation("ledger_tx_hash", "Required for paid tiers"))?;

        let (Some(sender), Some(receiver)) = (
            subscription.subscriber_wallet.as_deref(),
            subscription.provider_wallet.as_deref(),
        ) else {
            return Err(SubscriptionError::validation(
                "subscriber_wallet",
                "Subscription has no wallets on record",
            ));
        };

        let verification = self
            .verifier
            .verify(tx_hash, tier.price, sender, receiver)
            .await
            .map_err(|e| {
                tracing::warn!(
                    subscription_id = %subscription.id,
                    error = %e,
                    "Renewal verification could not reach the ledger"
                );
                SubscriptionError::ledger_unavailable(e.to_string())
            })?;

        Ok((tx_hash.to_string(), verification))
    }

    /// Books a rejected payment, suspending at the failure limit.
    ///
    /// Always yields the error to return to the caller.
    async fn record_failure(
        &self,
        mut subscription: UserSubscription,
        reason: &str,
    ) -> SubscriptionError {
        let loaded_status = subscription.status;
        let failures = subscription.record_payment_failure(reason, Timestamp::now());
        tracing::warn!(
            subscription_id = %subscription.id,
            failures,
            reason,
            "Renewal payment rejected"
        );

        if let Err(e) = self.subscriptions.update(&subscription, loaded_status).await {
            return e.into();
        }

        if subscription.should_suspend(&self.policy) {
            if let Err(e) = self
                .access_gate
                .suspend_subscription(&subscription.id, reason)
                .await
            {
                return e;
            }
        }

        SubscriptionError::payment_rejected(reason)
    }
}
