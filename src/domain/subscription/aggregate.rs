//! UserSubscription aggregate.
//!
//! One row per purchase of a tier by a user. The row carries the split of the
//! most recent payment, the current billing window and renewal bookkeeping.
//!
//! # Design Decisions
//!
//! - **Exact money**: amounts are `Money` (7-digit decimals), never floats
//! - **Wallet snapshot**: both wallets are frozen at subscribe time and
//!   reused for every renewal verification
//! - **Anchored renewals**: a renewal starts where the previous period ended,
//!   not at the wall-clock time it was paid

use crate::domain::foundation::{
    DomainError, ErrorCode, Money, OwnedByUser, StateMachine, SubscriptionId, TierId, Timestamp,
    UserId,
};
use serde::{Deserialize, Serialize};

use super::{BillingPolicy, PaymentStatus, RevenueSplit, SubscriptionStatus};

/// Everything needed to open a subscription besides the money split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub user_id: UserId,
    pub tier_id: TierId,
    pub provider_id: UserId,
    pub ledger_tx_hash: Option<String>,
    pub subscriber_wallet: Option<String>,
    pub provider_wallet: Option<String>,
    pub auto_renew: bool,
}

/// A user's subscription to one tier.
///
/// # Invariants
///
/// - `period_end > period_start`
/// - `renews_at = period_end - notice window`
/// - `payment_failure_count` is zero after any successful payment
/// - `Cancelled` and `Expired` are terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSubscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub tier_id: TierId,
    pub provider_id: UserId,
    pub status: SubscriptionStatus,
    pub payment_status: PaymentStatus,
    pub amount_paid: Money,
    pub platform_commission: Money,
    pub provider_earnings: Money,
    pub ledger_tx_hash: Option<String>,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
    pub renews_at: Timestamp,
    pub subscriber_wallet: Option<String>,
    pub provider_wallet: Option<String>,
    pub auto_renew: bool,
    pub renewal_count: u32,
    pub payment_failure_count: u32,
    pub last_failure_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserSubscription {
    /// Opens an active subscription whose first period starts at `now`.
    pub fn open(
        new: NewSubscription,
        split: RevenueSplit,
        policy: &BillingPolicy,
        now: Timestamp,
    ) -> Self {
        let period_end = policy.period_end(now);
        Self {
            id: SubscriptionId::new(),
            user_id: new.user_id,
            tier_id: new.tier_id,
            provider_id: new.provider_id,
            status: SubscriptionStatus::Active,
            payment_status: PaymentStatus::Completed,
            amount_paid: split.gross,
            platform_commission: split.platform_commission,
            provider_earnings: split.provider_earnings,
            ledger_tx_hash: new.ledger_tx_hash,
            period_start: now,
            period_end,
            renews_at: policy.renews_at(period_end),
            subscriber_wallet: new.subscriber_wallet,
            provider_wallet: new.provider_wallet,
            auto_renew: new.auto_renew,
            renewal_count: 0,
            payment_failure_count: 0,
            last_failure_reason: None,
            cancellation_reason: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True if the subscription currently grants access.
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        self.status == SubscriptionStatus::Active && self.period_end.is_after(&now)
    }

    /// Active, auto-renewing and inside the notice window.
    pub fn is_due_for_renewal(&self, now: Timestamp) -> bool {
        self.status == SubscriptionStatus::Active && self.auto_renew && self.renews_at <= now
    }

    /// Still holding a seat but past its period end.
    pub fn is_expiry_candidate(&self, now: Timestamp) -> bool {
        self.status.is_counted() && self.period_end <= now
    }

    /// Cancels the subscription.
    ///
    /// Auto-renew is always switched off. With `immediate` the status moves to
    /// `Cancelled` at once; otherwise it stays as is and the expiry sweep ends
    /// it at `period_end`.
    pub fn cancel(
        &mut self,
        reason: Option<String>,
        immediate: bool,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(self.invalid_transition("cancel"));
        }
        if immediate {
            self.transition_to(SubscriptionStatus::Cancelled)?;
        }
        self.auto_renew = false;
        self.cancellation_reason = reason;
        self.cancelled_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Checks that a renewal may be attempted.
    pub fn ensure_renewable(&self) -> Result<(), DomainError> {
        if !self.auto_renew {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Auto-renew is disabled for this subscription",
            ));
        }
        match self.status {
            SubscriptionStatus::Active | SubscriptionStatus::Suspended => Ok(()),
            _ => Err(self.invalid_transition("renew")),
        }
    }

    /// Records a failed renewal attempt and returns the new failure count.
    pub fn record_payment_failure(&mut self, reason: impl Into<String>, now: Timestamp) -> u32 {
        self.payment_failure_count = self.payment_failure_count.saturating_add(1);
        self.last_failure_reason = Some(reason.into());
        self.payment_status = PaymentStatus::Failed;
        self.updated_at = now;
        self.payment_failure_count
    }

    /// True once failures reached the policy limit while still active.
    pub fn should_suspend(&self, policy: &BillingPolicy) -> bool {
        self.status == SubscriptionStatus::Active
            && self.payment_failure_count >= policy.max_payment_failures
    }

    /// Applies a verified renewal payment (`ledger_tx_hash` is `None` for FREE tiers).
    ///
    /// The new period starts at the previous `period_end`.
    pub fn apply_renewal(
        &mut self,
        ledger_tx_hash: Option<String>,
        split: RevenueSplit,
        policy: &BillingPolicy,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.ensure_renewable()?;
        if self.status == SubscriptionStatus::Suspended {
            self.transition_to(SubscriptionStatus::Active)?;
        }

        let period_start = self.period_end;
        let period_end = policy.period_end(period_start);

        self.period_start = period_start;
        self.period_end = period_end;
        self.renews_at = policy.renews_at(period_end);
        self.amount_paid = split.gross;
        self.platform_commission = split.platform_commission;
        self.provider_earnings = split.provider_earnings;
        self.ledger_tx_hash = ledger_tx_hash;
        self.renewal_count = self.renewal_count.saturating_add(1);
        self.payment_failure_count = 0;
        self.last_failure_reason = None;
        self.payment_status = PaymentStatus::Completed;
        self.updated_at = now;
        Ok(())
    }

    /// Withholds access after repeated payment failures.
    pub fn suspend(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Suspended)?;
        self.last_failure_reason = Some(reason.into());
        self.updated_at = now;
        Ok(())
    }

    /// Lifts a suspension without a payment.
    pub fn restore(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.status != SubscriptionStatus::Suspended {
            return Err(self.invalid_transition("restore"));
        }
        self.transition_to(SubscriptionStatus::Active)?;
        self.last_failure_reason = None;
        self.updated_at = now;
        Ok(())
    }

    /// Ends the subscription at its period end.
    pub fn expire(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Expired)?;
        self.auto_renew = false;
        self.updated_at = now;
        Ok(())
    }

    fn transition_to(&mut self, target: SubscriptionStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition subscription from {} to {}",
                    self.status, target
                ),
            )
        })?;
        Ok(())
    }

    fn invalid_transition(&self, attempted: &str) -> DomainError {
        DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!("Cannot {} a {} subscription", attempted, self.status),
        )
        .with_detail("status", self.status.as_str())
    }
}

impl OwnedByUser for UserSubscription {
    fn owner_id(&self) -> &UserId {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::RevenueSplitter;
    use chrono::{TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    fn policy() -> BillingPolicy {
        BillingPolicy::default()
    }

    fn split(amount: &str) -> RevenueSplit {
        RevenueSplitter::default().split(Money::parse(amount).unwrap())
    }

    fn new_subscription() -> NewSubscription {
        NewSubscription {
            user_id: UserId::new("subscriber-1").unwrap(),
            tier_id: TierId::new(),
            provider_id: UserId::new("provider-1").unwrap(),
            ledger_tx_hash: Some("abc123".to_string()),
            subscriber_wallet: Some("GSUBSCRIBER".to_string()),
            provider_wallet: Some("GPROVIDER".to_string()),
            auto_renew: true,
        }
    }

    fn active_at(start: Timestamp) -> UserSubscription {
        UserSubscription::open(new_subscription(), split("10"), &policy(), start)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Opening
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn open_sets_period_and_split() {
        let sub = active_at(at(2024, 1, 1));

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.payment_status, PaymentStatus::Completed);
        assert_eq!(sub.period_end, at(2024, 1, 31));
        assert_eq!(sub.renews_at, at(2024, 1, 28));
        assert_eq!(sub.platform_commission, Money::parse("2").unwrap());
        assert_eq!(sub.provider_earnings, Money::parse("8").unwrap());
        assert_eq!(sub.renewal_count, 0);
    }

    #[test]
    fn live_only_while_active_and_before_period_end() {
        let sub = active_at(at(2024, 1, 1));

        assert!(sub.is_live_at(at(2024, 1, 15)));
        assert!(!sub.is_live_at(at(2024, 1, 31)));
    }

    #[test]
    fn due_for_renewal_inside_notice_window() {
        let sub = active_at(at(2024, 1, 1));

        assert!(!sub.is_due_for_renewal(at(2024, 1, 27)));
        assert!(sub.is_due_for_renewal(at(2024, 1, 28)));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Cancellation
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn deferred_cancel_keeps_status_but_stops_renewal() {
        let mut sub = active_at(at(2024, 1, 1));

        sub.cancel(Some("too pricey".to_string()), false, at(2024, 1, 5)).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(!sub.auto_renew);
        assert_eq!(sub.cancelled_at, Some(at(2024, 1, 5)));
        assert_eq!(sub.cancellation_reason.as_deref(), Some("too pricey"));
    }

    #[test]
    fn immediate_cancel_ends_subscription() {
        let mut sub = active_at(at(2024, 1, 1));

        sub.cancel(None, true, at(2024, 1, 5)).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert!(!sub.auto_renew);
    }

    #[test]
    fn cancel_rejected_when_terminal() {
        let mut sub = active_at(at(2024, 1, 1));
        sub.expire(at(2024, 2, 1)).unwrap();

        let err = sub.cancel(None, true, at(2024, 2, 2)).unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Renewal
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn renewal_is_anchored_to_previous_period_end() {
        let mut sub = active_at(at(2023, 12, 2));
        assert_eq!(sub.period_end, at(2024, 1, 1));

        sub.apply_renewal(Some("def456".to_string()), split("10"), &policy(), at(2024, 6, 1))
            .unwrap();

        assert_eq!(sub.period_start, at(2024, 1, 1));
        assert_eq!(sub.period_end, at(2024, 1, 31));
        assert_eq!(sub.renews_at, at(2024, 1, 28));
        assert_eq!(sub.renewal_count, 1);
        assert_eq!(sub.ledger_tx_hash.as_deref(), Some("def456"));
    }

    #[test]
    fn failures_accumulate_and_trigger_suspension() {
        let mut sub = active_at(at(2024, 1, 1));

        assert_eq!(sub.record_payment_failure("short", at(2024, 1, 28)), 1);
        assert_eq!(sub.record_payment_failure("short", at(2024, 1, 29)), 2);
        assert!(!sub.should_suspend(&policy()));
        assert_eq!(sub.record_payment_failure("short", at(2024, 1, 30)), 3);

        assert!(sub.should_suspend(&policy()));
        assert_eq!(sub.payment_status, PaymentStatus::Failed);
    }

    #[test]
    fn successful_renewal_after_suspension_resets_failures() {
        let mut sub = active_at(at(2024, 1, 1));
        for _ in 0..3 {
            sub.record_payment_failure("short", at(2024, 1, 29));
        }
        sub.suspend("payment failed 3 times", at(2024, 1, 29)).unwrap();

        sub.apply_renewal(Some("good".to_string()), split("10"), &policy(), at(2024, 1, 30))
            .unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.payment_failure_count, 0);
        assert_eq!(sub.last_failure_reason, None);
        assert_eq!(sub.payment_status, PaymentStatus::Completed);
    }

    #[test]
    fn renewal_requires_auto_renew() {
        let mut sub = active_at(at(2024, 1, 1));
        sub.cancel(None, false, at(2024, 1, 2)).unwrap();

        assert!(sub.ensure_renewable().is_err());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Suspension and expiry
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn restore_only_from_suspended() {
        let mut sub = active_at(at(2024, 1, 1));
        assert!(sub.restore(at(2024, 1, 2)).is_err());

        sub.suspend("manual", at(2024, 1, 2)).unwrap();
        sub.restore(at(2024, 1, 3)).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn suspended_subscription_is_expiry_candidate_after_period_end() {
        let mut sub = active_at(at(2024, 1, 1));
        sub.suspend("payment failed", at(2024, 1, 20)).unwrap();

        assert!(!sub.is_expiry_candidate(at(2024, 1, 30)));
        assert!(sub.is_expiry_candidate(at(2024, 1, 31)));

        sub.expire(at(2024, 1, 31)).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Expired);
        assert!(!sub.auto_renew);
    }

    #[test]
    fn subscription_is_owned_by_subscriber() {
        let sub = active_at(at(2024, 1, 1));
        assert!(sub.check_ownership(&UserId::new("subscriber-1").unwrap()).is_ok());
        assert!(sub.check_ownership(&UserId::new("provider-1").unwrap()).is_err());
    }
}
