//! RenewalScheduler - Time-driven sweeps over the subscription ledger.
//!
//! Every sweep takes `now` explicitly so it can be driven by a timer in
//! production and by fixed instants in tests. Per-item failures are logged
//! and counted; one bad row never stops a sweep.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::subscription::{SubscriptionError, SubscriptionStatus, UserSubscription};
use crate::ports::{RenewalNotifier, SubscriptionReader, SubscriptionRepository};

/// Outcome counters of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub applied: usize,
    /// Rows another writer had already finished.
    pub skipped: usize,
    pub failed: usize,
}

pub struct RenewalScheduler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    reader: Arc<dyn SubscriptionReader>,
    notifier: Arc<dyn RenewalNotifier>,
}

impl RenewalScheduler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        reader: Arc<dyn SubscriptionReader>,
        notifier: Arc<dyn RenewalNotifier>,
    ) -> Self {
        Self {
            subscriptions,
            reader,
            notifier,
        }
    }

    /// Expires every ACTIVE or SUSPENDED subscription whose period has ended.
    pub async fn expire_sweep(&self, now: Timestamp) -> Result<SweepReport, SubscriptionError> {
        let candidates = self.reader.find_expired_candidates(now).await?;
        let mut report = SweepReport {
            examined: candidates.len(),
            ..SweepReport::default()
        };

        for subscription in &candidates {
            self.expire_one(subscription, now, &mut report).await;
        }

        tracing::info!(
            examined = report.examined,
            expired = report.applied,
            skipped = report.skipped,
            failed = report.failed,
            "Expiry sweep finished"
        );
        Ok(report)
    }

    /// Reminds subscribers whose renewal notice falls on the UTC day of `now`.
    pub async fn reminder_sweep(&self, now: Timestamp) -> Result<SweepReport, SubscriptionError> {
        let due = self
            .reader
            .find_renewing_between(now.start_of_day(), now.start_of_next_day())
            .await?;
        let mut report = SweepReport {
            examined: due.len(),
            ..SweepReport::default()
        };

        for subscription in &due {
            match self.notifier.renewal_reminder(subscription).await {
                Ok(()) => report.applied += 1,
                Err(e) => record_failure(&mut report, subscription, "renewal reminder", &e),
            }
        }

        tracing::info!(
            examined = report.examined,
            notified = report.applied,
            failed = report.failed,
            "Reminder sweep finished"
        );
        Ok(report)
    }

    /// Expires lapsed SUSPENDED subscriptions and prompts the rest to retry.
    pub async fn suspended_sweep(&self, now: Timestamp) -> Result<SweepReport, SubscriptionError> {
        let suspended = self
            .reader
            .find_by_status(SubscriptionStatus::Suspended)
            .await?;
        let mut report = SweepReport {
            examined: suspended.len(),
            ..SweepReport::default()
        };

        for subscription in &suspended {
            if subscription.period_end <= now {
                self.expire_one(subscription, now, &mut report).await;
                continue;
            }
            match self.notifier.payment_retry_prompt(subscription).await {
                Ok(()) => report.applied += 1,
                Err(e) => record_failure(&mut report, subscription, "retry prompt", &e),
            }
        }

        tracing::info!(
            examined = report.examined,
            applied = report.applied,
            skipped = report.skipped,
            failed = report.failed,
            "Suspended sweep finished"
        );
        Ok(report)
    }

    /// Subscriptions inside their renewal notice window.
    ///
    /// Informational only: renewal always needs a payment proof from the
    /// subscriber, so nothing is charged here.
    pub async fn due_for_renewal(
        &self,
        now: Timestamp,
    ) -> Result<Vec<UserSubscription>, SubscriptionError> {
        Ok(self.reader.find_due_for_renewal(now).await?)
    }

    async fn expire_one(
        &self,
        subscription: &UserSubscription,
        now: Timestamp,
        report: &mut SweepReport,
    ) {
        match self.subscriptions.expire(&subscription.id, now).await {
            Ok(true) => {
                tracing::debug!(subscription_id = %subscription.id, "Subscription expired");
                report.applied += 1;
            }
            Ok(false) => report.skipped += 1,
            Err(e) => record_failure(report, subscription, "expiry", &e),
        }
    }
}

fn record_failure(
    report: &mut SweepReport,
    subscription: &UserSubscription,
    step: &str,
    error: &DomainError,
) {
    tracing::error!(
        subscription_id = %subscription.id,
        step,
        error = %error,
        "Sweep item failed"
    );
    report.failed += 1;
}
