//! RenewalSchedulerDriver - Background service running the renewal sweeps.
//!
//! ## Configuration
//!
//! | Setting | Default | Sweep |
//! |---------|---------|-------|
//! | `expiry_interval` | 24h | expire lapsed subscriptions |
//! | `reminder_interval` | 24h | renewal reminders for today |
//! | `suspended_interval` | 6h | expire or prompt suspended subscriptions |
//!
//! ## Graceful Shutdown
//!
//! The loop stops when the shutdown channel flips to `true`. A sweep already
//! in progress finishes first.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::application::handlers::{RenewalScheduler, SweepReport};
use crate::domain::foundation::Timestamp;
use crate::domain::subscription::SubscriptionError;

#[derive(Debug, Clone)]
pub struct RenewalSchedulerConfig {
    pub expiry_interval: Duration,
    pub reminder_interval: Duration,
    pub suspended_interval: Duration,
}

impl Default for RenewalSchedulerConfig {
    fn default() -> Self {
        Self {
            expiry_interval: Duration::from_secs(24 * 60 * 60),
            reminder_interval: Duration::from_secs(24 * 60 * 60),
            suspended_interval: Duration::from_secs(6 * 60 * 60),
        }
    }
}

impl RenewalSchedulerConfig {
    pub fn with_expiry_interval(mut self, interval: Duration) -> Self {
        self.expiry_interval = interval;
        self
    }

    pub fn with_reminder_interval(mut self, interval: Duration) -> Self {
        self.reminder_interval = interval;
        self
    }

    pub fn with_suspended_interval(mut self, interval: Duration) -> Self {
        self.suspended_interval = interval;
        self
    }
}

pub struct RenewalSchedulerDriver {
    scheduler: Arc<RenewalScheduler>,
    config: RenewalSchedulerConfig,
}

impl RenewalSchedulerDriver {
    pub fn new(scheduler: Arc<RenewalScheduler>, config: RenewalSchedulerConfig) -> Self {
        Self { scheduler, config }
    }

    /// Runs the sweeps until shutdown is signalled.
    ///
    /// Each interval fires once immediately, so a restarted process catches up
    /// without waiting a full day.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut expiry = ticker(self.config.expiry_interval);
        let mut reminder = ticker(self.config.reminder_interval);
        let mut suspended = ticker(self.config.suspended_interval);

        tracing::info!(
            expiry_secs = self.config.expiry_interval.as_secs(),
            reminder_secs = self.config.reminder_interval.as_secs(),
            suspended_secs = self.config.suspended_interval.as_secs(),
            "Renewal scheduler started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Renewal scheduler stopping");
                        return;
                    }
                }
                _ = expiry.tick() => {
                    log_outcome("expiry", self.scheduler.expire_sweep(Timestamp::now()).await);
                }
                _ = reminder.tick() => {
                    log_outcome("reminder", self.scheduler.reminder_sweep(Timestamp::now()).await);
                }
                _ = suspended.tick() => {
                    log_outcome("suspended", self.scheduler.suspended_sweep(Timestamp::now()).await);
                }
            }
        }
    }
}

fn ticker(period: Duration) -> time::Interval {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

fn log_outcome(sweep: &str, outcome: Result<SweepReport, SubscriptionError>) {
    match outcome {
        Ok(report) if report.failed > 0 => {
            tracing::warn!(sweep, failed = report.failed, "Sweep finished with failures");
        }
        Ok(_) => {}
        Err(e) => tracing::error!(sweep, error = %e, "Sweep could not run"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedgerStore;
    use crate::adapters::notify::TracingRenewalNotifier;
    use crate::domain::foundation::{Money, UserId};
    use crate::domain::subscription::{
        BillingPolicy, NewSubscription, RevenueSplit, SubscriptionStatus, SubscriptionTier,
        TierLevel, TierSpec, UserSubscription,
    };
    use crate::ports::{SubscriptionRepository, TierRepository};

    #[test]
    fn default_intervals_match_daily_and_six_hourly_sweeps() {
        let config = RenewalSchedulerConfig::default();

        assert_eq!(config.expiry_interval, Duration::from_secs(86_400));
        assert_eq!(config.reminder_interval, Duration::from_secs(86_400));
        assert_eq!(config.suspended_interval, Duration::from_secs(21_600));
    }

    #[tokio::test]
    async fn runs_sweeps_until_shutdown() {
        let store = InMemoryLedgerStore::new();
        let tier = SubscriptionTier::create(
            UserId::new("provider-1").unwrap(),
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
        let lapsed = UserSubscription::open(
            NewSubscription {
                user_id: UserId::new("user-1").unwrap(),
                tier_id: tier.id,
                provider_id: tier.provider_id.clone(),
                ledger_tx_hash: None,
                subscriber_wallet: None,
                provider_wallet: None,
                auto_renew: true,
            },
            RevenueSplit::zero(),
            &BillingPolicy::default(),
            Timestamp::now().minus_days(40),
        );
        store.insert_active(&lapsed, None).await.unwrap();

        let scheduler = Arc::new(RenewalScheduler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(TracingRenewalNotifier::new()),
        ));
        let driver = RenewalSchedulerDriver::new(
            scheduler,
            RenewalSchedulerConfig::default().with_expiry_interval(Duration::from_millis(10)),
        );
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { driver.run(rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        let stored = SubscriptionRepository::find_by_id(&store, &lapsed.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Expired);
    }
}
