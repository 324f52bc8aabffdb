//! Notifier that only records notifications in the log.
//!
//! Used until a delivery channel (email, push) is wired in; the structured
//! log lines carry everything a downstream consumer needs.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::subscription::UserSubscription;
use crate::ports::RenewalNotifier;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRenewalNotifier;

impl TracingRenewalNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RenewalNotifier for TracingRenewalNotifier {
    async fn renewal_reminder(&self, subscription: &UserSubscription) -> Result<(), DomainError> {
        tracing::info!(
            subscription_id = %subscription.id,
            user_id = %subscription.user_id,
            tier_id = %subscription.tier_id,
            period_end = %subscription.period_end,
            "Renewal reminder due"
        );
        Ok(())
    }

    async fn payment_retry_prompt(&self, subscription: &UserSubscription) -> Result<(), DomainError> {
        tracing::info!(
            subscription_id = %subscription.id,
            user_id = %subscription.user_id,
            failures = subscription.payment_failure_count,
            reason = subscription.last_failure_reason.as_deref().unwrap_or(""),
            "Payment retry prompt due"
        );
        Ok(())
    }
}
