//! CancelSubscriptionHandler - Command handler for cancelling a subscription.

use std::sync::Arc;

use crate::domain::foundation::{OwnedByUser, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{SubscriptionError, UserSubscription};
use crate::ports::SubscriptionRepository;

/// Command to cancel a subscription.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    pub user_id: UserId,
    pub reason: Option<String>,
    /// End access now instead of at the end of the paid period.
    pub immediate: bool,
}

#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    pub subscription: UserSubscription,
    /// When access actually ends.
    pub effective_at: Timestamp,
}

/// Handler for cancelling subscriptions.
///
/// Auto-renew is always switched off. A deferred cancellation keeps the
/// subscription ACTIVE until the expiry sweep ends it at `period_end`.
pub struct CancelSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl CancelSubscriptionHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, SubscriptionError> {
        // 1. Load and authorize
        let mut subscription = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or(SubscriptionError::subscription_not_found(cmd.subscription_id))?;
        subscription.check_ownership(&cmd.user_id)?;
        let loaded_status = subscription.status;

        // 2. Apply the cancellation
        let now = Timestamp::now();
        let reason = cmd.reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        subscription.cancel(reason, cmd.immediate, now)?;

        // 3. Persist (immediate cancels release the seat atomically)
        let effective_at = if cmd.immediate {
            self.subscriptions.cancel_immediately(&subscription).await?;
            now
        } else {
            self.subscriptions.update(&subscription, loaded_status).await?;
            subscription.period_end
        };

        tracing::info!(
            subscription_id = %subscription.id,
            immediate = cmd.immediate,
            effective_at = %effective_at,
            "Subscription cancelled"
        );

        Ok(CancelSubscriptionResult {
            subscription,
            effective_at,
        })
    }
}
