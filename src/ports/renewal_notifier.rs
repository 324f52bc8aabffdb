//! Renewal notifier port.
//!
//! The scheduler decides WHEN a subscriber should hear about a renewal; the
//! adapter behind this port decides how the message is delivered.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::subscription::UserSubscription;

#[async_trait]
pub trait RenewalNotifier: Send + Sync {
    /// The subscription's period ends within the notice window.
    async fn renewal_reminder(&self, subscription: &UserSubscription) -> Result<(), DomainError>;

    /// The subscription is suspended and a successful renewal would restore it.
    async fn payment_retry_prompt(&self, subscription: &UserSubscription) -> Result<(), DomainError>;
}
