//! HTTP DTOs for subscription endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::subscription::{
    PaymentStatus, SubscriptionStatus, UserSubscription, VerificationResult,
};

fn default_auto_renew() -> bool {
    true
}

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to subscribe the caller to a tier.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub tier_id: String,
    /// Hash of the ledger payment. Required for paid tiers.
    #[serde(default)]
    pub ledger_tx_hash: Option<String>,
    /// Wallet that sent the payment. Required for paid tiers.
    #[serde(default)]
    pub subscriber_wallet: Option<String>,
    #[serde(default = "default_auto_renew")]
    pub auto_renew: bool,
}

/// Request to cancel a subscription. The body is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelSubscriptionRequest {
    #[serde(default)]
    pub reason: Option<String>,
    /// Whether to end access now or at period end.
    #[serde(default)]
    pub immediate: bool,
}

/// Request to pay for the next period.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenewSubscriptionRequest {
    #[serde(default)]
    pub ledger_tx_hash: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub user_id: String,
    pub tier_id: String,
    pub provider_id: String,
    pub status: SubscriptionStatus,
    pub payment_status: PaymentStatus,
    pub amount_paid: String,
    pub platform_commission: String,
    pub provider_earnings: String,
    pub ledger_tx_hash: Option<String>,
    pub period_start: String,
    pub period_end: String,
    pub renews_at: String,
    pub auto_renew: bool,
    pub renewal_count: u32,
    pub payment_failure_count: u32,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<String>,
    pub created_at: String,
}

impl From<UserSubscription> for SubscriptionResponse {
    fn from(sub: UserSubscription) -> Self {
        Self {
            id: sub.id.to_string(),
            user_id: sub.user_id.to_string(),
            tier_id: sub.tier_id.to_string(),
            provider_id: sub.provider_id.to_string(),
            status: sub.status,
            payment_status: sub.payment_status,
            amount_paid: sub.amount_paid.to_string(),
            platform_commission: sub.platform_commission.to_string(),
            provider_earnings: sub.provider_earnings.to_string(),
            ledger_tx_hash: sub.ledger_tx_hash,
            period_start: sub.period_start.to_string(),
            period_end: sub.period_end.to_string(),
            renews_at: sub.renews_at.to_string(),
            auto_renew: sub.auto_renew,
            renewal_count: sub.renewal_count,
            payment_failure_count: sub.payment_failure_count,
            cancellation_reason: sub.cancellation_reason,
            cancelled_at: sub.cancelled_at.map(|t| t.to_string()),
            created_at: sub.created_at.to_string(),
        }
    }
}

/// Subscription plus the ledger verification that paid for it.
#[derive(Debug, Clone, Serialize)]
pub struct PaidSubscriptionResponse {
    pub subscription: SubscriptionResponse,
    /// Absent for FREE tiers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelSubscriptionResponse {
    pub subscription: SubscriptionResponse,
    /// When access actually ends.
    pub effective_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionListResponse {
    pub subscriptions: Vec<SubscriptionResponse>,
}

impl From<Vec<UserSubscription>> for SubscriptionListResponse {
    fn from(subscriptions: Vec<UserSubscription>) -> Self {
        Self {
            subscriptions: subscriptions.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_request_defaults_to_auto_renew() {
        let request: SubscribeRequest =
            serde_json::from_str(r#"{"tier_id": "3f0c6a8e-0000-4000-8000-000000000000"}"#).unwrap();

        assert!(request.auto_renew);
        assert!(request.ledger_tx_hash.is_none());
    }

    #[test]
    fn cancel_request_defaults_to_deferred() {
        let request: CancelSubscriptionRequest = serde_json::from_str("{}").unwrap();

        assert!(!request.immediate);
        assert!(request.reason.is_none());
    }
}
