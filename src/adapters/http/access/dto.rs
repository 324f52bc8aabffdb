//! HTTP DTOs for access checks.

use serde::{Deserialize, Serialize};

use crate::application::handlers::AccessDecision;
use crate::domain::subscription::TierLevel;

/// Query string for signal visibility checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignalAccessParams {
    /// Level the content is tagged with. Untagged content is public.
    #[serde(default)]
    pub tier_level: Option<TierLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessResponse {
    pub has_access: bool,
    pub subscription_id: Option<String>,
    pub tier_id: Option<String>,
    pub tier_level: Option<TierLevel>,
    /// `null` means unlimited.
    pub signal_limit: Option<u32>,
    pub expires_at: Option<String>,
}

impl From<AccessDecision> for AccessResponse {
    fn from(decision: AccessDecision) -> Self {
        let subscription = decision.subscription.as_ref();
        Self {
            has_access: decision.has_access,
            subscription_id: subscription.map(|s| s.id.to_string()),
            tier_id: subscription.map(|s| s.tier_id.to_string()),
            tier_level: decision.tier_level,
            signal_limit: decision.signal_limit,
            expires_at: subscription.map(|s| s.period_end.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalAccessResponse {
    pub can_view: bool,
}
