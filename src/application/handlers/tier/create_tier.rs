//! CreateTierHandler - Command handler for publishing a new subscription tier.

use std::sync::Arc;

use crate::domain::foundation::{ErrorCode, Timestamp, UserId};
use crate::domain::subscription::{SubscriptionError, SubscriptionTier, TierSpec};
use crate::ports::TierRepository;

/// Command to create a tier for a provider.
#[derive(Debug, Clone)]
pub struct CreateTierCommand {
    pub provider_id: UserId,
    pub spec: TierSpec,
}

/// Result of successful tier creation.
#[derive(Debug, Clone)]
pub struct CreateTierResult {
    pub tier: SubscriptionTier,
}

/// Handler for creating tiers.
///
/// A provider may hold at most one active FREE tier. The pre-check gives a
/// clean error; the repository enforces the rule again at write time.
pub struct CreateTierHandler {
    tiers: Arc<dyn TierRepository>,
}

impl CreateTierHandler {
    pub fn new(tiers: Arc<dyn TierRepository>) -> Self {
        Self { tiers }
    }

    pub async fn handle(&self, cmd: CreateTierCommand) -> Result<CreateTierResult, SubscriptionError> {
        // 1. Validate and build the aggregate
        let tier = SubscriptionTier::create(cmd.provider_id, cmd.spec, Timestamp::now())
            .map_err(|e| SubscriptionError::validation(e.field(), e.to_string()))?;

        // 2. Enforce a single active FREE tier per provider
        if tier.is_free()
            && self
                .tiers
                .find_active_free_tier(&tier.provider_id)
                .await?
                .is_some()
        {
            return Err(SubscriptionError::conflict(
                ErrorCode::FreeTierExists,
                "Provider already has an active free tier",
            ));
        }

        // 3. Persist
        self.tiers.save(&tier).await?;

        tracing::info!(
            tier_id = %tier.id,
            provider_id = %tier.provider_id,
            level = tier.level.as_str(),
            price = %tier.price,
            "Subscription tier created"
        );

        Ok(CreateTierResult { tier })
    }
}
