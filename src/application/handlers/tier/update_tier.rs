//! UpdateTierHandler - Command handler for editing a tier.

use std::sync::Arc;

use crate::domain::foundation::{OwnedByUser, TierId, Timestamp, UserId};
use crate::domain::subscription::{SubscriptionError, SubscriptionTier, TierPatch};
use crate::ports::TierRepository;

/// Command to patch a tier. Only the owning provider may update it.
#[derive(Debug, Clone)]
pub struct UpdateTierCommand {
    pub tier_id: TierId,
    pub provider_id: UserId,
    pub patch: TierPatch,
}

#[derive(Debug, Clone)]
pub struct UpdateTierResult {
    pub tier: SubscriptionTier,
}

/// Handler for tier updates.
///
/// The price is frozen once the tier has subscribers. The repository re-checks
/// this against the stored counter, so a subscribe racing the update cannot
/// slip a price change through.
pub struct UpdateTierHandler {
    tiers: Arc<dyn TierRepository>,
}

impl UpdateTierHandler {
    pub fn new(tiers: Arc<dyn TierRepository>) -> Self {
        Self { tiers }
    }

    pub async fn handle(&self, cmd: UpdateTierCommand) -> Result<UpdateTierResult, SubscriptionError> {
        if cmd.patch.is_empty() {
            return Err(SubscriptionError::validation("request", "No fields to update"));
        }

        // 1. Load and authorize
        let mut tier = self
            .tiers
            .find_by_id(&cmd.tier_id)
            .await?
            .ok_or(SubscriptionError::tier_not_found(cmd.tier_id))?;
        tier.check_ownership(&cmd.provider_id)?;

        // 2. Apply the patch (price lock, inactive and field validation)
        tier.apply_patch(cmd.patch, Timestamp::now())?;

        // 3. Persist
        self.tiers.update(&tier).await?;

        tracing::info!(tier_id = %tier.id, "Subscription tier updated");

        Ok(UpdateTierResult { tier })
    }
}
