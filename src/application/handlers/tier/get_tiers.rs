//! Tier query handlers.

use std::sync::Arc;

use crate::domain::foundation::{TierId, UserId};
use crate::domain::subscription::{SubscriptionError, SubscriptionTier};
use crate::ports::TierRepository;

/// Query for a single tier.
#[derive(Debug, Clone)]
pub struct GetTierQuery {
    pub tier_id: TierId,
}

pub struct GetTierHandler {
    tiers: Arc<dyn TierRepository>,
}

impl GetTierHandler {
    pub fn new(tiers: Arc<dyn TierRepository>) -> Self {
        Self { tiers }
    }

    pub async fn handle(&self, query: GetTierQuery) -> Result<SubscriptionTier, SubscriptionError> {
        self.tiers
            .find_by_id(&query.tier_id)
            .await?
            .ok_or(SubscriptionError::tier_not_found(query.tier_id))
    }
}

/// Query for a provider's tiers, cheapest first.
#[derive(Debug, Clone)]
pub struct ListProviderTiersQuery {
    pub provider_id: UserId,
    pub include_inactive: bool,
}

pub struct ListProviderTiersHandler {
    tiers: Arc<dyn TierRepository>,
}

impl ListProviderTiersHandler {
    pub fn new(tiers: Arc<dyn TierRepository>) -> Self {
        Self { tiers }
    }

    pub async fn handle(
        &self,
        query: ListProviderTiersQuery,
    ) -> Result<Vec<SubscriptionTier>, SubscriptionError> {
        Ok(self
            .tiers
            .list_by_provider(&query.provider_id, query.include_inactive)
            .await?)
    }
}
