//! Tier repository port.
//!
//! Persists `SubscriptionTier` aggregates. Registry-owned fields are written
//! through `save`/`update`; subscriber counters are never written here except
//! by the cancellation cascade, which zeroes them together with the
//! subscriptions it ends.
//!
//! # Example
//!
//! ```ignore
//! if repo.find_active_free_tier(&provider_id).await?.is_some() {
//!     return Err(DomainError::new(ErrorCode::FreeTierExists, "Provider already has a free tier"));
//! }
//! repo.save(&tier).await?;
//! ```

use crate::domain::foundation::{DomainError, TierId, Timestamp, UserId};
use crate::domain::subscription::SubscriptionTier;
use async_trait::async_trait;

/// Repository port for tier persistence.
///
/// Implementations must ensure:
/// - at most one active FREE tier per provider, also under concurrent creates
/// - `update` never overwrites `subscriber_count` or `total_revenue`
/// - `update` re-checks the price lock and the active flag against the stored row
#[async_trait]
pub trait TierRepository: Send + Sync {
    /// Save a new tier.
    ///
    /// # Errors
    ///
    /// - `FreeTierExists` if the provider already has an active FREE tier
    /// - `DatabaseError` on persistence failure
    async fn save(&self, tier: &SubscriptionTier) -> Result<(), DomainError>;

    /// Update the registry-owned fields of an existing tier.
    ///
    /// # Errors
    ///
    /// - `TierNotFound` if the tier doesn't exist
    /// - `TierInactive` if the stored tier was cancelled in the meantime
    /// - `PriceLocked` if the price changed while the stored count is positive
    /// - `DatabaseError` on persistence failure
    async fn update(&self, tier: &SubscriptionTier) -> Result<(), DomainError>;

    /// Find a tier by ID.
    async fn find_by_id(&self, id: &TierId) -> Result<Option<SubscriptionTier>, DomainError>;

    /// List a provider's tiers ordered by price, optionally including cancelled ones.
    async fn list_by_provider(
        &self,
        provider_id: &UserId,
        include_inactive: bool,
    ) -> Result<Vec<SubscriptionTier>, DomainError>;

    /// The provider's active FREE tier, if any.
    async fn find_active_free_tier(
        &self,
        provider_id: &UserId,
    ) -> Result<Option<SubscriptionTier>, DomainError>;

    /// Cancels every ACTIVE subscription of the tier and deactivates it, in
    /// one atomic unit. Returns the number of subscriptions cancelled.
    ///
    /// # Errors
    ///
    /// - `TierNotFound` if the tier doesn't exist
    /// - `TierInactive` if the tier is already cancelled
    async fn deactivate_with_cascade(
        &self,
        id: &TierId,
        reason: &str,
        at: Timestamp,
    ) -> Result<u64, DomainError>;
}
