//! Tier registry handlers.
//!
//! ## Commands
//! - Creating tiers (one active FREE tier per provider)
//! - Updating tiers (price frozen once subscribed)
//! - Cancelling tiers with their active subscriptions
//!
//! ## Queries
//! - Get a tier
//! - List a provider's tiers

mod cancel_tier;
mod create_tier;
mod get_tiers;
mod update_tier;

// Commands
pub use cancel_tier::{CancelTierCommand, CancelTierHandler, CancelTierResult, TIER_CANCELLED_REASON};
pub use create_tier::{CreateTierCommand, CreateTierHandler, CreateTierResult};
pub use update_tier::{UpdateTierCommand, UpdateTierHandler, UpdateTierResult};

// Queries
pub use get_tiers::{GetTierHandler, GetTierQuery, ListProviderTiersHandler, ListProviderTiersQuery};
