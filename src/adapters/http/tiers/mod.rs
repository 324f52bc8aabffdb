//! HTTP adapter for the tier registry.
//!
//! - `POST /api/tiers` - Publish a tier
//! - `GET /api/tiers/:tier_id` - Tier details
//! - `PATCH /api/tiers/:tier_id` - Update a tier
//! - `DELETE /api/tiers/:tier_id` - Cancel a tier
//!
//! Provider listings live under `/api/providers`.

pub mod dto;
mod handlers;
mod routes;

pub use dto::{
    CreateTierRequest, ListTiersParams, TierListResponse, TierResponse, UpdateTierRequest,
};
pub use routes::tier_routes;
