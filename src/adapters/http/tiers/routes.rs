//! Axum routes for tier registry endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{cancel_tier, create_tier, get_tier, update_tier};

/// Tier routes, mounted at `/api/tiers`.
///
/// - `POST /` - Publish a tier (caller is the provider)
/// - `GET /:tier_id` - Tier details
/// - `PATCH /:tier_id` - Update registry fields (provider only)
/// - `DELETE /:tier_id` - Cancel the tier and its subscriptions (provider only)
pub fn tier_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tier))
        .route(
            "/:tier_id",
            get(get_tier).patch(update_tier).delete(cancel_tier),
        )
}
