//! Axum routes for provider endpoints.

use axum::{routing::get, Router};

use crate::adapters::http::state::AppState;

use super::handlers::{list_active_subscribers, list_provider_tiers, revenue_summary};

/// Provider routes, mounted at `/api/providers`. All require auth.
///
/// - `GET /:provider_id/tiers` - Published tiers, cheapest first
/// - `GET /:provider_id/subscribers` - Active subscribers (provider only)
/// - `GET /:provider_id/revenue` - Revenue by tier (provider only)
pub fn provider_routes() -> Router<AppState> {
    Router::new()
        .route("/:provider_id/tiers", get(list_provider_tiers))
        .route("/:provider_id/subscribers", get(list_active_subscribers))
        .route("/:provider_id/revenue", get(revenue_summary))
}
