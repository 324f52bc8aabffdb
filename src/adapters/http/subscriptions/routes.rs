//! Axum routes for subscription ledger endpoints.

use axum::{
    routing::{get, patch},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{
    cancel_subscription, get_subscription, list_my_subscriptions, renew_subscription, subscribe,
};

/// Subscription routes, mounted at `/api/subscriptions`. All require auth.
///
/// - `POST /` - Subscribe to a tier
/// - `GET /` - The caller's subscriptions
/// - `GET /:subscription_id` - One of the caller's subscriptions
/// - `PATCH /:subscription_id/cancel` - Cancel now or at period end
/// - `PATCH /:subscription_id/renew` - Pay for the next period
pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_subscriptions).post(subscribe))
        .route("/:subscription_id", get(get_subscription))
        .route("/:subscription_id/cancel", patch(cancel_subscription))
        .route("/:subscription_id/renew", patch(renew_subscription))
}
