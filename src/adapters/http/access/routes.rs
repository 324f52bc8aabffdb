//! Axum routes for access checks.

use axum::{routing::get, Router};

use crate::adapters::http::state::AppState;

use super::handlers::{can_view_signal, check_access};

/// Access routes, mounted at `/api/access`. All require auth.
///
/// - `GET /:provider_id` - Access decision for the caller
/// - `GET /:provider_id/signal` - Whether the caller may view tagged content
pub fn access_routes() -> Router<AppState> {
    Router::new()
        .route("/:provider_id", get(check_access))
        .route("/:provider_id/signal", get(can_view_signal))
}
