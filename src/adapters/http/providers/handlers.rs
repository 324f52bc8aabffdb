//! HTTP handlers for provider-facing listings and reports.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::{parse_user_id, AppState};
use crate::adapters::http::subscriptions::SubscriptionListResponse;
use crate::adapters::http::tiers::{ListTiersParams, TierListResponse, TierResponse};
use crate::application::handlers::{
    ListActiveSubscribersQuery, ListProviderTiersQuery, RevenueSummaryQuery,
};

/// GET /api/providers/:provider_id/tiers
///
/// `include_inactive` only takes effect for the provider itself.
pub async fn list_provider_tiers(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(provider_id): Path<String>,
    Query(params): Query<ListTiersParams>,
) -> Result<impl IntoResponse, ApiError> {
    let provider_id = parse_user_id("provider_id", &provider_id)?;
    let is_provider = user.id == provider_id;

    let tiers = state
        .list_provider_tiers_handler()
        .handle(ListProviderTiersQuery {
            provider_id,
            include_inactive: params.include_inactive && is_provider,
        })
        .await?;

    Ok(Json(TierListResponse {
        tiers: tiers.into_iter().map(TierResponse::from).collect(),
    }))
}

/// GET /api/providers/:provider_id/subscribers
pub async fn list_active_subscribers(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let query = ListActiveSubscribersQuery {
        provider_id: parse_user_id("provider_id", &provider_id)?,
        requested_by: user.id,
    };

    let subscribers = state.list_active_subscribers_handler().handle(query).await?;

    Ok(Json(SubscriptionListResponse::from(subscribers)))
}

/// GET /api/providers/:provider_id/revenue
pub async fn revenue_summary(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let query = RevenueSummaryQuery {
        provider_id: parse_user_id("provider_id", &provider_id)?,
        requested_by: user.id,
    };

    let summary = state.revenue_summary_handler().handle(query).await?;

    Ok(Json(summary))
}
