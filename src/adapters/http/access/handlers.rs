//! HTTP handlers for access checks.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::{parse_user_id, AppState};

use super::dto::{AccessResponse, SignalAccessParams, SignalAccessResponse};

/// GET /api/access/:provider_id
///
/// The caller's best live access to a provider.
pub async fn check_access(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let provider_id = parse_user_id("provider_id", &provider_id)?;

    let decision = state.access_gate.check_access(&user.id, &provider_id).await?;

    Ok(Json(AccessResponse::from(decision)))
}

/// GET /api/access/:provider_id/signal?tier_level=PREMIUM
pub async fn can_view_signal(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(provider_id): Path<String>,
    Query(params): Query<SignalAccessParams>,
) -> Result<impl IntoResponse, ApiError> {
    let provider_id = parse_user_id("provider_id", &provider_id)?;

    let can_view = state
        .access_gate
        .can_user_view_signal(&user.id, &provider_id, params.tier_level)
        .await?;

    Ok(Json(SignalAccessResponse { can_view }))
}
