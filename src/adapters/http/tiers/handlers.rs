//! HTTP handlers for tier registry endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::{parse_id, AppState};
use crate::application::handlers::{
    CancelTierCommand, CreateTierCommand, GetTierQuery, UpdateTierCommand,
};

use super::dto::{CreateTierRequest, TierResponse, UpdateTierRequest};

/// POST /api/tiers
///
/// The caller becomes the tier's provider.
pub async fn create_tier(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreateTierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreateTierCommand {
        provider_id: user.id,
        spec: request.into_spec()?,
    };

    let result = state.create_tier_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(TierResponse::from(result.tier))))
}

/// GET /api/tiers/:tier_id
pub async fn get_tier(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(tier_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let query = GetTierQuery {
        tier_id: parse_id("tier_id", &tier_id)?,
    };

    let tier = state.get_tier_handler().handle(query).await?;

    Ok(Json(TierResponse::from(tier)))
}

/// PATCH /api/tiers/:tier_id
pub async fn update_tier(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(tier_id): Path<String>,
    Json(request): Json<UpdateTierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = UpdateTierCommand {
        tier_id: parse_id("tier_id", &tier_id)?,
        provider_id: user.id,
        patch: request.into_patch()?,
    };

    let result = state.update_tier_handler().handle(cmd).await?;

    Ok(Json(TierResponse::from(result.tier)))
}

/// DELETE /api/tiers/:tier_id
///
/// Cancels the tier together with its active subscriptions.
pub async fn cancel_tier(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(tier_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CancelTierCommand {
        tier_id: parse_id("tier_id", &tier_id)?,
        provider_id: user.id,
    };

    state.cancel_tier_handler().handle(cmd).await?;

    Ok(StatusCode::NO_CONTENT)
}
