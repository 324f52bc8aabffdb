//! HTTP handlers for subscription ledger endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::{parse_id, AppState};
use crate::application::handlers::{
    CancelSubscriptionCommand, GetSubscriptionQuery, ListUserSubscriptionsQuery,
    RenewSubscriptionCommand, SubscribeCommand,
};

use super::dto::{
    CancelSubscriptionRequest, CancelSubscriptionResponse, PaidSubscriptionResponse,
    RenewSubscriptionRequest, SubscribeRequest, SubscriptionListResponse, SubscriptionResponse,
};

/// POST /api/subscriptions
pub async fn subscribe(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = SubscribeCommand {
        user_id: user.id,
        tier_id: parse_id("tier_id", &request.tier_id)?,
        ledger_tx_hash: request.ledger_tx_hash,
        subscriber_wallet: request.subscriber_wallet,
        auto_renew: request.auto_renew,
    };

    let result = state.subscribe_handler().handle(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(PaidSubscriptionResponse {
            subscription: result.subscription.into(),
            verification: result.verification,
        }),
    ))
}

/// GET /api/subscriptions
///
/// The caller's subscriptions, newest first.
pub async fn list_my_subscriptions(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let subscriptions = state
        .list_user_subscriptions_handler()
        .handle(ListUserSubscriptionsQuery { user_id: user.id })
        .await?;

    Ok(Json(SubscriptionListResponse::from(subscriptions)))
}

/// GET /api/subscriptions/:subscription_id
pub async fn get_subscription(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(subscription_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let query = GetSubscriptionQuery {
        subscription_id: parse_id("subscription_id", &subscription_id)?,
        requested_by: Some(user.id),
    };

    let subscription = state.get_subscription_handler().handle(query).await?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// PATCH /api/subscriptions/:subscription_id/cancel
pub async fn cancel_subscription(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(subscription_id): Path<String>,
    body: Option<Json<CancelSubscriptionRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let cmd = CancelSubscriptionCommand {
        subscription_id: parse_id("subscription_id", &subscription_id)?,
        user_id: user.id,
        reason: request.reason,
        immediate: request.immediate,
    };

    let result = state.cancel_subscription_handler().handle(cmd).await?;

    Ok(Json(CancelSubscriptionResponse {
        subscription: result.subscription.into(),
        effective_at: result.effective_at.to_string(),
    }))
}

/// PATCH /api/subscriptions/:subscription_id/renew
pub async fn renew_subscription(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(subscription_id): Path<String>,
    body: Option<Json<RenewSubscriptionRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let cmd = RenewSubscriptionCommand {
        subscription_id: parse_id("subscription_id", &subscription_id)?,
        user_id: user.id,
        ledger_tx_hash: request.ledger_tx_hash,
    };

    let result = state.renew_subscription_handler().handle(cmd).await?;

    Ok(Json(PaidSubscriptionResponse {
        subscription: result.subscription.into(),
        verification: result.verification,
    }))
}
