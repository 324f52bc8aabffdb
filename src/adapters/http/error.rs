//! Error responses for the HTTP API.
//!
//! Every failure leaves the API as an `ErrorResponse` body. Storage and
//! internal messages are logged, never echoed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;
use crate::domain::subscription::SubscriptionError;

/// Standard error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(SubscriptionError);

impl ApiError {
    /// Rejects a malformed path or query parameter.
    pub fn invalid_param(field: &str, message: impl Into<String>) -> Self {
        Self(SubscriptionError::validation(field, message))
    }

    pub fn inner(&self) -> &SubscriptionError {
        &self.0
    }
}

impl From<SubscriptionError> for ApiError {
    fn from(err: SubscriptionError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(SubscriptionError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SubscriptionError::TierNotFound(_) | SubscriptionError::SubscriptionNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SubscriptionError::Conflict { .. } => StatusCode::CONFLICT,
            SubscriptionError::ValidationFailed { .. }
            | SubscriptionError::InvalidState { .. }
            | SubscriptionError::PaymentRejected { .. } => StatusCode::BAD_REQUEST,
            SubscriptionError::Forbidden(_) => StatusCode::FORBIDDEN,
            SubscriptionError::LedgerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SubscriptionError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let error_code = self.0.code().to_string();

        let body = match &self.0 {
            SubscriptionError::Infrastructure(detail) => {
                tracing::error!(error = %detail, "Request failed with internal error");
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred")
            }
            SubscriptionError::LedgerUnavailable(detail) => {
                tracing::warn!(error = %detail, "Ledger unavailable");
                ErrorResponse::new(error_code, "Ledger is temporarily unavailable, retry later")
            }
            SubscriptionError::ValidationFailed { field, .. } => ErrorResponse::with_details(
                error_code,
                self.0.message(),
                serde_json::json!({ "field": field }),
            ),
            other => ErrorResponse::new(error_code, other.message()),
        };

        (status, Json(body)).into_response()
    }
}
