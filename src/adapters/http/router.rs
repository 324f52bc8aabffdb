//! Top-level HTTP router.
//!
//! Mounts every resource router under `/api`, runs the auth middleware over
//! them and wraps the whole app in the tower-http stack.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::access::access_routes;
use super::middleware::{auth_middleware, AuthState};
use super::providers::provider_routes;
use super::state::AppState;
use super::subscriptions::subscription_routes;
use super::tiers::tier_routes;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Transport settings for the router.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub request_timeout: Duration,
    /// Allowed browser origins. Empty disables cross-origin access.
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// Builds the full application router.
///
/// # Routes
///
/// - `GET /health` - Liveness probe (no auth)
/// - `/api/tiers` - Tier registry
/// - `/api/subscriptions` - Subscription ledger
/// - `/api/access` - Access gate
/// - `/api/providers` - Provider listings and revenue
pub fn api_router(state: AppState, validator: AuthState, config: &HttpConfig) -> Router {
    let api = Router::new()
        .nest("/tiers", tier_routes())
        .nest("/subscriptions", subscription_routes())
        .nest("/access", access_routes())
        .nest("/providers", provider_routes())
        .layer(middleware::from_fn_with_state(validator, auth_middleware))
        .with_state(state);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(config.request_timeout))
                .layer(cors_layer(&config.cors_origins))
                .layer(CompressionLayer::new())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::ledger::MockLedgerClient;
    use crate::adapters::memory::{InMemoryLedgerStore, InMemoryWalletDirectory};
    use crate::application::handlers::{AccessGate, PaymentVerifier};
    use crate::domain::subscription::{BillingPolicy, RevenueSplitter, StablecoinAsset};

    fn test_state() -> AppState {
        let store = InMemoryLedgerStore::new();
        let verifier = PaymentVerifier::new(
            Arc::new(MockLedgerClient::new()),
            StablecoinAsset::new("USDC", "GISSUER"),
        );
        AppState {
            tiers: Arc::new(store.clone()),
            subscriptions: Arc::new(store.clone()),
            reader: Arc::new(store.clone()),
            wallets: Arc::new(InMemoryWalletDirectory::new()),
            verifier: Arc::new(verifier),
            access_gate: Arc::new(AccessGate::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                Arc::new(store),
            )),
            splitter: RevenueSplitter::default(),
            policy: BillingPolicy::default(),
        }
    }

    fn app() -> Router {
        let validator: AuthState =
            Arc::new(MockSessionValidator::new().with_test_user("tok", "provider-1"));
        api_router(test_state(), validator, &HttpConfig::default())
    }

    #[tokio::test]
    async fn health_needs_no_auth() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let response = app()
            .oneshot(Request::get("/api/subscriptions").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authenticated_tier_listing_succeeds() {
        let response = app()
            .oneshot(
                Request::get("/api/providers/provider-1/tiers")
                    .header("Authorization", "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_tier_id_is_a_bad_request() {
        let response = app()
            .oneshot(
                Request::get("/api/tiers/not-a-uuid")
                    .header("Authorization", "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_cors_origins_are_skipped() {
        let _ = cors_layer(&["https://app.example.com".to_string(), "bad\norigin".to_string()]);
    }
}
