//! HTTP adapter - REST API over the tier registry, subscription ledger and
//! access gate.
//!
//! Each resource has its own module with `dto`, `handlers` and `routes`;
//! `router` assembles them behind the auth middleware.

pub mod access;
pub mod error;
pub mod middleware;
pub mod providers;
pub mod router;
pub mod state;
pub mod subscriptions;
pub mod tiers;

pub use error::{ApiError, ErrorResponse};
pub use middleware::{auth_middleware, AuthState, RequireAuth};
pub use router::{api_router, HttpConfig};
pub use state::AppState;
