//! HTTP adapter for the subscription ledger.
//!
//! - `POST /api/subscriptions` - Subscribe (ledger-verified for paid tiers)
//! - `GET /api/subscriptions` - List the caller's subscriptions
//! - `GET /api/subscriptions/:subscription_id` - Subscription details
//! - `PATCH /api/subscriptions/:subscription_id/cancel` - Cancel
//! - `PATCH /api/subscriptions/:subscription_id/renew` - Renew

pub mod dto;
mod handlers;
mod routes;

pub use dto::{
    CancelSubscriptionRequest, CancelSubscriptionResponse, PaidSubscriptionResponse,
    RenewSubscriptionRequest, SubscribeRequest, SubscriptionListResponse, SubscriptionResponse,
};
pub use routes::subscription_routes;
