//! Subscription ledger handlers.
//!
//! ## Commands
//! - Subscribing (ledger-verified for paid tiers)
//! - Cancelling, immediately or at period end
//! - Renewing with a new ledger payment
//!
//! ## Queries
//! - Get a subscription, list a user's subscriptions
//! - Active subscribers and revenue summary for a provider

mod cancel_subscription;
mod get_subscriptions;
mod renew_subscription;
mod revenue_summary;
mod subscribe;

#[cfg(test)]
mod test_support;

// Commands
pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use renew_subscription::{
    RenewSubscriptionCommand, RenewSubscriptionHandler, RenewSubscriptionResult,
};
pub use subscribe::{SubscribeCommand, SubscribeHandler, SubscribeResult};

// Queries
pub use get_subscriptions::{
    GetSubscriptionHandler, GetSubscriptionQuery, ListActiveSubscribersHandler,
    ListActiveSubscribersQuery, ListUserSubscriptionsHandler, ListUserSubscriptionsQuery,
};
pub use revenue_summary::{RevenueSummary, RevenueSummaryHandler, RevenueSummaryQuery, TierRevenue};
