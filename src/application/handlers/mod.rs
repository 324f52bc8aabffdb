//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod access;
pub mod payment;
pub mod renewal;
pub mod subscription;
pub mod tier;

pub use access::{AccessDecision, AccessGate};
pub use payment::PaymentVerifier;
pub use renewal::{RenewalScheduler, SweepReport};
pub use subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
    GetSubscriptionHandler, GetSubscriptionQuery, ListActiveSubscribersHandler,
    ListActiveSubscribersQuery, ListUserSubscriptionsHandler, ListUserSubscriptionsQuery,
    RenewSubscriptionCommand, RenewSubscriptionHandler, RenewSubscriptionResult, RevenueSummary,
    RevenueSummaryHandler, RevenueSummaryQuery, SubscribeCommand, SubscribeHandler,
    SubscribeResult, TierRevenue,
};
pub use tier::{
    CancelTierCommand, CancelTierHandler, CancelTierResult, CreateTierCommand, CreateTierHandler,
    CreateTierResult, GetTierHandler, GetTierQuery, ListProviderTiersHandler,
    ListProviderTiersQuery, UpdateTierCommand, UpdateTierHandler, UpdateTierResult,
    TIER_CANCELLED_REASON,
};
