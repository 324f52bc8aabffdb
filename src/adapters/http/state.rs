//! Shared application state for the HTTP API.

use std::str::FromStr;
use std::sync::Arc;

use crate::application::handlers::{
    AccessGate, CancelSubscriptionHandler, CancelTierHandler, CreateTierHandler,
    GetSubscriptionHandler, GetTierHandler, ListActiveSubscribersHandler,
    ListProviderTiersHandler, ListUserSubscriptionsHandler, PaymentVerifier,
    RenewSubscriptionHandler, RevenueSummaryHandler, SubscribeHandler, UpdateTierHandler,
};
use crate::domain::foundation::UserId;
use crate::domain::subscription::{BillingPolicy, RevenueSplitter};
use crate::ports::{SubscriptionReader, SubscriptionRepository, TierRepository, WalletDirectory};

use super::error::ApiError;

/// Dependencies shared by every request.
///
/// Cloned per request; everything heavy sits behind an `Arc`. Handlers are
/// built on demand from it.
#[derive(Clone)]
pub struct AppState {
    pub tiers: Arc<dyn TierRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub reader: Arc<dyn SubscriptionReader>,
    pub wallets: Arc<dyn WalletDirectory>,
    pub verifier: Arc<PaymentVerifier>,
    pub access_gate: Arc<AccessGate>,
    pub splitter: RevenueSplitter,
    pub policy: BillingPolicy,
}

impl AppState {
    pub fn create_tier_handler(&self) -> CreateTierHandler {
        CreateTierHandler::new(self.tiers.clone())
    }

    pub fn update_tier_handler(&self) -> UpdateTierHandler {
        UpdateTierHandler::new(self.tiers.clone())
    }

    pub fn cancel_tier_handler(&self) -> CancelTierHandler {
        CancelTierHandler::new(self.tiers.clone())
    }

    pub fn get_tier_handler(&self) -> GetTierHandler {
        GetTierHandler::new(self.tiers.clone())
    }

    pub fn list_provider_tiers_handler(&self) -> ListProviderTiersHandler {
        ListProviderTiersHandler::new(self.tiers.clone())
    }

    pub fn subscribe_handler(&self) -> SubscribeHandler {
        SubscribeHandler::new(
            self.tiers.clone(),
            self.subscriptions.clone(),
            self.wallets.clone(),
            self.verifier.clone(),
            self.splitter,
            self.policy,
        )
    }

    pub fn renew_subscription_handler(&self) -> RenewSubscriptionHandler {
        RenewSubscriptionHandler::new(
            self.tiers.clone(),
            self.subscriptions.clone(),
            self.verifier.clone(),
            self.access_gate.clone(),
            self.splitter,
            self.policy,
        )
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.subscriptions.clone())
    }

    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.subscriptions.clone())
    }

    pub fn list_user_subscriptions_handler(&self) -> ListUserSubscriptionsHandler {
        ListUserSubscriptionsHandler::new(self.reader.clone())
    }

    pub fn list_active_subscribers_handler(&self) -> ListActiveSubscribersHandler {
        ListActiveSubscribersHandler::new(self.reader.clone())
    }

    pub fn revenue_summary_handler(&self) -> RevenueSummaryHandler {
        RevenueSummaryHandler::new(self.tiers.clone(), self.reader.clone())
    }
}

/// Parses a path or query identifier, naming the offending field on failure.
pub(crate) fn parse_id<T>(field: &str, raw: &str) -> Result<T, ApiError>
where
    T: FromStr,
{
    raw.parse()
        .map_err(|_| ApiError::invalid_param(field, format!("'{}' is not a valid {}", raw, field)))
}

/// Parses a user identifier from a path segment.
pub(crate) fn parse_user_id(field: &str, raw: &str) -> Result<UserId, ApiError> {
    UserId::new(raw).map_err(|e| ApiError::invalid_param(field, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TierId;
    use crate::domain::subscription::SubscriptionError;

    #[test]
    fn parse_id_accepts_uuids() {
        let id = TierId::new();

        let parsed: TierId = parse_id("tier_id", &id.to_string()).unwrap();

        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_id_names_the_field() {
        let err = parse_id::<TierId>("tier_id", "not-a-uuid").unwrap_err();

        match err.inner() {
            SubscriptionError::ValidationFailed { field, .. } => assert_eq!(field, "tier_id"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn parse_user_id_rejects_blank() {
        assert!(parse_user_id("provider_id", "  ").is_err());
    }

    #[test]
    fn app_state_is_clone_send_sync() {
        fn assert_bounds<T: Clone + Send + Sync>() {}
        assert_bounds::<AppState>();
    }
}
