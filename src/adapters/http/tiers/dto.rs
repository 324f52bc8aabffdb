//! HTTP DTOs for tier endpoints.

use serde::{Deserialize, Deserializer, Serialize};

use crate::adapters::http::error::ApiError;
use crate::domain::foundation::Money;
use crate::domain::subscription::{SubscriptionTier, TierLevel, TierPatch, TierSpec};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to publish a tier.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTierRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub level: TierLevel,
    /// Decimal string in stablecoin units, e.g. `"10.00"`.
    pub price: String,
    /// Omitted means unlimited.
    #[serde(default)]
    pub signal_limit: Option<u32>,
    #[serde(default)]
    pub benefits: Vec<String>,
}

impl CreateTierRequest {
    pub fn into_spec(self) -> Result<TierSpec, ApiError> {
        Ok(TierSpec {
            price: parse_price(&self.price)?,
            name: self.name,
            description: self.description,
            level: self.level,
            signal_limit: self.signal_limit,
            benefits: self.benefits,
        })
    }
}

/// Partial tier update. Absent fields stay unchanged.
///
/// `signal_limit: null` removes the limit; omitting it keeps the current one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTierRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub signal_limit: Option<Option<u32>>,
    #[serde(default)]
    pub benefits: Option<Vec<String>>,
    #[serde(default)]
    pub accepting_new_subscribers: Option<bool>,
}

impl UpdateTierRequest {
    pub fn into_patch(self) -> Result<TierPatch, ApiError> {
        let price = self.price.as_deref().map(parse_price).transpose()?;
        Ok(TierPatch {
            name: self.name,
            description: self.description,
            price,
            signal_limit: self.signal_limit,
            benefits: self.benefits,
            accepting_new_subscribers: self.accepting_new_subscribers,
        })
    }
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<u32>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u32>::deserialize(deserializer).map(Some)
}

fn parse_price(raw: &str) -> Result<Money, ApiError> {
    Money::parse(raw).map_err(|e| ApiError::invalid_param("price", e.to_string()))
}

/// Query string for tier listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTiersParams {
    #[serde(default)]
    pub include_inactive: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierResponse {
    pub id: String,
    pub provider_id: String,
    pub name: String,
    pub description: String,
    pub level: TierLevel,
    pub price: String,
    pub signal_limit: Option<u32>,
    pub benefits: Vec<String>,
    pub active: bool,
    pub accepting_new_subscribers: bool,
    pub subscriber_count: u32,
    pub total_revenue: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SubscriptionTier> for TierResponse {
    fn from(tier: SubscriptionTier) -> Self {
        Self {
            id: tier.id.to_string(),
            provider_id: tier.provider_id.to_string(),
            name: tier.name,
            description: tier.description,
            level: tier.level,
            price: tier.price.to_string(),
            signal_limit: tier.signal_limit,
            benefits: tier.benefits,
            active: tier.active,
            accepting_new_subscribers: tier.accepting_new_subscribers,
            subscriber_count: tier.subscriber_count,
            total_revenue: tier.total_revenue.to_string(),
            created_at: tier.created_at.to_string(),
            updated_at: tier.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierListResponse {
    pub tiers: Vec<TierResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_null_from_absent_signal_limit() {
        let cleared: UpdateTierRequest =
            serde_json::from_str(r#"{"signal_limit": null}"#).unwrap();
        let untouched: UpdateTierRequest = serde_json::from_str(r#"{"name": "Gold"}"#).unwrap();
        let set: UpdateTierRequest = serde_json::from_str(r#"{"signal_limit": 5}"#).unwrap();

        assert_eq!(cleared.signal_limit, Some(None));
        assert_eq!(untouched.signal_limit, None);
        assert_eq!(set.signal_limit, Some(Some(5)));
    }

    #[test]
    fn create_request_parses_price_and_level() {
        let request: CreateTierRequest = serde_json::from_str(
            r#"{"name": "Pro", "level": "PREMIUM", "price": "25.50", "benefits": ["daily"]}"#,
        )
        .unwrap();

        let spec = request.into_spec().unwrap();

        assert_eq!(spec.level, TierLevel::Premium);
        assert_eq!(spec.price, Money::parse("25.5").unwrap());
        assert_eq!(spec.signal_limit, None);
    }

    #[test]
    fn malformed_price_is_rejected() {
        let request = UpdateTierRequest {
            price: Some("ten".to_string()),
            ..Default::default()
        };

        assert!(request.into_patch().is_err());
    }
}
