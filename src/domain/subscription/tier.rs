//! Subscription tier aggregate.
//!
//! A tier is a priced access level a provider publishes. The tier registry
//! owns its descriptive fields; the subscription ledger owns
//! `subscriber_count` and `total_revenue` and only ever moves them through
//! atomic storage operations.

use crate::domain::foundation::{
    DomainError, ErrorCode, Money, OwnedByUser, TierId, Timestamp, UserId, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_NAME_LEN: usize = 100;

/// Access level of a tier. Ordering follows rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TierLevel {
    Free,
    Basic,
    Premium,
    Vip,
}

impl TierLevel {
    pub fn is_free(&self) -> bool {
        matches!(self, TierLevel::Free)
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TierLevel::Free => "free",
            TierLevel::Basic => "basic",
            TierLevel::Premium => "premium",
            TierLevel::Vip => "vip",
        }
    }
}

impl fmt::Display for TierLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TierLevel {
    type Err = String;

    /// Accepts either the storage form (`premium`) or the wire form (`PREMIUM`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Ok(TierLevel::Free),
            "basic" => Ok(TierLevel::Basic),
            "premium" => Ok(TierLevel::Premium),
            "vip" => Ok(TierLevel::Vip),
            _ => Err(format!("Invalid tier level: {}", s)),
        }
    }
}

/// Input for creating a tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSpec {
    pub name: String,
    pub description: String,
    pub level: TierLevel,
    pub price: Money,
    pub signal_limit: Option<u32>,
    pub benefits: Vec<String>,
}

/// Partial update of a tier. `None` leaves a field untouched.
///
/// `signal_limit: Some(None)` clears the limit (unlimited).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub signal_limit: Option<Option<u32>>,
    pub benefits: Option<Vec<String>>,
    pub accepting_new_subscribers: Option<bool>,
}

impl TierPatch {
    pub fn is_empty(&self) -> bool {
        self == &TierPatch::default()
    }
}

/// A provider's published access tier.
///
/// # Invariants
///
/// - FREE tiers cost exactly zero, every other level costs more than zero
/// - `price` cannot change once `subscriber_count > 0`
/// - an inactive tier never accepts new subscribers
/// - `signal_limit`, when present, is positive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionTier {
    pub id: TierId,
    pub provider_id: UserId,
    pub name: String,
    pub description: String,
    pub level: TierLevel,
    pub price: Money,
    /// `None` means unlimited.
    pub signal_limit: Option<u32>,
    pub benefits: Vec<String>,
    pub active: bool,
    pub accepting_new_subscribers: bool,
    pub subscriber_count: u32,
    pub total_revenue: Money,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SubscriptionTier {
    /// Creates a new active tier with zeroed counters.
    pub fn create(provider_id: UserId, spec: TierSpec, now: Timestamp) -> Result<Self, ValidationError> {
        let name = validate_name(&spec.name)?;
        validate_price(spec.level, &spec.price)?;
        validate_signal_limit(spec.signal_limit)?;

        Ok(Self {
            id: TierId::new(),
            provider_id,
            name,
            description: spec.description.trim().to_string(),
            level: spec.level,
            price: spec.price,
            signal_limit: spec.signal_limit,
            benefits: normalize_benefits(spec.benefits),
            active: true,
            accepting_new_subscribers: true,
            subscriber_count: 0,
            total_revenue: Money::zero(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_free(&self) -> bool {
        self.level.is_free()
    }

    /// True if a new subscription may be opened against this tier.
    pub fn is_open_for_subscription(&self) -> bool {
        self.active && self.accepting_new_subscribers
    }

    /// True once anyone has subscribed; the price is frozen from then on.
    pub fn is_price_locked(&self) -> bool {
        self.subscriber_count > 0
    }

    /// Applies a registry-side patch.
    ///
    /// # Errors
    ///
    /// - `TierInactive` if the tier was cancelled
    /// - `PriceLocked` if the price changes while subscribers exist
    /// - validation codes for malformed fields
    pub fn apply_patch(&mut self, patch: TierPatch, now: Timestamp) -> Result<(), DomainError> {
        if !self.active {
            return Err(DomainError::new(
                ErrorCode::TierInactive,
                "Cannot update a cancelled tier",
            ));
        }

        if let Some(price) = patch.price {
            if price != self.price {
                if self.is_price_locked() {
                    return Err(DomainError::new(
                        ErrorCode::PriceLocked,
                        "Price cannot change while the tier has subscribers",
                    )
                    .with_detail("subscriber_count", self.subscriber_count.to_string()));
                }
                validate_price(self.level, &price)?;
                self.price = price;
            }
        }

        if let Some(name) = patch.name {
            self.name = validate_name(&name)?;
        }
        if let Some(description) = patch.description {
            self.description = description.trim().to_string();
        }
        if let Some(limit) = patch.signal_limit {
            validate_signal_limit(limit)?;
            self.signal_limit = limit;
        }
        if let Some(benefits) = patch.benefits {
            self.benefits = normalize_benefits(benefits);
        }
        if let Some(accepting) = patch.accepting_new_subscribers {
            self.accepting_new_subscribers = accepting;
        }

        self.updated_at = now;
        Ok(())
    }

    /// Soft-deactivates the tier.
    ///
    /// Subscriber count is zeroed because the cancellation cascade ends every
    /// active subscription in the same unit of work.
    pub fn deactivate(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if !self.active {
            return Err(DomainError::new(
                ErrorCode::TierInactive,
                "Tier is already cancelled",
            ));
        }
        self.active = false;
        self.accepting_new_subscribers = false;
        self.subscriber_count = 0;
        self.updated_at = now;
        Ok(())
    }
}

impl OwnedByUser for SubscriptionTier {
    fn owner_id(&self) -> &UserId {
        &self.provider_id
    }
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field("name"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::out_of_range(
            "name",
            1,
            MAX_NAME_LEN,
            trimmed.chars().count(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_price(level: TierLevel, price: &Money) -> Result<(), ValidationError> {
    if level.is_free() && !price.is_zero() {
        return Err(ValidationError::invalid_format(
            "price",
            "FREE tiers must have a price of 0",
        ));
    }
    if !level.is_free() && !price.is_positive() {
        return Err(ValidationError::invalid_format(
            "price",
            "paid tiers must have a price greater than 0",
        ));
    }
    Ok(())
}

fn validate_signal_limit(limit: Option<u32>) -> Result<(), ValidationError> {
    match limit {
        Some(0) => Err(ValidationError::invalid_format(
            "signal_limit",
            "must be positive or omitted for unlimited",
        )),
        _ => Ok(()),
    }
}

fn normalize_benefits(benefits: Vec<String>) -> Vec<String> {
    benefits
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect()
}
