//! Revenue split between the platform and the provider.

use crate::domain::foundation::{Money, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Platform commission as a fraction of gross (`0.20` = 20%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct CommissionRate(Decimal);

impl CommissionRate {
    /// Creates a rate in the inclusive range `[0, 1]`.
    pub fn new(rate: Decimal) -> Result<Self, ValidationError> {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(ValidationError::out_of_range("commission_rate", 0, 1, rate));
        }
        Ok(Self(rate))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Default for CommissionRate {
    /// 20%.
    fn default() -> Self {
        Self(Decimal::new(20, 2))
    }
}

impl TryFrom<Decimal> for CommissionRate {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CommissionRate> for Decimal {
    fn from(rate: CommissionRate) -> Self {
        rate.0
    }
}

/// Result of splitting a gross payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSplit {
    pub gross: Money,
    pub platform_commission: Money,
    pub provider_earnings: Money,
}

impl RevenueSplit {
    /// Split of a zero-priced (free) subscription.
    pub fn zero() -> Self {
        Self {
            gross: Money::zero(),
            platform_commission: Money::zero(),
            provider_earnings: Money::zero(),
        }
    }
}

/// Splits gross payments into platform commission and provider earnings.
///
/// Commission is rounded to the ledger scale; earnings take the remainder so
/// the two parts always sum to the gross exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevenueSplitter {
    rate: CommissionRate,
}

impl RevenueSplitter {
    pub fn new(rate: CommissionRate) -> Self {
        Self { rate }
    }

    pub fn rate(&self) -> CommissionRate {
        self.rate
    }

    pub fn split(&self, gross: Money) -> RevenueSplit {
        let platform_commission = gross.mul_rate(self.rate.as_decimal());
        let provider_earnings = gross
            .checked_sub(&platform_commission)
            .unwrap_or_else(Money::zero);

        RevenueSplit {
            gross,
            platform_commission,
            provider_earnings,
        }
    }
}
