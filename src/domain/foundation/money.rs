//! Exact stablecoin amounts.
//!
//! Ledger amounts carry seven fractional digits. `Money` keeps every value
//! rounded to that scale so that stored, displayed and compared amounts agree
//! with what the ledger reports. Floating point never touches an amount.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Number of fractional digits the ledger uses for asset amounts.
pub const LEDGER_SCALE: u32 = 7;

/// Stablecoin amount with fixed seven-digit scale.
///
/// Serializes as a decimal string (`"10.0000000"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub fn zero() -> Self {
        Self::from_decimal(Decimal::ZERO)
    }

    /// Smallest representable ledger unit (0.0000001).
    pub fn ledger_unit() -> Self {
        Self(Decimal::new(1, LEDGER_SCALE))
    }

    /// Wraps a decimal, rounding half away from zero to the ledger scale.
    pub fn from_decimal(value: Decimal) -> Self {
        let mut rounded =
            value.round_dp_with_strategy(LEDGER_SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(LEDGER_SCALE);
        Self(rounded)
    }

    /// Parses a decimal string such as `"12.5"` or `"12.5000000"`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        Decimal::from_str(s.trim())
            .map(Self::from_decimal)
            .map_err(|e| ValidationError::invalid_format("amount", e.to_string()))
    }

    /// Returns the inner decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Checked addition (returns None on overflow).
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self::from_decimal)
    }

    /// Checked subtraction (returns None on overflow).
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self::from_decimal)
    }

    /// Saturating addition, used for running totals.
    pub fn saturating_add(&self, other: &Self) -> Self {
        self.checked_add(other).unwrap_or(Self(Decimal::MAX))
    }

    /// Multiplies by a rate and rounds back to the ledger scale.
    pub fn mul_rate(&self, rate: Decimal) -> Self {
        Self::from_decimal(self.0.checked_mul(rate).unwrap_or(Decimal::MAX))
    }

    /// True when `self` covers `expected` within one ledger unit.
    pub fn covers(&self, expected: &Self) -> bool {
        match expected.checked_sub(&Self::ledger_unit()) {
            Some(floor) => self.0 >= floor.0,
            None => false,
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self::from_decimal(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
