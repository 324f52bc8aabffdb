//! Billing configuration

use rust_decimal::Decimal;
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::subscription::{BillingPolicy, CommissionRate, RevenueSplitter};

/// Commission and billing cycle settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Platform share of every payment, `0.20` = 20%
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,

    #[serde(default = "default_cycle_days")]
    pub billing_cycle_days: i64,

    /// Days before period end that the renewal reminder goes out
    #[serde(default = "default_notice_days")]
    pub renewal_notice_days: i64,

    /// Consecutive failed renewals before suspension
    #[serde(default = "default_max_failures")]
    pub max_payment_failures: u32,
}

impl BillingConfig {
    pub fn splitter(&self) -> Result<RevenueSplitter, ValidationError> {
        CommissionRate::new(self.commission_rate)
            .map(RevenueSplitter::new)
            .map_err(|_| ValidationError::InvalidCommissionRate)
    }

    pub fn policy(&self) -> BillingPolicy {
        BillingPolicy {
            cycle_days: self.billing_cycle_days,
            notice_days: self.renewal_notice_days,
            max_payment_failures: self.max_payment_failures,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.splitter()?;
        if self.billing_cycle_days <= 0 {
            return Err(ValidationError::InvalidBillingPolicy(
                "billing_cycle_days must be positive",
            ));
        }
        if self.renewal_notice_days < 0 || self.renewal_notice_days >= self.billing_cycle_days {
            return Err(ValidationError::InvalidBillingPolicy(
                "renewal_notice_days must be shorter than the billing cycle",
            ));
        }
        if self.max_payment_failures == 0 {
            return Err(ValidationError::InvalidBillingPolicy(
                "max_payment_failures must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            commission_rate: default_commission_rate(),
            billing_cycle_days: default_cycle_days(),
            renewal_notice_days: default_notice_days(),
            max_payment_failures: default_max_failures(),
        }
    }
}

fn default_commission_rate() -> Decimal {
    Decimal::new(20, 2)
}

fn default_cycle_days() -> i64 {
    30
}

fn default_notice_days() -> i64 {
    3
}

fn default_max_failures() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_match_the_domain_policy() {
        let config = BillingConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.policy(), BillingPolicy::default());
        assert_eq!(config.splitter().unwrap(), RevenueSplitter::default());
    }

    #[test]
    fn commission_above_one_is_rejected() {
        let config = BillingConfig {
            commission_rate: dec!(1.5),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCommissionRate));
    }

    #[test]
    fn notice_must_fit_inside_cycle() {
        let config = BillingConfig {
            billing_cycle_days: 3,
            renewal_notice_days: 3,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBillingPolicy(_))
        ));
    }
}
