//! Renewal scheduler configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::scheduler::RenewalSchedulerConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Run the sweeps in this process
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_daily")]
    pub expiry_interval_secs: u64,

    #[serde(default = "default_daily")]
    pub reminder_interval_secs: u64,

    #[serde(default = "default_suspended_interval")]
    pub suspended_interval_secs: u64,
}

impl SchedulerConfig {
    pub fn driver_config(&self) -> RenewalSchedulerConfig {
        RenewalSchedulerConfig::default()
            .with_expiry_interval(Duration::from_secs(self.expiry_interval_secs))
            .with_reminder_interval(Duration::from_secs(self.reminder_interval_secs))
            .with_suspended_interval(Duration::from_secs(self.suspended_interval_secs))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.expiry_interval_secs == 0
            || self.reminder_interval_secs == 0
            || self.suspended_interval_secs == 0
        {
            return Err(ValidationError::InvalidSchedulerInterval);
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            expiry_interval_secs: default_daily(),
            reminder_interval_secs: default_daily(),
            suspended_interval_secs: default_suspended_interval(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_daily() -> u64 {
    24 * 60 * 60
}

fn default_suspended_interval() -> u64 {
    6 * 60 * 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_driver_defaults() {
        let driver = SchedulerConfig::default().driver_config();
        let expected = RenewalSchedulerConfig::default();

        assert_eq!(driver.expiry_interval, expected.expiry_interval);
        assert_eq!(driver.reminder_interval, expected.reminder_interval);
        assert_eq!(driver.suspended_interval, expected.suspended_interval);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = SchedulerConfig {
            suspended_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidSchedulerInterval));
    }
}
