//! Ledger (Horizon) configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;
use crate::adapters::ledger::HorizonConfig;
use crate::domain::subscription::StablecoinAsset;

/// Where payments are verified and which asset counts as payment.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Base URL of a Horizon-compatible API
    pub horizon_url: String,

    /// Stablecoin asset code, e.g. `USDC`
    pub asset_code: String,

    /// Issuing account of the stablecoin
    pub asset_issuer: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Account that receives the platform commission. Informational only;
    /// subscribers pay providers directly.
    #[serde(default)]
    pub platform_wallet: Option<String>,
}

impl LedgerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn horizon_config(&self) -> HorizonConfig {
        HorizonConfig::new(self.horizon_url.clone()).with_timeout(self.request_timeout())
    }

    pub fn platform_wallet(&self) -> Option<&str> {
        self.platform_wallet
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }

    pub fn asset(&self) -> StablecoinAsset {
        StablecoinAsset::new(self.asset_code.trim(), self.asset_issuer.trim())
    }

    /// Production must talk to the ledger over HTTPS.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.horizon_url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("LEDGER__HORIZON_URL"));
        }
        if !self.horizon_url.starts_with("https://") && !self.horizon_url.starts_with("http://") {
            return Err(ValidationError::InvalidLedgerUrl);
        }
        if *environment == Environment::Production && !self.horizon_url.starts_with("https://") {
            return Err(ValidationError::LedgerUrlMustBeHttps);
        }
        if self.asset_code.trim().is_empty() {
            return Err(ValidationError::MissingRequired("LEDGER__ASSET_CODE"));
        }
        if self.asset_issuer.trim().is_empty() {
            return Err(ValidationError::MissingRequired("LEDGER__ASSET_ISSUER"));
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_request_timeout() -> u64 {
    10
}
