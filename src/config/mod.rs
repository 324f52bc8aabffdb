//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `TIER_LEDGER` prefix and
//! `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use tier_ledger::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod billing;
mod database;
mod error;
mod ledger;
mod scheduler;
mod server;

pub use auth::AuthConfig;
pub use billing::BillingConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use ledger::LedgerConfig;
pub use scheduler::SchedulerConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub auth: AuthConfig,

    pub ledger: LedgerConfig,

    #[serde(default)]
    pub billing: BillingConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// Reads `.env` when present, then `TIER_LEDGER__*` variables:
    ///
    /// - `TIER_LEDGER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `TIER_LEDGER__DATABASE__URL=...` -> `database.url = ...`
    /// - `TIER_LEDGER__LEDGER__ASSET_CODE=USDC` -> `ledger.asset_code = "USDC"`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TIER_LEDGER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.ledger.validate(&self.server.environment)?;
        self.billing.validate()?;
        self.scheduler.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
