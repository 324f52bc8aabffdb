//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid listen address")]
    InvalidAddress,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("JWT secret must be at least 32 bytes")]
    WeakJwtSecret,

    #[error("Ledger URL must use HTTPS in production")]
    LedgerUrlMustBeHttps,

    #[error("Invalid ledger URL format")]
    InvalidLedgerUrl,

    #[error("Commission rate must be between 0 and 1")]
    InvalidCommissionRate,

    #[error("Invalid billing policy: {0}")]
    InvalidBillingPolicy(&'static str),

    #[error("Scheduler intervals must be positive")]
    InvalidSchedulerInterval,
}
