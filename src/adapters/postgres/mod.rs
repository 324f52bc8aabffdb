//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresTierRepository` - Tier registry rows and the cancellation cascade
//! - `PostgresSubscriptionRepository` - Subscription writes with counter and payment bookkeeping
//! - `PostgresSubscriptionReader` - Read-side subscription and revenue queries
//! - `PostgresWalletDirectory` - Registered wallet lookup on `users`

mod subscription_reader;
mod subscription_repository;
mod tier_repository;
mod wallet_directory;

pub use subscription_reader::PostgresSubscriptionReader;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use tier_repository::PostgresTierRepository;
pub use wallet_directory::PostgresWalletDirectory;

use std::fmt::Display;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Unique indexes whose violation is a business conflict rather than a fault.
const CONFLICT_CONSTRAINTS: &[(&str, ErrorCode, &str)] = &[
    (
        "tiers_one_free_per_provider",
        ErrorCode::FreeTierExists,
        "Provider already has an active free tier",
    ),
    (
        "subscriptions_one_active_per_user_tier",
        ErrorCode::SubscriptionExists,
        "User already has an active subscription to this tier",
    ),
    (
        "ledger_payments_pkey",
        ErrorCode::PaymentAlreadyApplied,
        "Ledger transaction has already been applied to a subscription",
    ),
];

/// Maps a sqlx error to a domain error.
///
/// Known constraint violations become their conflict codes; everything else
/// is a `DatabaseError` and is logged here, since callers never see the text.
pub(crate) fn database_error(action: &str, e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &e {
        if let Some(constraint) = db_err.constraint() {
            if let Some((_, code, message)) =
                CONFLICT_CONSTRAINTS.iter().find(|(name, _, _)| *name == constraint)
            {
                return DomainError::new(*code, *message);
            }
        }
    }
    tracing::error!(action, error = %e, "Database operation failed");
    DomainError::database(format!("Failed to {}: {}", action, e))
}

/// Parses a stored enum column.
pub(crate) fn parse_column<T>(column: &str, value: &str) -> Result<T, DomainError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| DomainError::database(format!("Invalid {} value: {}", column, e)))
}

/// Converts a counter to its INTEGER column.
pub(crate) fn count_column(column: &str, value: u32) -> Result<i32, DomainError> {
    i32::try_from(value).map_err(|_| {
        DomainError::new(
            ErrorCode::InternalError,
            format!("{} exceeds column range", column),
        )
    })
}
