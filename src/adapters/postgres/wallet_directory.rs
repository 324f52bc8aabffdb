//! Wallet lookup backed by the `users` table.

use async_trait::async_trait;
use sqlx::PgPool;

use super::database_error;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::WalletDirectory;

pub struct PostgresWalletDirectory {
    pool: PgPool,
}

impl PostgresWalletDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletDirectory for PostgresWalletDirectory {
    async fn wallet_for(&self, user_id: &UserId) -> Result<Option<String>, DomainError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT wallet_address FROM users WHERE id = $1")
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("look up wallet", e))?;

        // Blank addresses count as unregistered.
        Ok(row
            .and_then(|(wallet,)| wallet)
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty()))
    }
}
