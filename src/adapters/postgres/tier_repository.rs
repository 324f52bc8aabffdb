//! PostgreSQL implementation of TierRepository.
//!
//! Registry-owned columns are written here. `subscriber_count` and
//! `total_revenue` are only touched by the cancellation cascade, which zeroes
//! the count in the same transaction that cancels the subscriptions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{count_column, database_error, parse_column};
use crate::domain::foundation::{DomainError, ErrorCode, Money, TierId, Timestamp, UserId};
use crate::domain::subscription::SubscriptionTier;
use crate::ports::TierRepository;

pub struct PostgresTierRepository {
    pool: PgPool,
}

impl PostgresTierRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TIER_COLUMNS: &str = r#"
    id, provider_id, name, description, level, price, signal_limit, benefits,
    active, accepting_new_subscribers, subscriber_count, total_revenue,
    created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct TierRow {
    id: Uuid,
    provider_id: String,
    name: String,
    description: String,
    level: String,
    price: Decimal,
    signal_limit: Option<i32>,
    benefits: Vec<String>,
    active: bool,
    accepting_new_subscribers: bool,
    subscriber_count: i32,
    total_revenue: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TierRow> for SubscriptionTier {
    type Error = DomainError;

    fn try_from(row: TierRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionTier {
            id: TierId::from_uuid(row.id),
            provider_id: UserId::new(row.provider_id)
                .map_err(|e| DomainError::database(format!("Invalid provider_id: {}", e)))?,
            name: row.name,
            description: row.description,
            level: parse_column("level", &row.level)?,
            price: Money::from_decimal(row.price),
            signal_limit: row
                .signal_limit
                .map(u32::try_from)
                .transpose()
                .map_err(|_| DomainError::database("Negative signal_limit"))?,
            benefits: row.benefits,
            active: row.active,
            accepting_new_subscribers: row.accepting_new_subscribers,
            subscriber_count: u32::try_from(row.subscriber_count)
                .map_err(|_| DomainError::database("Negative subscriber_count"))?,
            total_revenue: Money::from_decimal(row.total_revenue),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn signal_limit_column(limit: Option<u32>) -> Result<Option<i32>, DomainError> {
    limit
        .map(i32::try_from)
        .transpose()
        .map_err(|_| DomainError::validation("signal_limit", "Signal limit is too large"))
}

#[async_trait]
impl TierRepository for PostgresTierRepository {
    async fn save(&self, tier: &SubscriptionTier) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO tiers (
                id, provider_id, name, description, level, price, signal_limit, benefits,
                active, accepting_new_subscribers, subscriber_count, total_revenue,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(tier.id.as_uuid())
        .bind(tier.provider_id.as_str())
        .bind(&tier.name)
        .bind(&tier.description)
        .bind(tier.level.as_str())
        .bind(tier.price.as_decimal())
        .bind(signal_limit_column(tier.signal_limit)?)
        .bind(&tier.benefits)
        .bind(tier.active)
        .bind(tier.accepting_new_subscribers)
        .bind(count_column("subscriber_count", tier.subscriber_count)?)
        .bind(tier.total_revenue.as_decimal())
        .bind(tier.created_at.as_datetime())
        .bind(tier.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("save tier", e))?;

        tracing::debug!(tier_id = %tier.id, provider_id = %tier.provider_id, "Tier saved");
        Ok(())
    }

    async fn update(&self, tier: &SubscriptionTier) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("start transaction", e))?;

        let stored: Option<(Decimal, i32, bool)> = sqlx::query_as(
            "SELECT price, subscriber_count, active FROM tiers WHERE id = $1 FOR UPDATE",
        )
        .bind(tier.id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| database_error("lock tier", e))?;

        let Some((stored_price, stored_count, stored_active)) = stored else {
            return Err(DomainError::new(
                ErrorCode::TierNotFound,
                format!("Tier not found: {}", tier.id),
            ));
        };
        if !stored_active {
            return Err(DomainError::new(
                ErrorCode::TierInactive,
                "Tier has been cancelled",
            ));
        }
        if Money::from_decimal(stored_price) != tier.price && stored_count > 0 {
            return Err(DomainError::new(
                ErrorCode::PriceLocked,
                "Price cannot change while the tier has subscribers",
            )
            .with_detail("subscriber_count", stored_count.to_string()));
        }

        sqlx::query(
            r#"
            UPDATE tiers SET
                name = $2,
                description = $3,
                price = $4,
                signal_limit = $5,
                benefits = $6,
                accepting_new_subscribers = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(tier.id.as_uuid())
        .bind(&tier.name)
        .bind(&tier.description)
        .bind(tier.price.as_decimal())
        .bind(signal_limit_column(tier.signal_limit)?)
        .bind(&tier.benefits)
        .bind(tier.accepting_new_subscribers)
        .bind(tier.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| database_error("update tier", e))?;

        tx.commit()
            .await
            .map_err(|e| database_error("commit transaction", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &TierId) -> Result<Option<SubscriptionTier>, DomainError> {
        let row: Option<TierRow> =
            sqlx::query_as(&format!("SELECT {} FROM tiers WHERE id = $1", TIER_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("find tier", e))?;

        row.map(SubscriptionTier::try_from).transpose()
    }

    async fn list_by_provider(
        &self,
        provider_id: &UserId,
        include_inactive: bool,
    ) -> Result<Vec<SubscriptionTier>, DomainError> {
        let rows: Vec<TierRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM tiers
            WHERE provider_id = $1 AND ($2 OR active)
            ORDER BY price ASC, created_at ASC
            "#,
            TIER_COLUMNS
        ))
        .bind(provider_id.as_str())
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("list tiers", e))?;

        rows.into_iter().map(SubscriptionTier::try_from).collect()
    }

    async fn find_active_free_tier(
        &self,
        provider_id: &UserId,
    ) -> Result<Option<SubscriptionTier>, DomainError> {
        let row: Option<TierRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tiers WHERE provider_id = $1 AND level = 'free' AND active",
            TIER_COLUMNS
        ))
        .bind(provider_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find free tier", e))?;

        row.map(SubscriptionTier::try_from).transpose()
    }

    async fn deactivate_with_cascade(
        &self,
        id: &TierId,
        reason: &str,
        at: Timestamp,
    ) -> Result<u64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("start transaction", e))?;

        let active: Option<(bool,)> =
            sqlx::query_as("SELECT active FROM tiers WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| database_error("lock tier", e))?;

        match active {
            None => {
                return Err(DomainError::new(
                    ErrorCode::TierNotFound,
                    format!("Tier not found: {}", id),
                ))
            }
            Some((false,)) => {
                return Err(DomainError::new(
                    ErrorCode::TierInactive,
                    "Tier is already cancelled",
                ))
            }
            Some((true,)) => {}
        }

        let cancelled = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = 'cancelled',
                auto_renew = FALSE,
                cancellation_reason = $2,
                cancelled_at = $3,
                updated_at = $3
            WHERE tier_id = $1 AND status = 'active'
            "#,
        )
        .bind(id.as_uuid())
        .bind(reason)
        .bind(at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| database_error("cancel tier subscriptions", e))?
        .rows_affected();

        sqlx::query(
            r#"
            UPDATE tiers SET
                active = FALSE,
                accepting_new_subscribers = FALSE,
                subscriber_count = 0,
                updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| database_error("deactivate tier", e))?;

        tx.commit()
            .await
            .map_err(|e| database_error("commit transaction", e))?;

        tracing::info!(tier_id = %id, cancelled, "Tier deactivated");
        Ok(cancelled)
    }
}
