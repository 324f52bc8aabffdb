//! PostgreSQL implementation of SubscriptionReader.
//!
//! Read-side queries for the access gate, sweeps and provider dashboards.
//! Revenue figures come from `ledger_payments`, one row per applied payment.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::database_error;
use super::subscription_repository::{SubscriptionRow, SUBSCRIPTION_COLUMNS};
use crate::domain::foundation::{DomainError, Money, TierId, Timestamp, UserId};
use crate::domain::subscription::{SubscriptionStatus, UserSubscription};
use crate::ports::{PaymentTotals, SubscriptionReader};

pub struct PostgresSubscriptionReader {
    pool: PgPool,
}

impl PostgresSubscriptionReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn select(condition: &str) -> String {
    format!(
        "SELECT {} FROM subscriptions WHERE {} ORDER BY created_at DESC",
        SUBSCRIPTION_COLUMNS, condition
    )
}

fn into_subscriptions(rows: Vec<SubscriptionRow>) -> Result<Vec<UserSubscription>, DomainError> {
    rows.into_iter().map(UserSubscription::try_from).collect()
}

#[async_trait]
impl SubscriptionReader for PostgresSubscriptionReader {
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<UserSubscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&select("user_id = $1"))
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("list user subscriptions", e))?;

        into_subscriptions(rows)
    }

    async fn list_active_for_user_and_provider(
        &self,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<Vec<UserSubscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&select(
            "user_id = $1 AND provider_id = $2 AND status = 'active'",
        ))
        .bind(user_id.as_str())
        .bind(provider_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("list provider subscriptions for user", e))?;

        into_subscriptions(rows)
    }

    async fn list_active_by_provider(
        &self,
        provider_id: &UserId,
    ) -> Result<Vec<UserSubscription>, DomainError> {
        let rows: Vec<SubscriptionRow> =
            sqlx::query_as(&select("provider_id = $1 AND status = 'active'"))
                .bind(provider_id.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| database_error("list provider subscribers", e))?;

        into_subscriptions(rows)
    }

    async fn find_due_for_renewal(&self, now: Timestamp) -> Result<Vec<UserSubscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&select(
            "status = 'active' AND auto_renew AND renews_at <= $1",
        ))
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("find subscriptions due for renewal", e))?;

        into_subscriptions(rows)
    }

    async fn find_expired_candidates(
        &self,
        now: Timestamp,
    ) -> Result<Vec<UserSubscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&select(
            "status IN ('active', 'suspended') AND period_end <= $1",
        ))
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("find expired subscriptions", e))?;

        into_subscriptions(rows)
    }

    async fn find_renewing_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<UserSubscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&select(
            "status = 'active' AND auto_renew AND renews_at >= $1 AND renews_at < $2",
        ))
        .bind(start.as_datetime())
        .bind(end.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("find renewing subscriptions", e))?;

        into_subscriptions(rows)
    }

    async fn find_by_status(
        &self,
        status: SubscriptionStatus,
    ) -> Result<Vec<UserSubscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&select("status = $1"))
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("find subscriptions by status", e))?;

        into_subscriptions(rows)
    }

    async fn payment_totals_for_tier(&self, tier_id: &TierId) -> Result<PaymentTotals, DomainError> {
        let (count, gross, commission, earnings): (i64, Decimal, Decimal, Decimal) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(amount_paid), 0),
                       COALESCE(SUM(platform_commission), 0),
                       COALESCE(SUM(provider_earnings), 0)
                FROM ledger_payments
                WHERE tier_id = $1
                "#,
            )
            .bind(tier_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| database_error("sum tier payments", e))?;

        Ok(PaymentTotals {
            payment_count: u64::try_from(count).unwrap_or(0),
            gross: Money::from_decimal(gross),
            platform_commission: Money::from_decimal(commission),
            provider_earnings: Money::from_decimal(earnings),
        })
    }

    async fn count_active_for_tier(&self, tier_id: &TierId) -> Result<u64, DomainError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM subscriptions WHERE tier_id = $1 AND status = 'active'",
        )
        .bind(tier_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| database_error("count tier subscribers", e))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
