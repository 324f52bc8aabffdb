//! PostgreSQL implementation of SubscriptionRepository.
//!
//! Each money- or seat-moving write is one transaction over the subscription
//! row(s), the tier row and, for payments, the `ledger_payments` row. Counter
//! changes are relative updates so concurrent subscribes never lose a seat.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgConnection, PgPool, Postgres};
use uuid::Uuid;

use super::{count_column, database_error, parse_column};
use crate::domain::foundation::{
    DomainError, ErrorCode, Money, SubscriptionId, TierId, Timestamp, UserId,
};
use crate::domain::subscription::{PaymentRecord, SubscriptionStatus, UserSubscription};
use crate::ports::SubscriptionRepository;

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(super) const SUBSCRIPTION_COLUMNS: &str = r#"
    id, user_id, tier_id, provider_id, status, payment_status,
    amount_paid, platform_commission, provider_earnings, ledger_tx_hash,
    period_start, period_end, renews_at, subscriber_wallet, provider_wallet,
    auto_renew, renewal_count, payment_failure_count, last_failure_reason,
    cancellation_reason, cancelled_at, created_at, updated_at
"#;

/// Columns a stored subscription may change after insert. `$1` is the id.
const UPDATE_SUBSCRIPTION: &str = r#"
    UPDATE subscriptions SET
        status = $2,
        payment_status = $3,
        amount_paid = $4,
        platform_commission = $5,
        provider_earnings = $6,
        ledger_tx_hash = $7,
        period_start = $8,
        period_end = $9,
        renews_at = $10,
        auto_renew = $11,
        renewal_count = $12,
        payment_failure_count = $13,
        last_failure_reason = $14,
        cancellation_reason = $15,
        cancelled_at = $16,
        updated_at = $17
    WHERE id = $1
"#;

const COUNTED: &str = "status IN ('active', 'suspended')";

#[derive(Debug, sqlx::FromRow)]
pub(super) struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    tier_id: Uuid,
    provider_id: String,
    status: String,
    payment_status: String,
    amount_paid: Decimal,
    platform_commission: Decimal,
    provider_earnings: Decimal,
    ledger_tx_hash: Option<String>,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    renews_at: DateTime<Utc>,
    subscriber_wallet: Option<String>,
    provider_wallet: Option<String>,
    auto_renew: bool,
    renewal_count: i32,
    payment_failure_count: i32,
    last_failure_reason: Option<String>,
    cancellation_reason: Option<String>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for UserSubscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let user_id = |value: String, column: &str| {
            UserId::new(value)
                .map_err(|e| DomainError::database(format!("Invalid {}: {}", column, e)))
        };
        let counter = |value: i32, column: &str| {
            u32::try_from(value)
                .map_err(|_| DomainError::database(format!("Negative {}", column)))
        };

        Ok(UserSubscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: user_id(row.user_id, "user_id")?,
            tier_id: TierId::from_uuid(row.tier_id),
            provider_id: user_id(row.provider_id, "provider_id")?,
            status: parse_column("status", &row.status)?,
            payment_status: parse_column("payment_status", &row.payment_status)?,
            amount_paid: Money::from_decimal(row.amount_paid),
            platform_commission: Money::from_decimal(row.platform_commission),
            provider_earnings: Money::from_decimal(row.provider_earnings),
            ledger_tx_hash: row.ledger_tx_hash,
            period_start: Timestamp::from_datetime(row.period_start),
            period_end: Timestamp::from_datetime(row.period_end),
            renews_at: Timestamp::from_datetime(row.renews_at),
            subscriber_wallet: row.subscriber_wallet,
            provider_wallet: row.provider_wallet,
            auto_renew: row.auto_renew,
            renewal_count: counter(row.renewal_count, "renewal_count")?,
            payment_failure_count: counter(row.payment_failure_count, "payment_failure_count")?,
            last_failure_reason: row.last_failure_reason,
            cancellation_reason: row.cancellation_reason,
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// Binds `$1..$17` of `UPDATE_SUBSCRIPTION` (plus whatever guard the caller appended).
fn bind_update<'q>(
    sql: &'q str,
    s: &'q UserSubscription,
) -> Result<Query<'q, Postgres, PgArguments>, DomainError> {
    Ok(sqlx::query(sql)
        .bind(s.id.as_uuid())
        .bind(s.status.as_str())
        .bind(s.payment_status.as_str())
        .bind(s.amount_paid.as_decimal())
        .bind(s.platform_commission.as_decimal())
        .bind(s.provider_earnings.as_decimal())
        .bind(s.ledger_tx_hash.as_deref())
        .bind(s.period_start.as_datetime())
        .bind(s.period_end.as_datetime())
        .bind(s.renews_at.as_datetime())
        .bind(s.auto_renew)
        .bind(count_column("renewal_count", s.renewal_count)?)
        .bind(count_column("payment_failure_count", s.payment_failure_count)?)
        .bind(s.last_failure_reason.as_deref())
        .bind(s.cancellation_reason.as_deref())
        .bind(s.cancelled_at.map(|t| *t.as_datetime()))
        .bind(s.updated_at.as_datetime()))
}

fn subscription_not_found(id: &SubscriptionId) -> DomainError {
    DomainError::new(
        ErrorCode::SubscriptionNotFound,
        format!("Subscription not found: {}", id),
    )
}

fn tier_not_found(id: &TierId) -> DomainError {
    DomainError::new(ErrorCode::TierNotFound, format!("Tier not found: {}", id))
}

fn tier_closed(id: &TierId) -> DomainError {
    DomainError::new(
        ErrorCode::TierInactive,
        format!("Tier is not accepting new subscribers: {}", id),
    )
}

fn concurrent_modification(id: &SubscriptionId) -> DomainError {
    DomainError::new(
        ErrorCode::ConcurrentModification,
        "Subscription was modified concurrently; reload and retry",
    )
    .with_detail("subscription_id", id.to_string())
}

async fn insert_payment(conn: &mut PgConnection, p: &PaymentRecord) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO ledger_payments (
            ledger_tx_hash, subscription_id, tier_id, provider_id, user_id, kind,
            amount_paid, platform_commission, provider_earnings, recorded_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(&p.ledger_tx_hash)
    .bind(p.subscription_id.as_uuid())
    .bind(p.tier_id.as_uuid())
    .bind(p.provider_id.as_str())
    .bind(p.user_id.as_str())
    .bind(p.kind.as_str())
    .bind(p.split.gross.as_decimal())
    .bind(p.split.platform_commission.as_decimal())
    .bind(p.split.provider_earnings.as_decimal())
    .bind(p.recorded_at.as_datetime())
    .execute(conn)
    .await
    .map_err(|e| database_error("record payment", e))?;
    Ok(())
}

/// Locks a subscription row and returns its status, if it exists.
async fn lock_status(
    conn: &mut PgConnection,
    id: &SubscriptionId,
) -> Result<Option<String>, DomainError> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT status FROM subscriptions WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(conn)
            .await
            .map_err(|e| database_error("lock subscription", e))?;
    Ok(row.map(|(status,)| status))
}

async fn release_seats(conn: &mut PgConnection, tier_id: &TierId, seats: i64) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        UPDATE tiers SET subscriber_count = GREATEST(subscriber_count - $2, 0)
        WHERE id = $1
        "#,
    )
    .bind(tier_id.as_uuid())
    .bind(seats)
    .execute(conn)
    .await
    .map_err(|e| database_error("release tier seats", e))?;
    Ok(())
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn insert_active(
        &self,
        subscription: &UserSubscription,
        payment: Option<&PaymentRecord>,
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("start transaction", e))?;

        // Taking the seat first locks the tier row for the rest of the unit,
        // so a concurrent cancel either lands before this or waits for commit.
        let seated = sqlx::query(
            r#"
            UPDATE tiers SET
                subscriber_count = subscriber_count + 1,
                total_revenue = total_revenue + $2
            WHERE id = $1 AND active AND accepting_new_subscribers
            "#,
        )
        .bind(subscription.tier_id.as_uuid())
        .bind(subscription.amount_paid.as_decimal())
        .execute(&mut *tx)
        .await
        .map_err(|e| database_error("update tier counters", e))?;
        if seated.rows_affected() == 0 {
            let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tiers WHERE id = $1")
                .bind(subscription.tier_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| database_error("load tier", e))?;
            return Err(match exists {
                None => tier_not_found(&subscription.tier_id),
                Some(_) => tier_closed(&subscription.tier_id),
            });
        }

        sqlx::query(&format!(
            r#"
            INSERT INTO subscriptions ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_str())
        .bind(subscription.tier_id.as_uuid())
        .bind(subscription.provider_id.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.payment_status.as_str())
        .bind(subscription.amount_paid.as_decimal())
        .bind(subscription.platform_commission.as_decimal())
        .bind(subscription.provider_earnings.as_decimal())
        .bind(subscription.ledger_tx_hash.as_deref())
        .bind(subscription.period_start.as_datetime())
        .bind(subscription.period_end.as_datetime())
        .bind(subscription.renews_at.as_datetime())
        .bind(subscription.subscriber_wallet.as_deref())
        .bind(subscription.provider_wallet.as_deref())
        .bind(subscription.auto_renew)
        .bind(count_column("renewal_count", subscription.renewal_count)?)
        .bind(count_column("payment_failure_count", subscription.payment_failure_count)?)
        .bind(subscription.last_failure_reason.as_deref())
        .bind(subscription.cancellation_reason.as_deref())
        .bind(subscription.cancelled_at.map(|t| *t.as_datetime()))
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| database_error("insert subscription", e))?;

        if let Some(payment) = payment {
            insert_payment(&mut tx, payment).await?;
        }

        tx.commit()
            .await
            .map_err(|e| database_error("commit transaction", e))?;

        tracing::debug!(
            subscription_id = %subscription.id,
            tier_id = %subscription.tier_id,
            "Subscription inserted"
        );
        Ok(())
    }

    async fn update(
        &self,
        subscription: &UserSubscription,
        expected_status: SubscriptionStatus,
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("start transaction", e))?;

        // Reactivation trips subscriptions_one_active_per_user_tier.
        let sql = format!("{} AND status = $18 AND period_end = $9", UPDATE_SUBSCRIPTION);
        let result = bind_update(&sql, subscription)?
            .bind(expected_status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error("update subscription", e))?;

        if result.rows_affected() == 0 {
            return match lock_status(&mut tx, &subscription.id).await? {
                None => Err(subscription_not_found(&subscription.id)),
                Some(_) => Err(concurrent_modification(&subscription.id)),
            };
        }

        tx.commit()
            .await
            .map_err(|e| database_error("commit transaction", e))?;
        Ok(())
    }

    async fn cancel_immediately(&self, subscription: &UserSubscription) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("start transaction", e))?;

        let sql = format!("{} AND period_end = $9 AND {}", UPDATE_SUBSCRIPTION, COUNTED);
        let result = bind_update(&sql, subscription)?
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error("cancel subscription", e))?;

        if result.rows_affected() == 0 {
            return match lock_status(&mut tx, &subscription.id).await? {
                None => Err(subscription_not_found(&subscription.id)),
                Some(_) => Err(concurrent_modification(&subscription.id)),
            };
        }
        release_seats(&mut tx, &subscription.tier_id, 1).await?;

        tx.commit()
            .await
            .map_err(|e| database_error("commit transaction", e))?;
        Ok(())
    }

    async fn apply_renewal(
        &self,
        subscription: &UserSubscription,
        previous_period_end: Timestamp,
        payment: Option<&PaymentRecord>,
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("start transaction", e))?;

        let sql = format!("{} AND period_end = $18 AND {}", UPDATE_SUBSCRIPTION, COUNTED);
        let result = bind_update(&sql, subscription)?
            .bind(previous_period_end.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error("renew subscription", e))?;

        if result.rows_affected() == 0 {
            return match lock_status(&mut tx, &subscription.id).await? {
                None => Err(subscription_not_found(&subscription.id)),
                Some(_) => Err(concurrent_modification(&subscription.id)),
            };
        }

        if let Some(payment) = payment {
            let credited = sqlx::query(
                "UPDATE tiers SET total_revenue = total_revenue + $2 WHERE id = $1",
            )
            .bind(subscription.tier_id.as_uuid())
            .bind(payment.split.gross.as_decimal())
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error("credit tier revenue", e))?;
            if credited.rows_affected() == 0 {
                return Err(tier_not_found(&subscription.tier_id));
            }
            insert_payment(&mut tx, payment).await?;
        }

        tx.commit()
            .await
            .map_err(|e| database_error("commit transaction", e))?;
        Ok(())
    }

    async fn expire(&self, id: &SubscriptionId, at: Timestamp) -> Result<bool, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("start transaction", e))?;

        let expired: Option<(Uuid,)> = sqlx::query_as(&format!(
            r#"
            UPDATE subscriptions SET
                status = 'expired',
                auto_renew = FALSE,
                updated_at = $2
            WHERE id = $1 AND {}
            RETURNING tier_id
            "#,
            COUNTED
        ))
        .bind(id.as_uuid())
        .bind(at.as_datetime())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| database_error("expire subscription", e))?;

        let Some((tier_id,)) = expired else {
            return match lock_status(&mut tx, id).await? {
                None => Err(subscription_not_found(id)),
                Some(_) => Ok(false),
            };
        };
        release_seats(&mut tx, &TierId::from_uuid(tier_id), 1).await?;

        tx.commit()
            .await
            .map_err(|e| database_error("commit transaction", e))?;
        Ok(true)
    }

    async fn revoke_for_tier(
        &self,
        tier_id: &TierId,
        reason: &str,
        at: Timestamp,
    ) -> Result<u64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("start transaction", e))?;

        let revoked = sqlx::query(
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
        .bind(tier_id.as_uuid())
        .bind(reason)
        .bind(at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| database_error("revoke subscriptions", e))?
        .rows_affected();

        if revoked > 0 {
            let seats = i64::try_from(revoked).unwrap_or(i64::MAX);
            release_seats(&mut tx, tier_id, seats).await?;
        }

        tx.commit()
            .await
            .map_err(|e| database_error("commit transaction", e))?;
        Ok(revoked)
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<UserSubscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find subscription", e))?;

        row.map(UserSubscription::try_from).transpose()
    }

    async fn find_active_for_user_and_tier(
        &self,
        user_id: &UserId,
        tier_id: &TierId,
    ) -> Result<Option<UserSubscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1 AND tier_id = $2 AND status = 'active'",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(tier_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find active subscription", e))?;

        row.map(UserSubscription::try_from).transpose()
    }
}
