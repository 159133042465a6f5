//! PostgreSQL implementation of SubscriptionStore.
//!
//! `replace` is an upsert on the user_id primary key: the whole row is
//! overwritten with the snapshot-derived record, mirroring the engine's
//! no-partial-merge contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::{BillingInterval, SubscriptionStatus, UserSubscription};
use crate::domain::foundation::{DomainError, ErrorCode, PlanId, Timestamp, UserId};
use crate::ports::SubscriptionStore;

/// PostgreSQL-backed subscription store.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    user_id: String,
    plan_id: String,
    stripe_subscription_id: Option<String>,
    stripe_customer_id: Option<String>,
    status: String,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    cancel_at_period_end: bool,
    billing_interval: Option<String>,
    trial_start: Option<DateTime<Utc>>,
    trial_end: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriptionRow> for UserSubscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = SubscriptionStatus::from_provider(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid status value: {}", row.status),
            )
        })?;

        let billing_interval = row
            .billing_interval
            .as_deref()
            .map(parse_interval)
            .transpose()?;

        Ok(UserSubscription {
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            plan_id: PlanId::new(row.plan_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid plan_id: {}", e))
            })?,
            stripe_subscription_id: row.stripe_subscription_id,
            stripe_customer_id: row.stripe_customer_id,
            status,
            current_period_start: row.current_period_start.map(Timestamp::from_datetime),
            current_period_end: row.current_period_end.map(Timestamp::from_datetime),
            cancel_at_period_end: row.cancel_at_period_end,
            billing_interval,
            trial_start: row.trial_start.map(Timestamp::from_datetime),
            trial_end: row.trial_end.map(Timestamp::from_datetime),
        })
    }
}

fn parse_interval(s: &str) -> Result<BillingInterval, DomainError> {
    match s {
        "month" => Ok(BillingInterval::Month),
        "year" => Ok(BillingInterval::Year),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid billing_interval value: {}", s),
        )),
    }
}

fn db_error(e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, e.to_string())
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserSubscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT user_id, plan_id, stripe_subscription_id, stripe_customer_id,
                   status, current_period_start, current_period_end,
                   cancel_at_period_end, billing_interval, trial_start, trial_end
            FROM user_subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(UserSubscription::try_from).transpose()
    }

    async fn replace(&self, subscription: &UserSubscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO user_subscriptions (
                user_id, plan_id, stripe_subscription_id, stripe_customer_id,
                status, current_period_start, current_period_end,
                cancel_at_period_end, billing_interval, trial_start, trial_end,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now())
            ON CONFLICT (user_id) DO UPDATE SET
                plan_id = EXCLUDED.plan_id,
                stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                status = EXCLUDED.status,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                billing_interval = EXCLUDED.billing_interval,
                trial_start = EXCLUDED.trial_start,
                trial_end = EXCLUDED.trial_end,
                updated_at = now()
            "#,
        )
        .bind(subscription.user_id.as_str())
        .bind(subscription.plan_id.as_str())
        .bind(&subscription.stripe_subscription_id)
        .bind(&subscription.stripe_customer_id)
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_start.map(|t| *t.as_datetime()))
        .bind(subscription.current_period_end.map(|t| *t.as_datetime()))
        .bind(subscription.cancel_at_period_end)
        .bind(subscription.billing_interval.map(|i| i.as_str()))
        .bind(subscription.trial_start.map(|t| *t.as_datetime()))
        .bind(subscription.trial_end.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }
}
