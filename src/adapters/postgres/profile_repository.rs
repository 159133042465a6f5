//! PostgreSQL implementation of ProfileRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::UserProfile;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::ProfileRepository;

/// PostgreSQL-backed profile repository.
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a profile.
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    user_id: String,
    email: Option<String>,
    stripe_customer_id: Option<String>,
    stripe_price_id: Option<String>,
    stripe_product_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(UserProfile {
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            email: row.email,
            stripe_customer_id: row.stripe_customer_id,
            stripe_price_id: row.stripe_price_id,
            stripe_product_id: row.stripe_product_id,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn db_error(e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, e.to_string())
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<UserProfile>, DomainError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT user_id, email, stripe_customer_id, stripe_price_id,
                   stripe_product_id, created_at, updated_at
            FROM user_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(UserProfile::try_from).transpose()
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserProfile>, DomainError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT user_id, email, stripe_customer_id, stripe_price_id,
                   stripe_product_id, created_at, updated_at
            FROM user_profiles
            WHERE stripe_customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(UserProfile::try_from).transpose()
    }

    async fn upsert(&self, profile: &UserProfile) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (
                user_id, email, stripe_customer_id, stripe_price_id,
                stripe_product_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                email = EXCLUDED.email,
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                stripe_price_id = EXCLUDED.stripe_price_id,
                stripe_product_id = EXCLUDED.stripe_product_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(profile.user_id.as_str())
        .bind(&profile.email)
        .bind(&profile.stripe_customer_id)
        .bind(&profile.stripe_price_id)
        .bind(&profile.stripe_product_id)
        .bind(profile.created_at.as_datetime())
        .bind(profile.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }
}
