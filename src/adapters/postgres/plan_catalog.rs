//! PostgreSQL implementation of PlanCatalog.
//!
//! The catalog table is seeded by migrations/ops tooling; this adapter only
//! reads.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::billing::SubscriptionPlan;
use crate::domain::foundation::{DomainError, ErrorCode, PlanId};
use crate::ports::PlanCatalog;

/// PostgreSQL-backed read-only plan catalog.
pub struct PostgresPlanCatalog {
    pool: PgPool,
}

impl PostgresPlanCatalog {
    /// Creates a new catalog with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a plan.
#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    plan_id: String,
    name: String,
    monthly_price: i64,
    yearly_price: i64,
    currency: String,
    stripe_monthly_price_id: Option<String>,
    stripe_yearly_price_id: Option<String>,
    stripe_product_id: Option<String>,
    is_active: bool,
}

impl TryFrom<PlanRow> for SubscriptionPlan {
    type Error = DomainError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionPlan {
            plan_id: PlanId::new(row.plan_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid plan_id: {}", e))
            })?,
            name: row.name,
            monthly_price: row.monthly_price,
            yearly_price: row.yearly_price,
            currency: row.currency,
            stripe_monthly_price_id: row.stripe_monthly_price_id,
            stripe_yearly_price_id: row.stripe_yearly_price_id,
            stripe_product_id: row.stripe_product_id,
            is_active: row.is_active,
        })
    }
}

fn db_error(e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, e.to_string())
}

const PLAN_COLUMNS: &str = r#"
    plan_id, name, monthly_price, yearly_price, currency,
    stripe_monthly_price_id, stripe_yearly_price_id, stripe_product_id, is_active
"#;

#[async_trait]
impl PlanCatalog for PostgresPlanCatalog {
    async fn find_by_id(&self, plan_id: &PlanId) -> Result<Option<SubscriptionPlan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscription_plans WHERE plan_id = $1",
            PLAN_COLUMNS
        ))
        .bind(plan_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(SubscriptionPlan::try_from).transpose()
    }

    async fn find_by_price_id(
        &self,
        price_ref: &str,
    ) -> Result<Option<SubscriptionPlan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM subscription_plans
            WHERE stripe_monthly_price_id = $1 OR stripe_yearly_price_id = $1
            "#,
            PLAN_COLUMNS
        ))
        .bind(price_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(SubscriptionPlan::try_from).transpose()
    }

    async fn list_active(&self) -> Result<Vec<SubscriptionPlan>, DomainError> {
        let rows: Vec<PlanRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscription_plans WHERE is_active ORDER BY monthly_price",
            PLAN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(SubscriptionPlan::try_from).collect()
    }
}
