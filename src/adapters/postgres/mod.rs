//! PostgreSQL adapter implementations.

mod plan_catalog;
mod profile_repository;
mod subscription_store;

pub use plan_catalog::PostgresPlanCatalog;
pub use profile_repository::PostgresProfileRepository;
pub use subscription_store::PostgresSubscriptionStore;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Create a connection pool from configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))
}
