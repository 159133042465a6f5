//! Plansync server entrypoint.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plansync::adapters::http::billing::{billing_router, BillingAppState};
use plansync::adapters::memory::{
    InMemoryPlanCatalog, InMemoryProfileRepository, InMemorySubscriptionStore,
};
use plansync::adapters::postgres::{
    create_pool, PostgresPlanCatalog, PostgresProfileRepository, PostgresSubscriptionStore,
};
use plansync::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use plansync::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(config.server.log_level.clone())
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if !config.payment.has_secret_key() {
        tracing::warn!("Stripe secret key not configured; billing endpoints will return errors");
    }

    let payment_provider = Arc::new(StripePaymentAdapter::new(StripeConfig::new(
        config.payment.stripe_secret_key.clone(),
    )));

    let state = if config.database.url.is_empty() {
        tracing::warn!("No database configured; using in-memory stores with an empty plan catalog");
        BillingAppState {
            profiles: Arc::new(InMemoryProfileRepository::new()),
            catalog: Arc::new(InMemoryPlanCatalog::with_plans(vec![])),
            subscriptions: Arc::new(InMemorySubscriptionStore::new()),
            payment_provider,
            payment_config: Arc::new(config.payment.clone()),
        }
    } else {
        let pool = create_pool(&config.database).await?;
        if config.database.run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Database migrations applied");
        }
        BillingAppState {
            profiles: Arc::new(PostgresProfileRepository::new(pool.clone())),
            catalog: Arc::new(PostgresPlanCatalog::new(pool.clone())),
            subscriptions: Arc::new(PostgresSubscriptionStore::new(pool)),
            payment_provider,
            payment_config: Arc::new(config.payment.clone()),
        }
    };

    let origins = config
        .server
        .cors_origins_list()
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    let mut cors = CorsLayer::new().allow_methods([Method::GET, Method::POST]);
    if !origins.is_empty() {
        cors = cors.allow_origin(origins);
    }

    let app = billing_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "Plansync listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
