//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Variables are prefixed with `PLANSYNC`
//! and nested values use `__` (double underscore) as separators.
//!
//! # Example
//!
//! ```no_run
//! use plansync::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Payment configuration (Stripe)
    #[serde(default)]
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `PLANSYNC__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PLANSYNC__DATABASE__URL=...` -> `database.url = ...`
    /// - `PLANSYNC__PAYMENT__STRIPE_SECRET_KEY=...` -> `payment.stripe_secret_key = ...`
    ///
    /// A `.env` file is loaded first when present (development).
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PLANSYNC")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.payment.validate()?;
        // Database settings are only validated when a URL is supplied; the
        // service can run against in-memory stores in development.
        if !self.database.url.is_empty() {
            self.database.validate()?;
        }
        Ok(())
    }
}
