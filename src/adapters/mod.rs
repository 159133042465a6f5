//! Adapters - Implementations of ports against concrete infrastructure.
//!
//! - `http` - Axum routes and handlers
//! - `memory` - in-memory repositories (tests, local development)
//! - `postgres` - sqlx/PostgreSQL repositories
//! - `stripe` - Stripe API payment provider (plus a configurable mock)

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
