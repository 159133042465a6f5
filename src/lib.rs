//! Plansync - Billing State Synchronization Service
//!
//! Issues Stripe checkout and billing-portal sessions and reconciles the
//! application's per-user subscription record from the provider's webhook
//! deliveries.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
