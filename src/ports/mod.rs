//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the billing core and the outside world. Adapters implement these ports.
//!
//! - `ProfileRepository` - user billing profiles (customer mapping)
//! - `PlanCatalog` - read-only subscription plan catalog
//! - `SubscriptionStore` - the single per-user subscription record
//! - `PaymentProvider` - hosted checkout/portal sessions and subscription calls

mod payment_provider;
mod plan_catalog;
mod profile_repository;
mod subscription_store;

pub use payment_provider::{
    CreateCheckoutRequest, CreateCustomerRequest, CreatePortalRequest, Customer,
    HostedCheckoutSession, HostedPortalSession, PaymentError, PaymentErrorCode, PaymentProvider,
    PortalFlow, PortalFlowData,
};
pub use plan_catalog::PlanCatalog;
pub use profile_repository::ProfileRepository;
pub use subscription_store::SubscriptionStore;
