//! Billing command and query handlers.
//!
//! One handler per operation, each taking its ports as `Arc<dyn _>`:
//!
//! - `resolvers` - customer-to-user and price-to-plan resolution
//! - `sync_subscription` - snapshot upsert engine + revert-to-free
//! - `process_webhook` - signature verification and event dispatch
//! - `create_checkout` - hosted checkout issuance with customer discovery
//! - `create_portal` - hosted portal issuance with flow scoping
//! - `manage_subscription` - direct cancel/resume via the provider
//! - `get_subscription` - subscription status read-back

mod create_checkout;
mod create_portal;
mod get_subscription;
mod manage_subscription;
mod process_webhook;
mod resolvers;
mod sync_subscription;

pub use create_checkout::{
    CheckoutIssued, CreateCheckoutCommand, CreateCheckoutHandler, CustomerSource,
};
pub use create_portal::{CreatePortalCommand, CreatePortalHandler, PortalIssued};
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery};
pub use manage_subscription::{UpdateCancellationCommand, UpdateCancellationHandler};
pub use process_webhook::{
    ProcessWebhookCommand, ProcessWebhookHandler, WebhookDisposition, WebhookReceipt,
};
pub use resolvers::{IdentityResolver, PlanResolver};
pub use sync_subscription::{SyncOutcome, SyncSubscriptionHandler};
