//! Stripe adapter module.
//!
//! - `stripe_adapter` - `PaymentProvider` implementation over the Stripe API
//! - `mock_payment_provider` - configurable mock for tests

mod mock_payment_provider;
mod stripe_adapter;

pub use mock_payment_provider::MockPaymentProvider;
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
