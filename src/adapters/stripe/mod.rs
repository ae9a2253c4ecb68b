//! Stripe adapters.

mod billing_adapter;

pub use billing_adapter::{StripeBillingAdapter, StripeConfig};
