//! Billing domain - subscription records and webhook-driven state sync.
//!
//! The pieces fit together as: a raw request is authenticated by
//! [`StripeWebhookVerifier`], decoded into a [`StripeEvent`], reduced by
//! [`reduce`] to a lookup key plus a [`SubscriptionPatch`], and merged into
//! the matching [`SubscriptionRecord`] through the store port.

mod payloads;
mod plan;
mod record;
mod reducer;
mod status;
mod stripe_event;
mod webhook_errors;
mod webhook_verifier;

pub use payloads::{CheckoutSessionObject, InvoiceObject, SubscriptionObject};
pub use plan::PlanType;
pub use record::{SubscriptionPatch, SubscriptionRecord};
pub use reducer::{reduce, LookupKey, ReduceError, Reduction};
pub use status::SubscriptionStatus;
pub use stripe_event::{StripeEvent, StripeEventData, StripeEventType};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{SignatureHeader, StripeWebhookVerifier};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
#[cfg(test)]
pub use webhook_verifier::compute_test_signature;
