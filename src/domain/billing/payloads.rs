//! Typed event payload schemas.
//!
//! Stripe delivers a polymorphic `data.object`; these types pin down the
//! fields each recognized event type is required (or allowed) to carry, so
//! the reducer works with validated data instead of raw JSON lookups. Decode
//! failures are reported to the dispatcher, which treats them as missing
//! correlation data.

use serde::Deserialize;
use std::collections::HashMap;

use super::stripe_event::StripeEvent;

/// Checkout Session object, as carried by `checkout.session.completed`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    /// Unique session identifier (cs_...).
    pub id: String,

    /// Customer ID attached during checkout.
    pub customer: Option<String>,

    /// Subscription ID if checkout created a subscription.
    pub subscription: Option<String>,

    /// Custom metadata attached at session creation; carries our
    /// `user_id` and `plan_type`.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Subscription object, as carried by `customer.subscription.*` events.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    /// Unique subscription identifier (sub_...).
    pub id: String,

    /// Customer ID owning this subscription.
    pub customer: String,

    /// Provider-side subscription status string.
    pub status: String,

    /// Current period start (Unix timestamp).
    pub current_period_start: i64,

    /// Current period end (Unix timestamp).
    pub current_period_end: i64,

    /// When cancellation was requested (Unix timestamp).
    pub canceled_at: Option<i64>,
}

/// Invoice object, as carried by `invoice.payment_*` events.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    /// Unique invoice identifier (in_...).
    pub id: String,

    /// Customer ID the invoice was issued to.
    pub customer: String,

    /// Associated subscription ID, if any.
    pub subscription: Option<String>,

    /// Amount paid in the smallest currency unit.
    #[serde(default)]
    pub amount_paid: i64,
}

/// Decode the event's `data.object` as the given payload type.
pub fn decode_object<T: serde::de::DeserializeOwned>(
    event: &StripeEvent,
) -> Result<T, serde_json::Error> {
    serde_json::from_value(event.data.object.clone())
}
