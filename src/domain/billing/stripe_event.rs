//! Stripe webhook event envelope.
//!
//! Only fields relevant to our processing are captured; the rest of Stripe's
//! event schema is ignored. Event-specific objects are decoded separately in
//! [`super::payloads`].

use serde::{Deserialize, Serialize};

/// Stripe webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    pub livemode: bool,

    /// API version used to render this event.
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,

    /// Previous values for updated attributes (only for update events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<serde_json::Value>,
}

impl StripeEvent {
    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::from_type_str(&self.event_type)
    }

    /// Returns true if this is a live mode event.
    pub fn is_live(&self) -> bool {
        self.livemode
    }
}

/// The closed set of Stripe event types this service acts on.
///
/// Anything else parses to `Unknown` and is acknowledged without any state
/// action, per the provider's delivery contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    /// Checkout session completed successfully.
    CheckoutSessionCompleted,
    /// Customer subscription was created.
    SubscriptionCreated,
    /// Customer subscription was updated.
    SubscriptionUpdated,
    /// Customer subscription was deleted.
    SubscriptionDeleted,
    /// Invoice payment succeeded.
    InvoicePaymentSucceeded,
    /// Invoice payment failed.
    InvoicePaymentFailed,
    /// Unknown or unhandled event type.
    Unknown,
}

impl StripeEventType {
    /// Parse event type from the wire string.
    pub fn from_type_str(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            _ => Self::Unknown,
        }
    }

    /// Convert to the Stripe event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::SubscriptionCreated => "customer.subscription.created",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::Unknown => "unknown",
        }
    }
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: 1704067200,
            object: serde_json::json!({}),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
                previous_attributes: None,
            },
            livemode: self.livemode,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_minimal_event() {
        let json = r#"{
            "id": "evt_1234567890",
            "type": "checkout.session.completed",
            "created": 1704067200,
            "data": {
                "object": {}
            },
            "livemode": false,
            "api_version": "2023-10-16"
        }"#;

        let event: StripeEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "evt_1234567890");
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.created, 1704067200);
        assert!(!event.is_live());
    }

    #[test]
    fn deserialize_event_without_api_version() {
        let json = r#"{
            "id": "evt_no_version",
            "type": "invoice.payment_failed",
            "created": 1704067200,
            "data": { "object": {} },
            "livemode": true
        }"#;

        let event: StripeEvent = serde_json::from_str(json).unwrap();
        assert!(event.api_version.is_none());
        assert!(event.is_live());
    }

    #[test]
    fn deserialize_event_with_previous_attributes() {
        let json = r#"{
            "id": "evt_update_123",
            "type": "customer.subscription.updated",
            "created": 1704067200,
            "data": {
                "object": {"status": "active"},
                "previous_attributes": {"status": "past_due"}
            },
            "livemode": true,
            "api_version": "2023-10-16"
        }"#;

        let event: StripeEvent = serde_json::from_str(json).unwrap();
        let prev = event.data.previous_attributes.unwrap();
        assert_eq!(prev["status"], "past_due");
    }

    #[test]
    fn parsed_type_covers_all_recognized_events() {
        let cases = [
            (
                "checkout.session.completed",
                StripeEventType::CheckoutSessionCompleted,
            ),
            (
                "customer.subscription.created",
                StripeEventType::SubscriptionCreated,
            ),
            (
                "customer.subscription.updated",
                StripeEventType::SubscriptionUpdated,
            ),
            (
                "customer.subscription.deleted",
                StripeEventType::SubscriptionDeleted,
            ),
            (
                "invoice.payment_succeeded",
                StripeEventType::InvoicePaymentSucceeded,
            ),
            (
                "invoice.payment_failed",
                StripeEventType::InvoicePaymentFailed,
            ),
        ];

        for (wire, expected) in cases {
            let event = StripeEventBuilder::new().event_type(wire).build();
            assert_eq!(event.parsed_type(), expected);
        }
    }

    #[test]
    fn builder_overrides_apply() {
        let event = StripeEventBuilder::new()
            .id("evt_custom")
            .event_type("invoice.payment_failed")
            .livemode(true)
            .build();

        assert_eq!(event.id, "evt_custom");
        assert_eq!(event.parsed_type(), StripeEventType::InvoicePaymentFailed);
        assert!(event.is_live());
    }

    #[test]
    fn unrecognized_type_parses_to_unknown() {
        assert_eq!(
            StripeEventType::from_type_str("some.unrecognized.type"),
            StripeEventType::Unknown
        );
        assert_eq!(
            StripeEventType::from_type_str("customer.subscription.paused"),
            StripeEventType::Unknown
        );
    }

    #[test]
    fn event_type_as_str_roundtrip() {
        let types = [
            StripeEventType::CheckoutSessionCompleted,
            StripeEventType::SubscriptionCreated,
            StripeEventType::SubscriptionUpdated,
            StripeEventType::SubscriptionDeleted,
            StripeEventType::InvoicePaymentSucceeded,
            StripeEventType::InvoicePaymentFailed,
        ];

        for event_type in types {
            assert_eq!(StripeEventType::from_type_str(event_type.as_str()), event_type);
        }
    }
}
