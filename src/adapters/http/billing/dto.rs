//! Request and response DTOs for the billing API.

use serde::{Deserialize, Serialize};

use crate::domain::billing::{PlanType, SubscriptionRecord};
use crate::domain::foundation::Timestamp;

/// Acknowledgement body returned to the payment provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    /// The standard success acknowledgement.
    pub fn received() -> Self {
        Self { received: true }
    }
}

/// POST /api/billing/checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan_type: PlanType,
    pub email: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// POST /api/billing/checkout response body.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

/// GET /api/billing/portal response body.
#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub portal_url: String,
}

/// GET /api/billing/subscription response body.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub subscription: Option<SubscriptionView>,
}

/// Client-facing view of a subscription record.
#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    pub status: Option<String>,
    pub plan: Option<PlanType>,
    pub subscription_id: Option<String>,
    pub customer_id: Option<String>,
    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl From<SubscriptionRecord> for SubscriptionView {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            status: record.status.map(|s| s.as_str().to_string()),
            plan: record.plan,
            subscription_id: record.subscription_id,
            customer_id: record.customer_id,
            current_period_start: record.current_period_start,
            current_period_end: record.current_period_end,
            cancelled_at: record.cancelled_at,
            updated_at: record.updated_at,
        }
    }
}

/// Standard error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{SubscriptionPatch, SubscriptionStatus};
    use crate::domain::foundation::UserId;

    #[test]
    fn webhook_ack_serializes_to_received_true() {
        let json = serde_json::to_string(&WebhookAck::received()).unwrap();
        assert_eq!(json, r#"{"received":true}"#);
    }

    #[test]
    fn checkout_request_deserializes() {
        let json = r#"{
            "plan_type": "monthly",
            "email": "student@example.com",
            "success_url": "https://app.example.com/success",
            "cancel_url": "https://app.example.com/cancel"
        }"#;

        let request: CheckoutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.plan_type, PlanType::Monthly);
        assert_eq!(request.email, "student@example.com");
    }

    #[test]
    fn checkout_request_rejects_unknown_plan() {
        let json = r#"{
            "plan_type": "weekly",
            "email": "x@example.com",
            "success_url": "a",
            "cancel_url": "b"
        }"#;

        assert!(serde_json::from_str::<CheckoutRequest>(json).is_err());
    }

    #[test]
    fn subscription_view_maps_record_fields() {
        let mut record = SubscriptionRecord::new(UserId::new("u1").unwrap(), Timestamp::now());
        record.apply(
            &SubscriptionPatch {
                status: Some(SubscriptionStatus::PastDue),
                subscription_id: Some("sub_1".to_string()),
                ..Default::default()
            },
            Timestamp::now(),
        );

        let view = SubscriptionView::from(record);
        assert_eq!(view.status.as_deref(), Some("past_due"));
        assert_eq!(view.subscription_id.as_deref(), Some("sub_1"));
        assert!(view.plan.is_none());
    }

    #[test]
    fn error_response_shape() {
        let response = ErrorResponse::new("SOME_CODE", "something happened");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"]["code"], "SOME_CODE");
        assert_eq!(json["error"]["message"], "something happened");
    }
}
