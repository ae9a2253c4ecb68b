//! CreateCheckoutHandler - Command handler for starting a paid checkout.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::billing::PlanType;
use crate::domain::foundation::UserId;
use crate::ports::{CreateCheckoutRequest, PaymentError, PaymentProvider};

/// Command to create a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub user_id: UserId,
    pub email: String,
    pub plan: PlanType,
    pub success_url: String,
    pub cancel_url: String,
}

/// Result of checkout session creation.
#[derive(Debug, Clone)]
pub struct CreateCheckoutResult {
    /// URL the user is redirected to for payment.
    pub checkout_url: String,
}

/// Handler for creating checkout sessions.
///
/// Embeds `user_id` and `plan_type` verbatim in session metadata; the
/// checkout-completed webhook recovers them to bind the provider ids to the
/// user.
pub struct CreateCheckoutHandler {
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CreateCheckoutHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self { payment_provider }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<CreateCheckoutResult, PaymentError> {
        let request = CreateCheckoutRequest {
            user_id: cmd.user_id.clone(),
            email: cmd.email,
            plan: cmd.plan,
            success_url: cmd.success_url,
            cancel_url: cmd.cancel_url,
            idempotency_key: Some(Uuid::new_v4().to_string()),
        };

        let session = self.payment_provider.create_checkout_session(request).await?;

        tracing::info!(
            user_id = %cmd.user_id,
            plan = cmd.plan.as_str(),
            session_id = %session.id,
            "created checkout session"
        );

        Ok(CreateCheckoutResult {
            checkout_url: session.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{CheckoutSession, PortalSession};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingProvider {
        requests: Mutex<Vec<CreateCheckoutRequest>>,
    }

    impl RecordingProvider {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PaymentProvider for RecordingProvider {
        async fn create_checkout_session(
            &self,
            request: CreateCheckoutRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            self.requests.lock().unwrap().push(request);
            Ok(CheckoutSession {
                id: "cs_test123".to_string(),
                url: "https://checkout.stripe.com/cs_test123".to_string(),
                expires_at: 1704153600,
            })
        }

        async fn create_portal_session(
            &self,
            _customer_id: &str,
            _return_url: &str,
        ) -> Result<PortalSession, PaymentError> {
            Ok(PortalSession {
                id: "bps_test123".to_string(),
                url: "https://billing.stripe.com/test".to_string(),
            })
        }
    }

    fn command() -> CreateCheckoutCommand {
        CreateCheckoutCommand {
            user_id: UserId::new("u1").unwrap(),
            email: "student@example.com".to_string(),
            plan: PlanType::Monthly,
            success_url: "https://app.example.com/success".to_string(),
            cancel_url: "https://app.example.com/cancel".to_string(),
        }
    }

    #[tokio::test]
    async fn returns_checkout_url() {
        let provider = Arc::new(RecordingProvider::new());
        let handler = CreateCheckoutHandler::new(provider);

        let result = handler.handle(command()).await.unwrap();

        assert_eq!(result.checkout_url, "https://checkout.stripe.com/cs_test123");
    }

    #[tokio::test]
    async fn forwards_identity_and_plan_to_provider() {
        let provider = Arc::new(RecordingProvider::new());
        let handler = CreateCheckoutHandler::new(provider.clone());

        handler.handle(command()).await.unwrap();

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_id.as_str(), "u1");
        assert_eq!(requests[0].plan, PlanType::Monthly);
        assert_eq!(requests[0].email, "student@example.com");
    }

    #[tokio::test]
    async fn generates_fresh_idempotency_key_per_command() {
        let provider = Arc::new(RecordingProvider::new());
        let handler = CreateCheckoutHandler::new(provider.clone());

        handler.handle(command()).await.unwrap();
        handler.handle(command()).await.unwrap();

        let requests = provider.requests.lock().unwrap();
        let key1 = requests[0].idempotency_key.clone().unwrap();
        let key2 = requests[1].idempotency_key.clone().unwrap();
        assert_ne!(key1, key2);
    }
}
