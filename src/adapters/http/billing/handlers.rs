//! HTTP handlers for the billing endpoints.
//!
//! These connect axum routes to the application layer command handlers.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::handlers::billing::{
    CreateCheckoutCommand, CreateCheckoutHandler, CreatePortalCommand, CreatePortalError,
    CreatePortalHandler, ProcessWebhookCommand, ProcessWebhookHandler, WebhookOutcome,
};
use crate::domain::billing::StripeWebhookVerifier;
use crate::domain::foundation::UserId;
use crate::ports::{PaymentError, PaymentProvider, StoreError, SubscriptionStore};

use super::dto::{
    CheckoutRequest, CheckoutResponse, ErrorResponse, PortalResponse, SubscriptionResponse,
    SubscriptionView, WebhookAck,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all billing dependencies.
///
/// Cloned per request; dependencies are Arc-wrapped and injected once at
/// startup rather than constructed at module load.
#[derive(Clone)]
pub struct BillingAppState {
    pub subscription_store: Arc<dyn SubscriptionStore>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub webhook_verifier: StripeWebhookVerifier,
    /// Return URL handed to the billing portal.
    pub portal_return_url: String,
}

impl BillingAppState {
    /// Create handlers on demand from the shared state.
    pub fn process_webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.webhook_verifier.clone(),
            self.subscription_store.clone(),
        )
    }

    pub fn create_checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(self.payment_provider.clone())
    }

    pub fn create_portal_handler(&self) -> CreatePortalHandler {
        CreatePortalHandler::new(
            self.subscription_store.clone(),
            self.payment_provider.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context (would come from auth middleware in production)
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from the request.
///
/// In production this would be populated from a session/JWT by auth
/// middleware. For development an `X-User-Id` header stands in.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user_id = parts
                .headers
                .get("X-User-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| UserId::new(s).ok())
                .ok_or(AuthenticationRequired)?;

            Ok(AuthenticatedUser { user_id })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoint
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe - Handle Stripe webhook events
///
/// Response contract: 200 `{"received": true}` for every successfully
/// resolved event (including acknowledged no-ops), 400 when the signature or
/// envelope is invalid, 500 when the record store fails (triggers provider
/// redelivery).
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let signature = match headers.get("Stripe-Signature").and_then(|v| v.to_str().ok()) {
        Some(signature) => signature.to_string(),
        None => {
            let error = ErrorResponse::new(
                "MISSING_SIGNATURE",
                "Missing Stripe-Signature header",
            );
            return (StatusCode::BAD_REQUEST, Json(error)).into_response();
        }
    };

    let handler = state.process_webhook_handler();
    let cmd = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    match handler.handle(cmd).await {
        Ok(outcome) => {
            if let WebhookOutcome::Applied { user_id } = &outcome {
                tracing::debug!(user_id = %user_id, "webhook applied");
            }
            (StatusCode::OK, Json(WebhookAck::received())).into_response()
        }
        Err(e) => {
            let error = ErrorResponse::new("WEBHOOK_ERROR", e.to_string());
            (e.status_code(), Json(error)).into_response()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Billing Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/billing/subscription - Current user's subscription record
pub async fn get_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    let record = state
        .subscription_store
        .find_by_user_id(&user.user_id)
        .await?;

    let response = SubscriptionResponse {
        subscription: record.map(SubscriptionView::from),
    };

    Ok(Json(response))
}

/// POST /api/billing/checkout - Start a paid checkout flow
pub async fn create_checkout(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.create_checkout_handler();
    let cmd = CreateCheckoutCommand {
        user_id: user.user_id,
        email: request.email,
        plan: request.plan_type,
        success_url: request.success_url,
        cancel_url: request.cancel_url,
    };

    let result = handler.handle(cmd).await?;

    let response = CheckoutResponse {
        checkout_url: result.checkout_url,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/billing/portal - Get a Stripe billing portal URL
pub async fn get_portal_url(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.create_portal_handler();
    let cmd = CreatePortalCommand {
        user_id: user.user_id,
        return_url: state.portal_return_url.clone(),
    };

    let session = handler.handle(cmd).await?;

    let response = PortalResponse {
        portal_url: session.url,
    };

    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type converting application errors to HTTP responses.
#[derive(Debug)]
pub enum BillingApiError {
    NoSubscription,
    NoCustomer,
    Store(StoreError),
    Payment(PaymentError),
}

impl From<StoreError> for BillingApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<PaymentError> for BillingApiError {
    fn from(err: PaymentError) -> Self {
        Self::Payment(err)
    }
}

impl From<CreatePortalError> for BillingApiError {
    fn from(err: CreatePortalError) -> Self {
        match err {
            CreatePortalError::NoSubscription => Self::NoSubscription,
            CreatePortalError::NoCustomer => Self::NoCustomer,
            CreatePortalError::Store(e) => Self::Store(e),
            CreatePortalError::Payment(e) => Self::Payment(e),
        }
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            BillingApiError::NoSubscription => (
                StatusCode::NOT_FOUND,
                "SUBSCRIPTION_NOT_FOUND",
                "No subscription record for user".to_string(),
            ),
            BillingApiError::NoCustomer => (
                StatusCode::BAD_REQUEST,
                "NO_BILLING_CUSTOMER",
                "No billing customer associated with user".to_string(),
            ),
            BillingApiError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                e.to_string(),
            ),
            BillingApiError::Payment(e) => (
                StatusCode::BAD_GATEWAY,
                "PAYMENT_PROVIDER_ERROR",
                e.to_string(),
            ),
        };

        let body = ErrorResponse::new(code, message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::domain::billing::compute_test_signature;
    use crate::ports::{CheckoutSession, CreateCheckoutRequest, PortalSession};
    use async_trait::async_trait;
    use serde_json::json;

    const TEST_SECRET: &str = "whsec_http_test";

    struct MockPaymentProvider;

    #[async_trait]
    impl PaymentProvider for MockPaymentProvider {
        async fn create_checkout_session(
            &self,
            _request: CreateCheckoutRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            Ok(CheckoutSession {
                id: "cs_test123".to_string(),
                url: "https://checkout.stripe.com/test".to_string(),
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

    fn test_state() -> BillingAppState {
        BillingAppState {
            subscription_store: Arc::new(InMemorySubscriptionStore::new()),
            payment_provider: Arc::new(MockPaymentProvider),
            webhook_verifier: StripeWebhookVerifier::new(TEST_SECRET),
            portal_return_url: "/account".to_string(),
        }
    }

    fn test_user() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: UserId::new("test-user-123").unwrap(),
        }
    }

    fn signed_headers_and_body(event_type: &str, object: serde_json::Value) -> (axum::http::HeaderMap, axum::body::Bytes) {
        let payload = json!({
            "id": "evt_http",
            "type": event_type,
            "created": chrono::Utc::now().timestamp(),
            "data": { "object": object },
            "livemode": false,
            "api_version": "2023-10-16"
        })
        .to_string();

        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, &payload);

        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            "Stripe-Signature",
            format!("t={},v1={}", timestamp, signature).parse().unwrap(),
        );

        (headers, axum::body::Bytes::from(payload))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook Handler Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn webhook_returns_200_for_valid_event() {
        let state = test_state();
        let (headers, body) = signed_headers_and_body(
            "checkout.session.completed",
            json!({
                "id": "cs_1",
                "customer": "cus_1",
                "subscription": "sub_1",
                "metadata": {"user_id": "u1", "plan_type": "monthly"}
            }),
        );

        let response = handle_stripe_webhook(State(state), headers, body).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn webhook_returns_200_for_unknown_event_type() {
        let state = test_state();
        let (headers, body) = signed_headers_and_body("some.unrecognized.type", json!({}));

        let response = handle_stripe_webhook(State(state), headers, body).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn webhook_returns_400_for_missing_signature_header() {
        let state = test_state();
        let headers = axum::http::HeaderMap::new();
        let body = axum::body::Bytes::from_static(b"{}");

        let response = handle_stripe_webhook(State(state), headers, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_returns_400_for_bad_signature() {
        let state = test_state();
        let mut headers = axum::http::HeaderMap::new();
        let timestamp = chrono::Utc::now().timestamp();
        headers.insert(
            "Stripe-Signature",
            format!("t={},v1={}", timestamp, "a".repeat(64))
                .parse()
                .unwrap(),
        );
        let body = axum::body::Bytes::from_static(b"{}");

        let response = handle_stripe_webhook(State(state), headers, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Billing Handler Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn get_subscription_returns_ok_without_record() {
        let result = get_subscription(State(test_state()), test_user()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn create_checkout_returns_created() {
        let request = CheckoutRequest {
            plan_type: crate::domain::billing::PlanType::Monthly,
            email: "student@example.com".to_string(),
            success_url: "https://app.example.com/ok".to_string(),
            cancel_url: "https://app.example.com/no".to_string(),
        };

        let result = create_checkout(State(test_state()), test_user(), Json(request)).await;
        let response = result.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn get_portal_url_fails_without_record() {
        let result = get_portal_url(State(test_state()), test_user()).await;
        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn api_error_maps_no_subscription_to_404() {
        let response = BillingApiError::NoSubscription.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_error_maps_no_customer_to_400() {
        let response = BillingApiError::NoCustomer.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_maps_store_to_500() {
        let response =
            BillingApiError::Store(StoreError::Unavailable("down".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn api_error_maps_payment_to_502() {
        let response =
            BillingApiError::Payment(PaymentError::provider("upstream sad")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
