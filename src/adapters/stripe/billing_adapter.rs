//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` trait against the Stripe REST API for
//! hosted checkout and billing-portal sessions. Webhook signature
//! verification lives in the domain layer
//! ([`crate::domain::billing::StripeWebhookVerifier`]); this adapter only
//! makes outbound calls.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::PaymentConfig;
use crate::domain::billing::PlanType;
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentProvider, PortalSession,
};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Price ID charged for the monthly plan.
    monthly_price_id: String,

    /// Price ID charged for the yearly plan.
    yearly_price_id: String,

    /// Base URL for the Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(
        api_key: impl Into<String>,
        monthly_price_id: impl Into<String>,
        yearly_price_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            monthly_price_id: monthly_price_id.into(),
            yearly_price_id: yearly_price_id.into(),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Build from the application's payment configuration.
    ///
    /// Fails if a plan price id is not configured, since checkout creation
    /// would be impossible.
    pub fn from_payment_config(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let monthly = config
            .stripe_monthly_price_id
            .clone()
            .ok_or_else(|| PaymentError::configuration("STRIPE_MONTHLY_PRICE_ID not set"))?;
        let yearly = config
            .stripe_yearly_price_id
            .clone()
            .ok_or_else(|| PaymentError::configuration("STRIPE_YEARLY_PRICE_ID not set"))?;

        Ok(Self::new(config.stripe_api_key.clone(), monthly, yearly))
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    fn price_id(&self, plan: PlanType) -> &str {
        match plan {
            PlanType::Monthly => &self.monthly_price_id,
            PlanType::Yearly => &self.yearly_price_id,
        }
    }
}

/// Stripe payment provider adapter.
pub struct StripeBillingAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeBillingAdapter {
    /// Create a new adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn check_response(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> Result<reqwest::Response, PaymentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(operation, status = %status, error = %error_text, "Stripe API call failed");

        let err = match status {
            reqwest::StatusCode::UNAUTHORIZED => PaymentError::new(
                crate::ports::PaymentErrorCode::AuthenticationError,
                "Stripe rejected the API key",
            ),
            reqwest::StatusCode::TOO_MANY_REQUESTS => PaymentError::new(
                crate::ports::PaymentErrorCode::RateLimitExceeded,
                "Stripe rate limit exceeded",
            ),
            _ => PaymentError::provider(format!("Stripe API error: {}", error_text)),
        };

        Err(err)
    }
}

/// Checkout Session as returned by the Stripe API.
#[derive(Debug, Deserialize)]
struct StripeCheckoutSessionResponse {
    id: String,
    url: Option<String>,
    #[serde(default)]
    expires_at: i64,
}

/// Billing Portal Session as returned by the Stripe API.
#[derive(Debug, Deserialize)]
struct StripePortalSessionResponse {
    id: String,
    url: String,
}

#[async_trait]
impl PaymentProvider for StripeBillingAdapter {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);
        let price_id = self.config.price_id(request.plan).to_string();

        // user_id and plan_type must round-trip verbatim through checkout
        // metadata; the webhook handler depends on them.
        let params = vec![
            ("mode", "subscription".to_string()),
            ("customer_email", request.email.clone()),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            ("metadata[user_id]", request.user_id.to_string()),
            ("metadata[plan_type]", request.plan.as_str().to_string()),
        ];

        let mut builder = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params);

        if let Some(idempotency_key) = &request.idempotency_key {
            builder = builder.header("Idempotency-Key", idempotency_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;
        let response = self.check_response(response, "create_checkout_session").await?;

        let session: StripeCheckoutSessionResponse = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        let checkout_url = session
            .url
            .ok_or_else(|| PaymentError::provider("Checkout session has no URL"))?;

        Ok(CheckoutSession {
            id: session.id,
            url: checkout_url,
            expires_at: session.expires_at,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        let url = format!("{}/v1/billing_portal/sessions", self.config.api_base_url);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&[("customer", customer_id), ("return_url", return_url)])
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;
        let response = self.check_response(response, "create_portal_session").await?;

        let session: StripePortalSessionResponse = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(PortalSession {
            id: session.id,
            url: session.url,
        })
    }
}
