//! Webhook error types.
//!
//! Maps each failure class to the HTTP status the provider expects: 400 for
//! anything that will fail identically on redelivery (bad signature, garbage
//! payload), 500 for store failures where a redelivery can succeed.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is outside the acceptable window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse the signature header or the event envelope.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Record store access failed; the provider should redeliver.
    #[error("Store error: {0}")]
    Store(String),
}

impl WebhookError {
    /// Returns true if Stripe should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Store(_))
    }

    /// Maps the error to the HTTP status returned to the provider.
    ///
    /// - 4xx: client error, redelivery would fail identically
    /// - 5xx: server error, triggers provider redelivery
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            WebhookError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<crate::ports::StoreError> for WebhookError {
    fn from(err: crate::ports::StoreError) -> Self {
        WebhookError::Store(err.to_string())
    }
}
