//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_checkout, get_portal_url, get_subscription, handle_stripe_webhook, BillingAppState,
};

/// Create the billing API router.
///
/// # Routes (require authentication)
/// - `GET /subscription` - Current user's subscription record
/// - `POST /checkout` - Start a paid checkout flow
/// - `GET /portal` - Get a Stripe billing portal URL
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/subscription", get(get_subscription))
        .route("/checkout", post(create_checkout))
        .route("/portal", get(get_portal_url))
}

/// Create the webhook router.
///
/// Separate from the billing routes because webhooks carry no user
/// authentication; they are verified by signature instead.
///
/// # Routes
/// - `POST /stripe` - Handle Stripe webhooks
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Create the complete billing module router, suitable for mounting at
/// `/api`.
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .nest("/billing", billing_routes())
        .nest("/webhooks", webhook_routes())
}
