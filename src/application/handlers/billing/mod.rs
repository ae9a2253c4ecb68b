//! Billing command handlers.

mod create_checkout;
mod create_portal;
mod process_webhook;

pub use create_checkout::{CreateCheckoutCommand, CreateCheckoutHandler, CreateCheckoutResult};
pub use create_portal::{CreatePortalCommand, CreatePortalError, CreatePortalHandler};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, WebhookOutcome};
