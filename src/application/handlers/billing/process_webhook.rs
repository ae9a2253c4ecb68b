//! ProcessWebhookHandler - Command handler for payment provider webhooks.
//!
//! Orchestrates verify -> reduce -> lookup -> merge. Every event runs
//! independently: there is no cross-event lock and no delivery dedup, so
//! correctness under the provider's at-least-once delivery rests on the
//! reducer's idempotent field-level merges.

use std::sync::Arc;

use crate::domain::billing::{
    reduce, LookupKey, StripeWebhookVerifier, SubscriptionRecord, WebhookError,
};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::SubscriptionStore;

/// Command to process a raw webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// Value of the Stripe-Signature header.
    pub signature: String,
}

/// How a verified event was resolved.
///
/// Every variant is acknowledged to the provider as success; only a
/// [`WebhookError`] propagates as a failure response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A record was updated.
    Applied { user_id: UserId },
    /// The event's lookup key matched no record; logged and acknowledged.
    NoMatchingRecord,
    /// The event lacked usable correlation data; logged and acknowledged.
    MissingCorrelation,
    /// Unrecognized event type; acknowledged with no state action.
    Ignored,
}

/// Handler for processing payment provider webhooks.
pub struct ProcessWebhookHandler {
    verifier: StripeWebhookVerifier,
    store: Arc<dyn SubscriptionStore>,
}

impl ProcessWebhookHandler {
    pub fn new(verifier: StripeWebhookVerifier, store: Arc<dyn SubscriptionStore>) -> Self {
        Self { verifier, store }
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<WebhookOutcome, WebhookError> {
        // 1. Authenticate before anything else. A forged or tampered payload
        //    never reaches a handler or the store.
        let event = self.verifier.verify_and_parse(&cmd.payload, &cmd.signature)?;

        // 2. Reduce the event to a lookup key and a field patch.
        let reduction = match reduce(&event, Timestamp::now()) {
            Ok(Some(reduction)) => reduction,
            Ok(None) => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "acknowledging unrecognized webhook event type"
                );
                return Ok(WebhookOutcome::Ignored);
            }
            Err(e) => {
                // The missing data will never appear on redelivery, so this
                // is acknowledged rather than failed.
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    error = %e,
                    "webhook event lacks usable correlation data"
                );
                return Ok(WebhookOutcome::MissingCorrelation);
            }
        };

        // 3. Locate the affected record.
        let existing = self.find_by_key(&reduction.key).await?;

        let user_id = match (existing, &reduction.key) {
            (Some(record), _) => record.user_id,
            // First checkout-completed write creates the record.
            (None, LookupKey::UserId(user_id)) => user_id.clone(),
            (None, key) => {
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    key = %key,
                    "no subscription record matches webhook event"
                );
                return Ok(WebhookOutcome::NoMatchingRecord);
            }
        };

        // 4. Merge. Store failures propagate so the provider redelivers.
        self.store.merge_update(&user_id, reduction.patch).await?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            user_id = %user_id,
            "subscription record updated from webhook event"
        );

        Ok(WebhookOutcome::Applied { user_id })
    }

    async fn find_by_key(
        &self,
        key: &LookupKey,
    ) -> Result<Option<SubscriptionRecord>, WebhookError> {
        let found = match key {
            LookupKey::UserId(user_id) => self.store.find_by_user_id(user_id).await?,
            LookupKey::CustomerId(customer_id) => {
                self.store.find_by_customer_id(customer_id).await?
            }
            LookupKey::SubscriptionId(subscription_id) => {
                self.store.find_by_subscription_id(subscription_id).await?
            }
        };
        Ok(found)
    }
}
