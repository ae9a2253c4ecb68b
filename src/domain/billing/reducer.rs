//! Subscription state reducer.
//!
//! Each recognized event type maps to a pure function of the event payload
//! producing a [`Reduction`]: which record to touch (by which key) and the
//! field-level patch to merge into it. Only the checkout-completed event
//! carries our own user id (injected as metadata at checkout creation);
//! every later lifecycle event is located by the provider-native customer or
//! subscription id bound during that first checkout.
//!
//! Reducers never look at the stored record: the event's own payload is the
//! source of truth for the fields it owns, so redelivered or out-of-order
//! events converge without staleness detection.

use thiserror::Error;

use crate::domain::foundation::{Timestamp, UserId};

use super::payloads::{decode_object, CheckoutSessionObject, InvoiceObject, SubscriptionObject};
use super::plan::PlanType;
use super::record::SubscriptionPatch;
use super::status::SubscriptionStatus;
use super::stripe_event::{StripeEvent, StripeEventType};

/// Key used to locate the affected subscription record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    /// Application user id, from checkout metadata.
    UserId(UserId),
    /// Provider billing-customer id.
    CustomerId(String),
    /// Provider subscription id.
    SubscriptionId(String),
}

impl std::fmt::Display for LookupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKey::UserId(id) => write!(f, "user_id={}", id),
            LookupKey::CustomerId(id) => write!(f, "customer_id={}", id),
            LookupKey::SubscriptionId(id) => write!(f, "subscription_id={}", id),
        }
    }
}

/// The state update an event reduces to.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    /// Which record to update.
    pub key: LookupKey,
    /// The fields to merge.
    pub patch: SubscriptionPatch,
}

/// Why an event could not be reduced to a state update.
///
/// None of these are fatal: the data will never appear on redelivery, so the
/// dispatcher logs and acknowledges instead of failing.
#[derive(Debug, Error)]
pub enum ReduceError {
    /// The event payload decoded but lacks a required metadata entry.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// The event's `data.object` does not match the expected schema.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// Reduce a verified event to a record update.
///
/// Returns `Ok(None)` for unrecognized event types, which are acknowledged
/// with no state action.
pub fn reduce(event: &StripeEvent, now: Timestamp) -> Result<Option<Reduction>, ReduceError> {
    match event.parsed_type() {
        StripeEventType::CheckoutSessionCompleted => reduce_checkout_completed(event).map(Some),
        StripeEventType::SubscriptionCreated => reduce_subscription_created(event).map(Some),
        StripeEventType::SubscriptionUpdated => reduce_subscription_updated(event).map(Some),
        StripeEventType::SubscriptionDeleted => reduce_subscription_deleted(event, now).map(Some),
        StripeEventType::InvoicePaymentSucceeded => reduce_payment_succeeded(event, now).map(Some),
        StripeEventType::InvoicePaymentFailed => reduce_payment_failed(event, now).map(Some),
        StripeEventType::Unknown => Ok(None),
    }
}

/// `checkout.session.completed`: the binding step.
///
/// Looked up by the `user_id` the checkout endpoint embedded in session
/// metadata; associates that user with the provider's customer and
/// subscription ids for all future lookups.
fn reduce_checkout_completed(event: &StripeEvent) -> Result<Reduction, ReduceError> {
    let session: CheckoutSessionObject = decode_payload(event)?;

    let user_id = session
        .metadata
        .get("user_id")
        .and_then(|s| UserId::new(s.clone()).ok())
        .ok_or(ReduceError::MissingMetadata("user_id"))?;

    let plan = session
        .metadata
        .get("plan_type")
        .and_then(|s| PlanType::parse(s));

    Ok(Reduction {
        key: LookupKey::UserId(user_id),
        patch: SubscriptionPatch {
            status: Some(SubscriptionStatus::Active),
            plan,
            subscription_id: session.subscription,
            customer_id: session.customer,
            ..Default::default()
        },
    })
}

/// `customer.subscription.created`: looked up by customer id.
fn reduce_subscription_created(event: &StripeEvent) -> Result<Reduction, ReduceError> {
    let sub: SubscriptionObject = decode_payload(event)?;

    Ok(Reduction {
        key: LookupKey::CustomerId(sub.customer),
        patch: SubscriptionPatch {
            status: SubscriptionStatus::from_provider(&sub.status),
            subscription_id: Some(sub.id),
            current_period_start: Timestamp::from_unix_secs(sub.current_period_start),
            current_period_end: Timestamp::from_unix_secs(sub.current_period_end),
            ..Default::default()
        },
    })
}

/// `customer.subscription.updated`: looked up by subscription id.
fn reduce_subscription_updated(event: &StripeEvent) -> Result<Reduction, ReduceError> {
    let sub: SubscriptionObject = decode_payload(event)?;

    Ok(Reduction {
        key: LookupKey::SubscriptionId(sub.id),
        patch: SubscriptionPatch {
            status: SubscriptionStatus::from_provider(&sub.status),
            current_period_start: Timestamp::from_unix_secs(sub.current_period_start),
            current_period_end: Timestamp::from_unix_secs(sub.current_period_end),
            ..Default::default()
        },
    })
}

/// `customer.subscription.deleted`: cancellation is a status value.
fn reduce_subscription_deleted(
    event: &StripeEvent,
    now: Timestamp,
) -> Result<Reduction, ReduceError> {
    let sub: SubscriptionObject = decode_payload(event)?;

    Ok(Reduction {
        key: LookupKey::SubscriptionId(sub.id),
        patch: SubscriptionPatch {
            status: Some(SubscriptionStatus::Cancelled),
            cancelled_at: Some(now),
            ..Default::default()
        },
    })
}

/// `invoice.payment_succeeded`: looked up by customer id.
fn reduce_payment_succeeded(event: &StripeEvent, now: Timestamp) -> Result<Reduction, ReduceError> {
    let invoice: InvoiceObject = decode_payload(event)?;

    Ok(Reduction {
        key: LookupKey::CustomerId(invoice.customer),
        patch: SubscriptionPatch {
            status: Some(SubscriptionStatus::Active),
            last_payment_at: Some(now),
            ..Default::default()
        },
    })
}

/// `invoice.payment_failed`: looked up by customer id.
fn reduce_payment_failed(event: &StripeEvent, now: Timestamp) -> Result<Reduction, ReduceError> {
    let invoice: InvoiceObject = decode_payload(event)?;

    Ok(Reduction {
        key: LookupKey::CustomerId(invoice.customer),
        patch: SubscriptionPatch {
            status: Some(SubscriptionStatus::PastDue),
            last_payment_failed_at: Some(now),
            ..Default::default()
        },
    })
}

fn decode_payload<T: serde::de::DeserializeOwned>(event: &StripeEvent) -> Result<T, ReduceError> {
    decode_object(event).map_err(|e| ReduceError::InvalidPayload(e.to_string()))
}
