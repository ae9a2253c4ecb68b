//! Subscription record and its field-level merge semantics.
//!
//! One record exists per application user. Webhook handlers never replace a
//! record wholesale: each event produces a [`SubscriptionPatch`] naming only
//! the fields it owns, and the store applies it as a partial merge. Two events
//! touching disjoint fields therefore cannot clobber each other, and
//! redelivered events converge to the same state.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::plan::PlanType;
use super::status::SubscriptionStatus;

/// Persisted view of a user's subscription state.
///
/// Created implicitly on the first checkout-completed write for a user and
/// never deleted; cancellation is a status value, not a record removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Owning user; at most one record per user.
    pub user_id: UserId,

    /// Current subscription status; unset before the first checkout.
    pub status: Option<SubscriptionStatus>,

    /// Billing plan recovered from checkout metadata.
    pub plan: Option<PlanType>,

    /// Provider subscription id; stable lookup key once set.
    pub subscription_id: Option<String>,

    /// Provider billing-customer id; stable lookup key once set.
    pub customer_id: Option<String>,

    /// Start of the active billing cycle.
    pub current_period_start: Option<Timestamp>,

    /// End of the active billing cycle.
    pub current_period_end: Option<Timestamp>,

    /// Most recent successful payment; overwritten on every occurrence.
    pub last_payment_at: Option<Timestamp>,

    /// Most recent failed payment; overwritten on every occurrence.
    pub last_payment_failed_at: Option<Timestamp>,

    /// When the subscription was cancelled.
    pub cancelled_at: Option<Timestamp>,

    /// Set by the store on every mutation.
    pub updated_at: Timestamp,
}

impl SubscriptionRecord {
    /// Creates an empty record for a user.
    pub fn new(user_id: UserId, now: Timestamp) -> Self {
        Self {
            user_id,
            status: None,
            plan: None,
            subscription_id: None,
            customer_id: None,
            current_period_start: None,
            current_period_end: None,
            last_payment_at: None,
            last_payment_failed_at: None,
            cancelled_at: None,
            updated_at: now,
        }
    }

    /// Applies a patch as a field-level merge.
    ///
    /// Only fields the patch names are overwritten; everything else keeps its
    /// prior value. `updated_at` is bumped unconditionally.
    pub fn apply(&mut self, patch: &SubscriptionPatch, now: Timestamp) {
        if let Some(status) = patch.status {
            self.status = Some(status);
        }
        if let Some(plan) = patch.plan {
            self.plan = Some(plan);
        }
        if let Some(subscription_id) = &patch.subscription_id {
            self.subscription_id = Some(subscription_id.clone());
        }
        if let Some(customer_id) = &patch.customer_id {
            self.customer_id = Some(customer_id.clone());
        }
        if let Some(start) = patch.current_period_start {
            self.current_period_start = Some(start);
        }
        if let Some(end) = patch.current_period_end {
            self.current_period_end = Some(end);
        }
        if let Some(paid_at) = patch.last_payment_at {
            self.last_payment_at = Some(paid_at);
        }
        if let Some(failed_at) = patch.last_payment_failed_at {
            self.last_payment_failed_at = Some(failed_at);
        }
        if let Some(cancelled_at) = patch.cancelled_at {
            self.cancelled_at = Some(cancelled_at);
        }
        self.updated_at = now;
    }
}

/// Partial update of a subscription record.
///
/// `None` means "leave the field alone"; there is no way to clear a field
/// back to unset, matching the overwrite-only event semantics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPatch {
    pub status: Option<SubscriptionStatus>,
    pub plan: Option<PlanType>,
    pub subscription_id: Option<String>,
    pub customer_id: Option<String>,
    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,
    pub last_payment_at: Option<Timestamp>,
    pub last_payment_failed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
}

impl SubscriptionPatch {
    /// Whether the patch names any field at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
