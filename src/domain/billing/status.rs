//! Subscription status values.

use serde::{Deserialize, Serialize};

/// Status of a user's subscription record.
///
/// Transitions are driven exclusively by payment provider webhook events:
/// `(unset) -> Active -> PastDue -> Active -> ... -> Cancelled`. `Cancelled`
/// is terminal for webhook-driven updates, though a fresh checkout for the
/// same user overwrites the status back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is paid up and current.
    Active,
    /// A payment attempt failed; the provider is retrying.
    PastDue,
    /// The subscription has ended.
    Cancelled,
}

impl SubscriptionStatus {
    /// Map a provider status string into the closed status set.
    ///
    /// Returns `None` for provider states with no local equivalent
    /// (`incomplete`, `paused`, ...) so the stored status is left untouched.
    pub fn from_provider(s: &str) -> Option<Self> {
        match s {
            "active" | "trialing" => Some(Self::Active),
            "past_due" | "unpaid" => Some(Self::PastDue),
            "canceled" | "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// The storage representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this status grants access to paid features.
    pub fn has_access(&self) -> bool {
        matches!(self, Self::Active | Self::PastDue)
    }
}
