//! Subscription plan types.

use serde::{Deserialize, Serialize};

/// Billing plan a user can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    /// Monthly recurring billing.
    Monthly,
    /// Yearly recurring billing.
    Yearly,
}

impl PlanType {
    /// Parse a plan type string as sent in checkout metadata.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }

    /// The metadata/storage representation of this plan.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}
