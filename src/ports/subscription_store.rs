//! Subscription record store port.
//!
//! The core consumes exactly four operations: point lookups on the three
//! keys a webhook event can carry, and an atomic field-level merge keyed by
//! user id. Storage engine semantics (durability, indexing) live behind the
//! adapter.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::billing::{SubscriptionPatch, SubscriptionRecord};
use crate::domain::foundation::UserId;

/// Errors from record store access.
///
/// Store failures must propagate to the webhook caller as a server error so
/// the provider redelivers the event.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    #[error("Record store query failed: {0}")]
    Query(String),
}

/// Port for subscription record persistence.
///
/// Implementations must ensure:
/// - at most one record per user id
/// - `merge_update` is an atomic partial merge on a single record: only the
///   fields the patch names are overwritten, and `updated_at` is
///   store-assigned on every mutation
/// - the first `merge_update` for a user creates the record
/// - lookups by customer or subscription id that match more than one record
///   (which the data model forbids, but storage cannot always prevent)
///   return the first in a deterministic stored order
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Find a record by its owning user id.
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, StoreError>;

    /// Find a record by provider customer id.
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, StoreError>;

    /// Find a record by provider subscription id.
    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, StoreError>;

    /// Merge a partial update into the user's record, creating it if absent.
    ///
    /// Returns the record as persisted after the merge.
    async fn merge_update(
        &self,
        user_id: &UserId,
        patch: SubscriptionPatch,
    ) -> Result<SubscriptionRecord, StoreError>;
}
