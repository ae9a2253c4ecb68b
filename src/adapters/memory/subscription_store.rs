//! In-memory implementation of the SubscriptionStore port.
//!
//! Used for tests and local development. Records live in a Vec so duplicate
//! secondary-key matches resolve to the first record in insertion order,
//! keeping the "first in deterministic stored order" bound observable.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::{SubscriptionPatch, SubscriptionRecord};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{StoreError, SubscriptionStore};

/// In-memory subscription record store.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    records: RwLock<Vec<SubscriptionRecord>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| &r.user_id == user_id).cloned())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.subscription_id.as_deref() == Some(subscription_id))
            .cloned())
    }

    async fn merge_update(
        &self,
        user_id: &UserId,
        patch: SubscriptionPatch,
    ) -> Result<SubscriptionRecord, StoreError> {
        let now = Timestamp::now();
        let mut records = self.records.write().await;

        let index = match records.iter().position(|r| &r.user_id == user_id) {
            Some(index) => index,
            None => {
                records.push(SubscriptionRecord::new(user_id.clone(), now));
                records.len() - 1
            }
        };

        records[index].apply(&patch, now);
        Ok(records[index].clone())
    }
}
