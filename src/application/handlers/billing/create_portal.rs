//! CreatePortalHandler - Command handler for the billing portal.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::UserId;
use crate::ports::{PaymentError, PaymentProvider, PortalSession, StoreError, SubscriptionStore};

/// Command to create a billing portal session for a user.
#[derive(Debug, Clone)]
pub struct CreatePortalCommand {
    pub user_id: UserId,
    pub return_url: String,
}

/// Errors from portal session creation.
#[derive(Debug, Error)]
pub enum CreatePortalError {
    /// The user has no subscription record at all.
    #[error("No subscription record for user")]
    NoSubscription,

    /// The record exists but has never been bound to a billing customer.
    #[error("No billing customer associated with user")]
    NoCustomer,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// Handler resolving a user's billing customer and opening the portal.
pub struct CreatePortalHandler {
    store: Arc<dyn SubscriptionStore>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CreatePortalHandler {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            store,
            payment_provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePortalCommand,
    ) -> Result<PortalSession, CreatePortalError> {
        let record = self
            .store
            .find_by_user_id(&cmd.user_id)
            .await?
            .ok_or(CreatePortalError::NoSubscription)?;

        let customer_id = record.customer_id.ok_or(CreatePortalError::NoCustomer)?;

        let session = self
            .payment_provider
            .create_portal_session(&customer_id, &cmd.return_url)
            .await?;

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{SubscriptionPatch, SubscriptionRecord};
    use crate::domain::foundation::Timestamp;
    use crate::ports::{CheckoutSession, CreateCheckoutRequest};
    use async_trait::async_trait;

    struct StubStore {
        record: Option<SubscriptionRecord>,
    }

    #[async_trait]
    impl SubscriptionStore for StubStore {
        async fn find_by_user_id(
            &self,
            _user_id: &UserId,
        ) -> Result<Option<SubscriptionRecord>, StoreError> {
            Ok(self.record.clone())
        }

        async fn find_by_customer_id(
            &self,
            _customer_id: &str,
        ) -> Result<Option<SubscriptionRecord>, StoreError> {
            Ok(None)
        }

        async fn find_by_subscription_id(
            &self,
            _subscription_id: &str,
        ) -> Result<Option<SubscriptionRecord>, StoreError> {
            Ok(None)
        }

        async fn merge_update(
            &self,
            _user_id: &UserId,
            _patch: SubscriptionPatch,
        ) -> Result<SubscriptionRecord, StoreError> {
            Err(StoreError::Query("not used".to_string()))
        }
    }

    struct StubProvider;

    #[async_trait]
    impl PaymentProvider for StubProvider {
        async fn create_checkout_session(
            &self,
            _request: CreateCheckoutRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            Err(PaymentError::provider("not used"))
        }

        async fn create_portal_session(
            &self,
            customer_id: &str,
            _return_url: &str,
        ) -> Result<PortalSession, PaymentError> {
            Ok(PortalSession {
                id: "bps_1".to_string(),
                url: format!("https://billing.stripe.com/{}", customer_id),
            })
        }
    }

    fn command() -> CreatePortalCommand {
        CreatePortalCommand {
            user_id: UserId::new("u1").unwrap(),
            return_url: "/account".to_string(),
        }
    }

    fn bound_record() -> SubscriptionRecord {
        let mut record =
            SubscriptionRecord::new(UserId::new("u1").unwrap(), Timestamp::now());
        record.apply(
            &SubscriptionPatch {
                customer_id: Some("cus_1".to_string()),
                ..Default::default()
            },
            Timestamp::now(),
        );
        record
    }

    #[tokio::test]
    async fn opens_portal_for_bound_customer() {
        let handler = CreatePortalHandler::new(
            Arc::new(StubStore {
                record: Some(bound_record()),
            }),
            Arc::new(StubProvider),
        );

        let session = handler.handle(command()).await.unwrap();
        assert_eq!(session.url, "https://billing.stripe.com/cus_1");
    }

    #[tokio::test]
    async fn fails_without_subscription_record() {
        let handler = CreatePortalHandler::new(
            Arc::new(StubStore { record: None }),
            Arc::new(StubProvider),
        );

        let result = handler.handle(command()).await;
        assert!(matches!(result, Err(CreatePortalError::NoSubscription)));
    }

    #[tokio::test]
    async fn fails_when_record_has_no_customer() {
        let record = SubscriptionRecord::new(UserId::new("u1").unwrap(), Timestamp::now());
        let handler = CreatePortalHandler::new(
            Arc::new(StubStore {
                record: Some(record),
            }),
            Arc::new(StubProvider),
        );

        let result = handler.handle(command()).await;
        assert!(matches!(result, Err(CreatePortalError::NoCustomer)));
    }
}
