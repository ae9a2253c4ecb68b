//! Ports - the traits the application core depends on.

mod payment_provider;
mod subscription_store;

pub use payment_provider::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode, PaymentProvider,
    PortalSession,
};
pub use subscription_store::{StoreError, SubscriptionStore};
