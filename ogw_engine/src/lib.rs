//! Order Gateway Engine
//!
//! The engine holds the order lifecycle of a storefront that takes payment through a hosted checkout, ships with a
//! carrier, and keeps customers informed by email. It is provider-agnostic: every external system is reached through
//! a trait in [`traits`].
//!
//! The library is divided into three main sections:
//! 1. The order store ([`mod@sqlite`]). A single `orders` table in SQLite. All writes are conditional updates, and
//!    the number of rows they change is what decides whether follow-up work happens.
//! 2. The public API ([`mod@ogw_api`]). Checkout, payment reconciliation, expiry, fulfilment and order lookup.
//! 3. Helpers ([`mod@helpers`]) for webhook signature verification and customer data validation.
pub mod db_types;
pub mod helpers;
mod ogw_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use ogw_api::{
    checkout_api::{CheckoutApi, DEFAULT_PAYMENT_WINDOW_MINUTES},
    errors::{CheckoutError, FulfillmentError, LookupError, ReconciliationError},
    expiry_api::ExpiryApi,
    fulfillment_api::FulfillmentApi,
    lookup_api::LookupApi,
    order_objects,
    reconciliation_api::{target_status, ReconciliationApi},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    BookingError,
    CarrierBooking,
    GatewayError,
    NotificationError,
    NotificationType,
    Notifier,
    OrderManagement,
    OrderStoreError,
    PaymentGateway,
};
