use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderId, PaymentDetails, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for OrderStoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        OrderStoreError::DatabaseError(format!("Migration error: {e}"))
    }
}

/// A request to move an order into `target`.
///
/// The store applies the change only if the order's current status is one of `target.predecessors()`. Optional
/// payment and tracking details are written in the same statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub target: OrderStatusType,
    pub payment: Option<PaymentDetails>,
    pub tracking_code: Option<String>,
}

impl StatusTransition {
    pub fn to(target: OrderStatusType) -> Self {
        Self { target, payment: None, tracking_code: None }
    }

    pub fn with_payment(mut self, payment: PaymentDetails) -> Self {
        self.payment = Some(payment);
        self
    }

    pub fn with_tracking_code<S: Into<String>>(mut self, code: S) -> Self {
        self.tracking_code = Some(code.into());
        self
    }
}

/// The order store.
///
/// Every write is a single-row conditional update. Implementations must report whether the row was actually
/// changed; that answer is the only thing callers use to decide whether side effects should run. No in-process
/// locking is involved.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order in `AWAITING_PAYMENT` and returns it with its assigned id.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    async fn fetch_order_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError>;

    async fn fetch_order_by_carrier_shipment_id(&self, shipment_id: &str) -> Result<Option<Order>, OrderStoreError>;

    /// The most recent order matching both the CPF (digits only) and email (case-insensitive).
    async fn fetch_order_by_cpf_and_email(&self, cpf: &str, email: &str) -> Result<Option<Order>, OrderStoreError>;

    async fn fetch_order_by_tracking_code_and_email(
        &self,
        tracking_code: &str,
        email: &str,
    ) -> Result<Option<Order>, OrderStoreError>;

    /// Orders in an expirable status whose payment window closed strictly before `now`.
    async fn fetch_expired_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>, OrderStoreError>;

    async fn set_checkout_session_id(&self, id: OrderId, session_id: &str) -> Result<(), OrderStoreError>;

    /// Applies `transition` as a compare-and-swap on the status column.
    ///
    /// Returns `true` if exactly this call moved the order, and `false` if the order was not in one of the
    /// predecessor statuses (including the case where it does not exist).
    async fn transition_status(&self, id: OrderId, transition: &StatusTransition) -> Result<bool, OrderStoreError>;

    /// Records the carrier's shipment id. Only writes if no shipment id has been stored yet.
    ///
    /// Returns `true` if the id was written.
    async fn set_carrier_shipment_id(&self, id: OrderId, shipment_id: &str) -> Result<bool, OrderStoreError>;
}
