use thiserror::Error;

use crate::{
    db_types::OrderId,
    helpers::ValidationError,
    traits::{GatewayError, OrderStoreError},
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Could not store the order. {0}")]
    Store(#[from] OrderStoreError),
    #[error("Order {order_id} was stored, but the checkout session could not be created. {source}")]
    Gateway { order_id: OrderId, source: GatewayError },
}

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Could not fetch payment {payment_id} from the gateway. {source}")]
    Gateway { payment_id: String, source: GatewayError },
    #[error("Order store error. {0}")]
    Store(#[from] OrderStoreError),
}

#[derive(Debug, Clone, Error)]
pub enum FulfillmentError {
    #[error("No order has carrier shipment id {0}")]
    UnknownShipment(String),
    #[error("The tracking code is empty")]
    EmptyTrackingCode,
    #[error("Order store error. {0}")]
    Store(#[from] OrderStoreError),
}

#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// Covers both "no such order" and "the email does not match", so callers cannot discover which orders exist.
    #[error("Order not found")]
    NotFound,
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Order store error. {0}")]
    Store(#[from] OrderStoreError),
}
