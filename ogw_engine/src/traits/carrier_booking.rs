use thiserror::Error;

use crate::db_types::Order;

#[derive(Debug, Clone, Error)]
pub enum BookingError {
    #[error("The carrier could not be reached. {0}")]
    Unavailable(String),
    #[error("The carrier rejected the shipment. Status {status}. {body}")]
    Rejected { status: u16, body: String },
    #[error("Could not understand the carrier response. {0}")]
    InvalidResponse(String),
}

/// Books a shipment for a paid order with the carrier.
#[allow(async_fn_in_trait)]
pub trait CarrierBooking: Clone {
    /// Submits the shipment and returns the carrier's shipment id. Persisting the id is the caller's job.
    async fn book_shipment(&self, order: &Order) -> Result<String, BookingError>;
}
