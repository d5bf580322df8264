use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Order, OrderId};

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway could not be reached. {0}")]
    Unavailable(String),
    #[error("The payment gateway rejected the request. Status {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("Payment {0} is not known to the gateway")]
    PaymentNotFound(String),
    #[error("Could not understand the payment gateway response. {0}")]
    InvalidResponse(String),
}

/// The gateway's status for a payment. Only `Approved` counts as paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Approved,
    Pending,
    InProcess,
    Authorized,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    #[serde(untagged)]
    Other(String),
}

impl PaymentStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, PaymentStatus::Approved)
    }
}

impl From<&str> for PaymentStatus {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "approved" => Self::Approved,
            "pending" => Self::Pending,
            "in_process" => Self::InProcess,
            "authorized" => Self::Authorized,
            "rejected" => Self::Rejected,
            "cancelled" => Self::Cancelled,
            "refunded" => Self::Refunded,
            "charged_back" => Self::ChargedBack,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Approved => "approved",
            PaymentStatus::Pending => "pending",
            PaymentStatus::InProcess => "in_process",
            PaymentStatus::Authorized => "authorized",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::ChargedBack => "charged_back",
            PaymentStatus::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

/// The authoritative view of a payment, as fetched from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub method: Option<String>,
    pub card_last_four: Option<String>,
    /// The order id that was attached to the checkout session
    pub external_reference: Option<String>,
}

impl PaymentRecord {
    /// The order this payment is for, if the external reference is an integer order id.
    pub fn order_id(&self) -> Option<OrderId> {
        self.external_reference.as_deref().and_then(|r| r.trim().parse::<i64>().ok()).map(OrderId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    /// Where the storefront should send the customer to pay
    pub redirect_url: String,
}

/// Read access to payments and creation of checkout sessions at the payment provider.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentRecord, GatewayError>;

    /// Opens a hosted checkout for `order`. The order id is used as the external reference and the session must
    /// stop accepting payment at `expires_at`.
    async fn create_checkout_session(
        &self,
        order: &Order,
        expires_at: DateTime<Utc>,
    ) -> Result<CheckoutSession, GatewayError>;
}
