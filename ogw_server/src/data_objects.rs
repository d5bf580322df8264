use std::fmt::Display;

use ogw_common::Secret;
use ogw_engine::{
    db_types::{LineItem, OrderId},
    traits::SweepResult,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//--------------------------------------      Payment webhooks      ----------------------------------------------------
/// The query string of a payment webhook call. Newer notifications use `type` and `data.id`; older ones use
/// `topic` and `id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookQuery {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub topic: Option<String>,
    #[serde(rename = "data.id")]
    pub data_id: Option<String>,
    pub id: Option<String>,
}

impl WebhookQuery {
    pub fn payment_id(&self) -> Option<&str> {
        self.data_id.as_deref().or(self.id.as_deref()).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn topic(&self) -> Option<&str> {
        self.event_type.as_deref().or(self.topic.as_deref()).map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Payment { payment_id: String },
    /// Merchant orders, chargebacks and the like. Acknowledged and ignored.
    Other { topic: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookDecodeError {
    #[error("The webhook call does not say what changed")]
    MissingTopic,
    #[error("The payment webhook call has no payment id")]
    MissingPaymentId,
}

impl TryFrom<&WebhookQuery> for WebhookEvent {
    type Error = WebhookDecodeError;

    fn try_from(query: &WebhookQuery) -> Result<Self, Self::Error> {
        let topic = query.topic().ok_or(WebhookDecodeError::MissingTopic)?;
        if topic != "payment" {
            return Ok(WebhookEvent::Other { topic: topic.to_string() });
        }
        let payment_id = query.payment_id().ok_or(WebhookDecodeError::MissingPaymentId)?;
        Ok(WebhookEvent::Payment { payment_id: payment_id.to_string() })
    }
}

//--------------------------------------      Carrier webhooks      ----------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierTrackingNotification {
    /// The carrier's shipment id
    #[serde(alias = "id")]
    pub resource_id: String,
    #[serde(default, alias = "tracking")]
    pub tracking_code: Option<String>,
}

//--------------------------------------        Expiry sweep        ----------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CronQuery {
    pub token: Option<String>,
}

/// The shared token that guards the sweep endpoint. An unset token lets every caller through.
#[derive(Debug, Clone, Default)]
pub struct CronToken(Option<Secret<String>>);

impl CronToken {
    pub fn new(token: Option<Secret<String>>) -> Self {
        Self(token.and_then(Secret::non_blank))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }

    pub fn authorizes(&self, supplied: Option<&str>) -> bool {
        match (&self.0, supplied) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(expected), Some(supplied)) => expected.reveal().as_bytes().ct_eq(supplied.as_bytes()).into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub expired: usize,
    pub order_ids: Vec<OrderId>,
    pub lost_races: usize,
    pub store_errors: usize,
    pub notification_failures: usize,
}

impl From<SweepResult> for SweepSummary {
    fn from(result: SweepResult) -> Self {
        Self {
            expired: result.expired_count(),
            order_ids: result.expired.iter().map(|o| o.id).collect(),
            lost_races: result.lost_races,
            store_errors: result.store_errors,
            notification_failures: result.notification_failures,
        }
    }
}

//--------------------------------------      Shipping quotes       ----------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingQuoteRequest {
    pub postal_code: String,
    pub items: Vec<LineItem>,
}
