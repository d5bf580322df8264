use chrono::{DateTime, Utc};
use ogw_common::{major_units, Cents};
use serde::{Deserialize, Serialize};

use crate::db_types::{Customer, DeliveryAddress, LineItem, Order, OrderId, OrderStatusType, ShippingOption};

/// A cart submitted by the storefront at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<LineItem>,
    pub customer: Customer,
    pub address: DeliveryAddress,
    pub shipping: ShippingOption,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub session_id: String,
    pub redirect_url: String,
}

/// The two ways a customer can find their order. The email must match in both cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LookupQuery {
    ByTrackingCode { tracking_code: String, email: String },
    ByCpf { cpf: String, email: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSummary {
    pub name: String,
    #[serde(with = "major_units")]
    pub price: Cents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_days: Option<u32>,
}

/// What a customer is allowed to see about their order. Contact details and gateway identifiers are left out and
/// card digits are masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub address: DeliveryAddress,
    pub items: Vec<LineItem>,
    pub shipping: ShippingSummary,
    #[serde(with = "major_units")]
    pub items_subtotal: Cents,
    #[serde(with = "major_units")]
    pub total_price: Cents,
    pub payment_method: Option<String>,
    pub card: Option<String>,
    pub tracking_code: Option<String>,
}

pub fn mask_card(last_four: &str) -> String {
    format!("**** **** **** {last_four}")
}

impl From<Order> for OrderSnapshot {
    fn from(order: Order) -> Self {
        let items_subtotal = order.items_subtotal();
        let ShippingOption { name, price, delivery_days, .. } = order.shipping.0;
        Self {
            order_id: order.id,
            status: order.status,
            created_at: order.created_at,
            customer_name: order.customer.name,
            address: order.address,
            items: order.items.0,
            shipping: ShippingSummary { name, price, delivery_days },
            items_subtotal,
            total_price: order.total_price,
            payment_method: order.payment_method,
            card: order.card_last_four.as_deref().map(mask_card),
            tracking_code: order.tracking_code,
        }
    }
}
