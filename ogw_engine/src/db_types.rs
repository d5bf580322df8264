use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use ogw_common::{major_units, Cents};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The order lifecycle.
///
/// ```text
///   AWAITING_PAYMENT ──► PAYMENT_PENDING ──► IN_PRODUCTION ──► SHIPPED
///          │  └──────────────────────────────────▲
///          └──────────┬─────────┘
///                     ▼
///             CANCELLED_EXPIRED
/// ```
///
/// Every move along this graph is made with a conditional update whose predicate is [`OrderStatusType::predecessors`]
/// of the target status, so the database decides which caller wins when several try the same transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order was created at checkout and the customer has not paid yet.
    AwaitingPayment,
    /// The gateway knows about a payment, but it has not been approved.
    PaymentPending,
    /// Payment was approved. The order is being prepared and no further payment event can change it.
    InProduction,
    /// The carrier has posted the package and a tracking code is available.
    Shipped,
    /// The payment window elapsed before the payment was approved.
    CancelledExpired,
}

impl OrderStatusType {
    /// The set of statuses an order must currently have for a transition *into* `self` to be applied.
    pub fn predecessors(&self) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match self {
            AwaitingPayment => &[],
            PaymentPending => &[AwaitingPayment],
            InProduction => &[AwaitingPayment, PaymentPending],
            Shipped => &[InProduction],
            CancelledExpired => &[AwaitingPayment, PaymentPending],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatusType) -> bool {
        target.predecessors().contains(self)
    }

    /// Statuses swept by the expiry job once the payment window has passed.
    pub fn expirable() -> &'static [OrderStatusType] {
        OrderStatusType::CancelledExpired.predecessors()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::AwaitingPayment => "AWAITING_PAYMENT",
            OrderStatusType::PaymentPending => "PAYMENT_PENDING",
            OrderStatusType::InProduction => "IN_PRODUCTION",
            OrderStatusType::Shipped => "SHIPPED",
            OrderStatusType::CancelledExpired => "CANCELLED_EXPIRED",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AWAITING_PAYMENT" => Ok(Self::AwaitingPayment),
            "PAYMENT_PENDING" => Ok(Self::PaymentPending),
            "IN_PRODUCTION" => Ok(Self::InProduction),
            "SHIPPED" => Ok(Self::Shipped),
            "CANCELLED_EXPIRED" => Ok(Self::CancelledExpired),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The store-assigned order number. It doubles as the gateway's external reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .trim_start_matches('#')
            .parse::<i64>()
            .map(Self)
            .map_err(|e| ConversionError(format!("{s} is not an order id. {e}")))
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------        LineItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The storefront's product (or variant) id
    pub id: String,
    pub title: String,
    pub quantity: u32,
    #[serde(with = "major_units")]
    pub unit_price: Cents,
}

impl LineItem {
    pub fn new<S: Into<String>>(id: S, title: S, quantity: u32, unit_price: Cents) -> Self {
        Self { id: id.into(), title: title.into(), quantity, unit_price }
    }

    /// Saturates on overflow. Checkout rejects carts where that could happen, see [`LineItem::checked_subtotal`].
    pub fn subtotal(&self) -> Cents {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }

    pub fn checked_subtotal(&self) -> Option<Cents> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

//--------------------------------------     ShippingOption    ---------------------------------------------------------
/// The carrier service the customer picked at checkout. Stored as a snapshot; later price changes at the carrier
/// do not affect the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingOption {
    /// The carrier's service identifier. Sent back to the carrier when booking.
    pub service_code: String,
    pub name: String,
    #[serde(with = "major_units")]
    pub price: Cents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_days: Option<u32>,
}

//--------------------------------------        Customer       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    #[sqlx(rename = "customer_name")]
    pub name: String,
    #[sqlx(rename = "customer_email")]
    pub email: String,
    /// The CPF, digits only
    #[sqlx(rename = "customer_cpf")]
    pub cpf: String,
    #[sqlx(rename = "customer_phone")]
    pub phone: String,
}

//--------------------------------------     DeliveryAddress   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DeliveryAddress {
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    /// Two-letter state code (UF)
    pub state: String,
    /// The CEP, digits only
    pub postal_code: String,
}

impl Display for DeliveryAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.street, self.number)?;
        if let Some(c) = self.complement.as_ref().filter(|c| !c.is_empty()) {
            write!(f, " ({c})")?;
        }
        write!(f, ", {}, {}/{}, CEP {}", self.district, self.city, self.state, self.postal_code)
    }
}

//--------------------------------------          Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[sqlx(flatten)]
    pub customer: Customer,
    #[sqlx(flatten)]
    pub address: DeliveryAddress,
    pub items: Json<Vec<LineItem>>,
    pub shipping: Json<ShippingOption>,
    /// Items plus shipping, fixed when the order was created
    pub total_price: Cents,
    pub checkout_session_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub payment_method: Option<String>,
    pub card_last_four: Option<String>,
    pub carrier_shipment_id: Option<String>,
    pub tracking_code: Option<String>,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub payment_expires_at: DateTime<Utc>,
}

impl Order {
    pub fn items_subtotal(&self) -> Cents {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    pub fn shipping_price(&self) -> Cents {
        self.shipping.price
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: Customer,
    pub address: DeliveryAddress,
    pub items: Vec<LineItem>,
    pub shipping: ShippingOption,
    /// Always `Σ(items) + shipping`. Only [`NewOrder::new`] sets it.
    total_price: Cents,
    pub created_at: DateTime<Utc>,
    pub payment_expires_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(
        customer: Customer,
        address: DeliveryAddress,
        items: Vec<LineItem>,
        shipping: ShippingOption,
        created_at: DateTime<Utc>,
        payment_window: Duration,
    ) -> Self {
        let total_price = items.iter().map(LineItem::subtotal).sum::<Cents>().saturating_add(shipping.price);
        Self { customer, address, items, shipping, total_price, created_at, payment_expires_at: created_at + payment_window }
    }

    pub fn total_price(&self) -> Cents {
        self.total_price
    }
}

//--------------------------------------     PaymentDetails    ---------------------------------------------------------
/// The gateway-side facts written onto an order by a payment transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub gateway_payment_id: String,
    pub method: Option<String>,
    pub card_last_four: Option<String>,
}

impl PaymentDetails {
    pub fn new<S: Into<String>>(gateway_payment_id: S) -> Self {
        Self { gateway_payment_id: gateway_payment_id.into(), method: None, card_last_four: None }
    }

    pub fn with_method(mut self, method: Option<String>, card_last_four: Option<String>) -> Self {
        self.method = method;
        self.card_last_four = card_last_four;
        self
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;
    use crate::db_types::OrderStatusType::*;

    #[test]
    fn transition_graph() {
        assert!(AwaitingPayment.can_transition_to(PaymentPending));
        assert!(AwaitingPayment.can_transition_to(InProduction));
        assert!(PaymentPending.can_transition_to(InProduction));
        assert!(InProduction.can_transition_to(Shipped));
        assert!(AwaitingPayment.can_transition_to(CancelledExpired));
        assert!(PaymentPending.can_transition_to(CancelledExpired));
        // no regressions
        assert!(!PaymentPending.can_transition_to(PaymentPending));
        assert!(!InProduction.can_transition_to(PaymentPending));
        assert!(!InProduction.can_transition_to(CancelledExpired));
        assert!(!CancelledExpired.can_transition_to(InProduction));
        assert!(!Shipped.can_transition_to(InProduction));
        assert!(AwaitingPayment.predecessors().is_empty());
        assert_eq!(OrderStatusType::expirable(), &[AwaitingPayment, PaymentPending]);
    }

    #[test]
    fn status_strings() {
        for s in [AwaitingPayment, PaymentPending, InProduction, Shipped, CancelledExpired] {
            assert_eq!(s.to_string().parse::<OrderStatusType>().unwrap(), s);
        }
        assert_eq!(serde_json::to_string(&InProduction).unwrap(), r#""IN_PRODUCTION""#);
        assert!("Paid".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn order_id_parsing() {
        assert_eq!("42".parse::<OrderId>().unwrap(), OrderId(42));
        assert_eq!(" #7 ".parse::<OrderId>().unwrap(), OrderId(7));
        assert!("order-7".parse::<OrderId>().is_err());
        assert_eq!(OrderId(42).to_string(), "#42");
    }

    #[test]
    fn total_is_items_plus_shipping() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let order = NewOrder::new(
            Customer { name: "Ana".into(), email: "ana@example.com".into(), cpf: "52998224725".into(), phone: "".into() },
            DeliveryAddress {
                street: "Rua A".into(),
                number: "1".into(),
                complement: None,
                district: "Centro".into(),
                city: "Recife".into(),
                state: "PE".into(),
                postal_code: "50000000".into(),
            },
            vec![
                LineItem::new("p1", "Caneca", 2, Cents::from(5000)),
                LineItem::new("p2", "Camiseta", 1, Cents::from(3000)),
            ],
            ShippingOption { service_code: "1".into(), name: "PAC".into(), price: Cents::from(2000), delivery_days: None },
            created,
            Duration::minutes(60),
        );
        assert_eq!(order.total_price(), Cents::from(17_000));
        assert_eq!(order.payment_expires_at, Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap());
    }

    #[test]
    fn address_display() {
        let mut a = DeliveryAddress {
            street: "Av. Paulista".into(),
            number: "1000".into(),
            complement: Some("apto 12".into()),
            district: "Bela Vista".into(),
            city: "São Paulo".into(),
            state: "SP".into(),
            postal_code: "01310100".into(),
        };
        assert_eq!(a.to_string(), "Av. Paulista, 1000 (apto 12), Bela Vista, São Paulo/SP, CEP 01310100");
        a.complement = Some(String::new());
        assert_eq!(a.to_string(), "Av. Paulista, 1000, Bela Vista, São Paulo/SP, CEP 01310100");
    }
}
