//! In-memory collaborators that record how they were called.
//!
//! All of them are cheap to clone and clones share their recordings, so a test can keep one copy for assertions and
//! hand another to the API under test.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use chrono::{DateTime, Duration, Utc};
use ogw_common::Cents;
use sqlx::types::Json;

use crate::{
    db_types::{Customer, DeliveryAddress, LineItem, NewOrder, Order, OrderId, OrderStatusType, ShippingOption},
    order_objects::CheckoutRequest,
    traits::{
        BookingError,
        CarrierBooking,
        CheckoutSession,
        GatewayError,
        NotificationError,
        NotificationType,
        Notifier,
        PaymentGateway,
        PaymentRecord,
        PaymentStatus,
    },
};

//--------------------------------------      FakeGateway      ---------------------------------------------------------
#[derive(Clone, Default)]
pub struct FakeGateway {
    payments: Arc<Mutex<HashMap<String, PaymentRecord>>>,
    fetches: Arc<AtomicUsize>,
    sessions: Arc<Mutex<Vec<(OrderId, DateTime<Utc>)>>>,
    fail_sessions: Arc<AtomicBool>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the payment the gateway reports for `payment_id`.
    pub fn set_payment(&self, payment_id: &str, status: PaymentStatus, order_id: Option<OrderId>) {
        let record = PaymentRecord {
            payment_id: payment_id.to_string(),
            status,
            method: Some("credit_card".to_string()),
            card_last_four: Some("4242".to_string()),
            external_reference: order_id.map(|id| id.value().to_string()),
        };
        self.payments.lock().unwrap().insert(payment_id.to_string(), record);
    }

    pub fn fail_checkout_sessions(&self) {
        self.fail_sessions.store(true, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn sessions(&self) -> Vec<(OrderId, DateTime<Utc>)> {
        self.sessions.lock().unwrap().clone()
    }
}

impl PaymentGateway for FakeGateway {
    async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentRecord, GatewayError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| GatewayError::PaymentNotFound(payment_id.to_string()))
    }

    async fn create_checkout_session(
        &self,
        order: &Order,
        expires_at: DateTime<Utc>,
    ) -> Result<CheckoutSession, GatewayError> {
        if self.fail_sessions.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("gateway is down".to_string()));
        }
        self.sessions.lock().unwrap().push((order.id, expires_at));
        let session_id = format!("pref-{}", order.id.value());
        let redirect_url = format!("https://pay.example.com/checkout?pref_id={session_id}");
        Ok(CheckoutSession { session_id, redirect_url })
    }
}

//--------------------------------------   RecordingNotifier   ---------------------------------------------------------
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(OrderId, NotificationType)>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn sent(&self) -> Vec<(OrderId, NotificationType)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, kind: NotificationType) -> usize {
        self.sent.lock().unwrap().iter().filter(|(_, k)| *k == kind).count()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, order: &Order, kind: NotificationType) -> Result<(), NotificationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::Unavailable("mail provider is down".to_string()));
        }
        self.sent.lock().unwrap().push((order.id, kind));
        Ok(())
    }
}

//--------------------------------------    RecordingCarrier   ---------------------------------------------------------
#[derive(Clone, Default)]
pub struct RecordingCarrier {
    bookings: Arc<Mutex<Vec<OrderId>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingCarrier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let carrier = Self::default();
        carrier.fail.store(true, Ordering::SeqCst);
        carrier
    }

    pub fn bookings(&self) -> Vec<OrderId> {
        self.bookings.lock().unwrap().clone()
    }

    pub fn shipment_id_for(id: OrderId) -> String {
        format!("shp-{}", id.value())
    }
}

impl CarrierBooking for RecordingCarrier {
    async fn book_shipment(&self, order: &Order) -> Result<String, BookingError> {
        self.bookings.lock().unwrap().push(order.id);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BookingError::Rejected { status: 422, body: r#"{"message":"invalid sender"}"#.to_string() });
        }
        Ok(Self::shipment_id_for(order.id))
    }
}

//--------------------------------------      Sample data      ---------------------------------------------------------
pub fn sample_customer() -> Customer {
    Customer {
        name: "Ana Souza".to_string(),
        email: "ana@example.com".to_string(),
        cpf: "52998224725".to_string(),
        phone: "81999990000".to_string(),
    }
}

pub fn sample_address() -> DeliveryAddress {
    DeliveryAddress {
        street: "Rua da Aurora".to_string(),
        number: "123".to_string(),
        complement: Some("apto 4".to_string()),
        district: "Boa Vista".to_string(),
        city: "Recife".to_string(),
        state: "PE".to_string(),
        postal_code: "50050000".to_string(),
    }
}

/// Two mugs at 50.00, one t-shirt at 30.00 and 20.00 shipping: 170.00 in total.
pub fn sample_items() -> Vec<LineItem> {
    vec![
        LineItem::new("mug-01", "Caneca", 2, Cents::from(5_000)),
        LineItem::new("tee-01", "Camiseta", 1, Cents::from(3_000)),
    ]
}

pub fn sample_shipping() -> ShippingOption {
    ShippingOption { service_code: "1".to_string(), name: "PAC".to_string(), price: Cents::from(2_000), delivery_days: Some(7) }
}

pub fn sample_checkout() -> CheckoutRequest {
    CheckoutRequest {
        items: sample_items(),
        customer: sample_customer(),
        address: sample_address(),
        shipping: sample_shipping(),
    }
}

pub fn sample_new_order(created_at: DateTime<Utc>, payment_window: Duration) -> NewOrder {
    NewOrder::new(sample_customer(), sample_address(), sample_items(), sample_shipping(), created_at, payment_window)
}

/// The sample cart as a stored order, without going through a database. Paid orders carry the fake gateway's
/// payment details.
pub fn sample_order(id: i64, status: OrderStatusType, created_at: DateTime<Utc>) -> Order {
    let new_order = sample_new_order(created_at, Duration::minutes(60));
    let total_price = new_order.total_price();
    let paid = !matches!(status, OrderStatusType::AwaitingPayment | OrderStatusType::CancelledExpired);
    Order {
        id: OrderId(id),
        customer: new_order.customer,
        address: new_order.address,
        items: Json(new_order.items),
        shipping: Json(new_order.shipping),
        total_price,
        checkout_session_id: Some(format!("pref-{id}")),
        gateway_payment_id: paid.then(|| format!("pay-{id}")),
        payment_method: paid.then(|| "credit_card".to_string()),
        card_last_four: paid.then(|| "4242".to_string()),
        carrier_shipment_id: None,
        tracking_code: None,
        status,
        created_at,
        updated_at: created_at,
        payment_expires_at: new_order.payment_expires_at,
    }
}
