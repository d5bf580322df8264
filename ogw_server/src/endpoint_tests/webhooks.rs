use actix_web::{http::StatusCode, test::TestRequest, web};
use chrono::{Duration, Utc};
use ogw_common::Secret;
use ogw_engine::{
    db_types::{Order, OrderStatusType, PaymentDetails},
    test_utils::fakes::{sample_new_order, FakeGateway, RecordingCarrier, RecordingNotifier},
    traits::{PaymentStatus, StatusTransition},
    FulfillmentApi,
    NotificationType,
    OrderManagement,
    ReconciliationApi,
    SqliteDatabase,
};

use super::helpers::{fresh_database, send_request, signed_payment_webhook, WEBHOOK_SECRET};
use crate::{
    middleware::SignatureMiddlewareFactory,
    routes::{CarrierWebhookRoute, PaymentWebhookRoute},
};

#[derive(Clone)]
struct Harness {
    db: SqliteDatabase,
    gateway: FakeGateway,
    notifier: RecordingNotifier,
    carrier: RecordingCarrier,
}

impl Harness {
    async fn new() -> Self {
        Self {
            db: fresh_database().await,
            gateway: FakeGateway::new(),
            notifier: RecordingNotifier::new(),
            carrier: RecordingCarrier::new(),
        }
    }

    async fn new_order(&self) -> Order {
        self.db.insert_order(sample_new_order(Utc::now(), Duration::minutes(60))).await.unwrap()
    }

    async fn status(&self, order: &Order) -> OrderStatusType {
        self.db.fetch_order_by_id(order.id).await.unwrap().expect("order exists").status
    }

    async fn payment_webhook(&self, req: TestRequest, secret: Option<&str>) -> (StatusCode, String) {
        let Harness { db, gateway, notifier, carrier } = self.clone();
        let secret = secret.map(Secret::from);
        send_request(req, move |cfg| {
            let api = ReconciliationApi::new(db, gateway, notifier, carrier);
            cfg.app_data(web::Data::new(api)).service(
                web::scope("/webhooks/payments").wrap(SignatureMiddlewareFactory::new(secret)).service(
                    PaymentWebhookRoute::<SqliteDatabase, FakeGateway, RecordingNotifier, RecordingCarrier>::new(),
                ),
            );
        })
        .await
    }

    async fn carrier_webhook(&self, body: serde_json::Value) -> (StatusCode, String) {
        let Harness { db, notifier, .. } = self.clone();
        let req = TestRequest::post().uri("/webhooks/carrier").set_json(body);
        send_request(req, move |cfg| {
            let route = CarrierWebhookRoute::<SqliteDatabase, RecordingNotifier>::new();
            cfg.app_data(web::Data::new(FulfillmentApi::new(db, notifier)))
                .service(web::scope("/webhooks").service(route));
        })
        .await
    }
}

//--------------------------------------      Payment webhooks      ----------------------------------------------------

#[actix_web::test]
async fn approved_payment_moves_order_into_production() {
    let h = Harness::new().await;
    let order = h.new_order().await;
    h.gateway.set_payment("pay-100", PaymentStatus::Approved, Some(order.id));

    let (status, body) = h.payment_webhook(signed_payment_webhook("pay-100", "req-1"), Some(WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains(r#""success":true"#), "{body}");

    let stored = h.db.fetch_order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::InProduction);
    assert_eq!(stored.gateway_payment_id.as_deref(), Some("pay-100"));
    assert_eq!(stored.card_last_four.as_deref(), Some("4242"));
    assert_eq!(stored.carrier_shipment_id, Some(RecordingCarrier::shipment_id_for(order.id)));
    assert_eq!(h.notifier.sent(), vec![(order.id, NotificationType::Confirmation)]);
    assert_eq!(h.carrier.bookings(), vec![order.id]);
}

#[actix_web::test]
async fn duplicate_deliveries_have_no_further_effect() {
    let h = Harness::new().await;
    let order = h.new_order().await;
    h.gateway.set_payment("pay-101", PaymentStatus::Approved, Some(order.id));

    for request_id in ["req-1", "req-2", "req-3"] {
        let (status, _) = h.payment_webhook(signed_payment_webhook("pay-101", request_id), Some(WEBHOOK_SECRET)).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(h.status(&order).await, OrderStatusType::InProduction);
    assert_eq!(h.notifier.count(NotificationType::Confirmation), 1);
    assert_eq!(h.carrier.bookings().len(), 1);
    assert_eq!(h.gateway.fetch_count(), 3);
}

#[actix_web::test]
async fn pending_payment_is_recorded_without_side_effects() {
    let h = Harness::new().await;
    let order = h.new_order().await;
    h.gateway.set_payment("pay-102", PaymentStatus::InProcess, Some(order.id));

    let (status, _) = h.payment_webhook(signed_payment_webhook("pay-102", "req-1"), Some(WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.status(&order).await, OrderStatusType::PaymentPending);
    assert!(h.notifier.sent().is_empty());
    assert!(h.carrier.bookings().is_empty());
}

#[actix_web::test]
async fn tampered_signature_is_rejected() {
    let h = Harness::new().await;
    let order = h.new_order().await;
    h.gateway.set_payment("pay-103", PaymentStatus::Approved, Some(order.id));

    // Signed for a different payment id
    let req = signed_payment_webhook("pay-999", "req-1").uri("/webhooks/payments?type=payment&data.id=pay-103");
    let (status, body) = h.payment_webhook(req, Some(WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("error"), "{body}");
    assert_eq!(h.gateway.fetch_count(), 0);
    assert_eq!(h.status(&order).await, OrderStatusType::AwaitingPayment);
}

#[actix_web::test]
async fn missing_signature_headers_are_rejected() {
    let h = Harness::new().await;
    let req = TestRequest::post().uri("/webhooks/payments?type=payment&data.id=pay-104");
    let (status, _) = h.payment_webhook(req, Some(WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::post()
        .uri("/webhooks/payments?type=payment&data.id=pay-104")
        .insert_header(("x-signature", "ts=1704908010,v1=00ff"));
    let (status, _) = h.payment_webhook(req, Some(WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(h.gateway.fetch_count(), 0);
}

#[actix_web::test]
async fn unsigned_calls_are_accepted_when_no_secret_is_configured() {
    let h = Harness::new().await;
    let order = h.new_order().await;
    h.gateway.set_payment("pay-105", PaymentStatus::Approved, Some(order.id));
    let req = TestRequest::post().uri("/webhooks/payments?topic=payment&id=pay-105");
    let (status, _) = h.payment_webhook(req, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.status(&order).await, OrderStatusType::InProduction);
}

#[actix_web::test]
async fn other_topics_are_acknowledged_and_ignored() {
    let h = Harness::new().await;
    let req = TestRequest::post().uri("/webhooks/payments?topic=merchant_order&id=77");
    let (status, body) = h.payment_webhook(req, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("merchant_order"), "{body}");
    assert_eq!(h.gateway.fetch_count(), 0);
}

#[actix_web::test]
async fn gateway_failures_still_answer_ok() {
    let h = Harness::new().await;
    // The fake gateway does not know this payment
    let (status, body) = h.payment_webhook(signed_payment_webhook("pay-404", "req-1"), Some(WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":false"#), "{body}");
    assert_eq!(h.gateway.fetch_count(), 1);
}

#[actix_web::test]
async fn late_approval_does_not_revive_expired_order() {
    let h = Harness::new().await;
    let order = h.new_order().await;
    let expired = h.db.transition_status(order.id, &StatusTransition::to(OrderStatusType::CancelledExpired)).await;
    assert!(expired.unwrap());
    h.gateway.set_payment("pay-106", PaymentStatus::Approved, Some(order.id));

    let (status, _) = h.payment_webhook(signed_payment_webhook("pay-106", "req-1"), Some(WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.status(&order).await, OrderStatusType::CancelledExpired);
    assert!(h.notifier.sent().is_empty());
    assert!(h.carrier.bookings().is_empty());
}

//--------------------------------------      Carrier webhooks      ----------------------------------------------------

async fn paid_and_booked(h: &Harness) -> Order {
    let order = h.new_order().await;
    let paid = StatusTransition::to(OrderStatusType::InProduction).with_payment(PaymentDetails::new("pay-200"));
    assert!(h.db.transition_status(order.id, &paid).await.unwrap());
    assert!(h.db.set_carrier_shipment_id(order.id, "shp-200").await.unwrap());
    order
}

#[actix_web::test]
async fn tracking_code_ships_the_order() {
    let h = Harness::new().await;
    let order = paid_and_booked(&h).await;

    let body = serde_json::json!({"resource_id": "shp-200", "tracking_code": "AA123BR"});
    let (status, _) = h.carrier_webhook(body).await;
    assert_eq!(status, StatusCode::OK);
    let stored = h.db.fetch_order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::Shipped);
    assert_eq!(stored.tracking_code.as_deref(), Some("AA123BR"));
    assert_eq!(h.notifier.sent(), vec![(order.id, NotificationType::Tracking)]);

    // The carrier repeats itself
    let (status, _) = h.carrier_webhook(serde_json::json!({"id": "shp-200", "tracking": "AA123BR"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.notifier.count(NotificationType::Tracking), 1);
}

#[actix_web::test]
async fn unknown_shipments_are_acknowledged() {
    let h = Harness::new().await;
    let (status, body) = h.carrier_webhook(serde_json::json!({"id": "shp-nope", "tracking": "ZZ1BR"})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Unknown shipment"), "{body}");
    assert!(h.notifier.sent().is_empty());
}

#[actix_web::test]
async fn notifications_without_tracking_code_change_nothing() {
    let h = Harness::new().await;
    let order = paid_and_booked(&h).await;
    let (status, _) = h.carrier_webhook(serde_json::json!({"id": "shp-200"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.status(&order).await, OrderStatusType::InProduction);
}

#[actix_web::test]
async fn undecodable_carrier_notifications_are_bad_requests() {
    let h = Harness::new().await;
    let (status, _) = h.carrier_webhook(serde_json::json!({"tracking": "AA123BR"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
