use actix_web::{http::StatusCode, test::TestRequest, web};
use chrono::Duration;
use ogw_engine::{
    db_types::{OrderId, OrderStatusType},
    order_objects::CheckoutResponse,
    test_utils::fakes::{sample_checkout, FakeGateway},
    CheckoutApi,
    OrderManagement,
    OrderStoreError,
    SqliteDatabase,
};

use super::{
    helpers::{fresh_database, send_request},
    mocks::MockOrderStore,
};
use crate::routes::{health, CheckoutRoute};

async fn checkout(db: SqliteDatabase, gateway: FakeGateway, body: serde_json::Value) -> (StatusCode, String) {
    let req = TestRequest::post().uri("/checkout").set_json(body);
    send_request(req, move |cfg| {
        cfg.app_data(web::Data::new(CheckoutApi::new(db, gateway, Duration::minutes(60))))
            .service(CheckoutRoute::<SqliteDatabase, FakeGateway>::new());
    })
    .await
}

#[actix_web::test]
async fn health_check() {
    let (status, body) = send_request(TestRequest::get().uri("/health"), |cfg| {
        cfg.service(health);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn checkout_creates_order_and_session() {
    let db = fresh_database().await;
    let gateway = FakeGateway::new();
    let body = serde_json::to_value(sample_checkout()).unwrap();
    let (status, body) = checkout(db.clone(), gateway.clone(), body).await;
    assert_eq!(status, StatusCode::OK);
    let response: CheckoutResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.session_id, format!("pref-{}", response.order_id.value()));
    assert!(response.redirect_url.contains(&response.session_id));

    let order = db.fetch_order_by_id(response.order_id).await.unwrap().expect("Order was not stored");
    assert_eq!(order.status, OrderStatusType::AwaitingPayment);
    assert_eq!(order.checkout_session_id.as_deref(), Some(response.session_id.as_str()));
    assert_eq!(order.total_price.value(), 17_000);
    let sessions = gateway.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].0, order.id);
}

#[actix_web::test]
async fn checkout_rejects_invalid_customer_data() {
    let db = fresh_database().await;
    let mut body = serde_json::to_value(sample_checkout()).unwrap();
    body["customer"]["email"] = "not-an-email".into();
    let (status, body) = checkout(db.clone(), FakeGateway::new(), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("email"), "{body}");
    assert!(db.fetch_order_by_id(OrderId(1)).await.unwrap().is_none());
}

#[actix_web::test]
async fn checkout_rejects_totals_that_do_not_fit() {
    let db = fresh_database().await;
    let mut body = serde_json::to_value(sample_checkout()).unwrap();
    body["items"][0]["unit_price"] = 5.0e16.into();
    let (status, body) = checkout(db.clone(), FakeGateway::new(), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("items[0].unit_price"), "{body}");
    assert!(db.fetch_order_by_id(OrderId(1)).await.unwrap().is_none());
}

#[actix_web::test]
async fn checkout_rejects_malformed_json() {
    let db = fresh_database().await;
    let body = serde_json::json!({"items": "two mugs"});
    let (status, body) = checkout(db, FakeGateway::new(), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"#), "{body}");
}

#[actix_web::test]
async fn gateway_failure_leaves_order_to_expire() {
    let db = fresh_database().await;
    let gateway = FakeGateway::new();
    gateway.fail_checkout_sessions();
    let body = serde_json::to_value(sample_checkout()).unwrap();
    let (status, body) = checkout(db.clone(), gateway, body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Could not process order"}"#);
    let order = db.fetch_order_by_id(OrderId(1)).await.unwrap().expect("Order should still be stored");
    assert_eq!(order.status, OrderStatusType::AwaitingPayment);
    assert_eq!(order.checkout_session_id, None);
}

#[actix_web::test]
async fn store_failures_are_not_leaked_to_the_customer() {
    let mut store = MockOrderStore::new();
    store
        .expect_insert_order()
        .times(1)
        .returning(|_| Err(OrderStoreError::DatabaseError("disk I/O error at /var/lib/ogw/orders.db".into())));
    let gateway = FakeGateway::new();
    let req = TestRequest::post().uri("/checkout").set_json(sample_checkout());
    let session_gateway = gateway.clone();
    let (status, body) = send_request(req, move |cfg| {
        cfg.app_data(web::Data::new(CheckoutApi::new(store, session_gateway, Duration::minutes(60))))
            .service(CheckoutRoute::<MockOrderStore, FakeGateway>::new());
    })
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Could not process order"}"#);
    assert!(gateway.sessions().is_empty());
}
