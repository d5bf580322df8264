use actix_web::{http::StatusCode, test::TestRequest, web};
use chrono::{TimeZone, Utc};
use ogw_engine::{
    db_types::{Order, OrderId, OrderStatusType},
    test_utils::fakes::sample_order,
    LookupApi,
    OrderStoreError,
};

use super::{helpers::send_request, mocks::MockOrderStore};
use crate::routes::OrderLookupRoute;

async fn lookup(store: MockOrderStore, body: serde_json::Value) -> (StatusCode, String) {
    let req = TestRequest::post().uri("/orders/lookup").set_json(body);
    send_request(req, move |cfg| {
        cfg.app_data(web::Data::new(LookupApi::new(store))).service(OrderLookupRoute::<MockOrderStore>::new());
    })
    .await
}

fn shipped_order() -> Order {
    let mut order = sample_order(7, OrderStatusType::Shipped, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    order.tracking_code = Some("AA123BR".to_string());
    order
}

#[actix_web::test]
async fn lookup_by_cpf_returns_sanitized_snapshot() {
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_cpf_and_email()
        .withf(|cpf, email| cpf == "52998224725" && email == "ana@example.com")
        .times(1)
        .returning(|_, _| Ok(Some(shipped_order())));
    let body = serde_json::json!({"cpf": "529.982.247-25", "email": " Ana@Example.com "});
    let (status, body) = lookup(store, body).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let snapshot: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(snapshot["order_id"], 7);
    assert_eq!(snapshot["status"], "SHIPPED");
    assert_eq!(snapshot["card"], "**** **** **** 4242");
    assert_eq!(snapshot["tracking_code"], "AA123BR");
    assert!(!body.contains("ana@example.com"));
    assert!(!body.contains("52998224725"));
    assert!(!body.contains("pay-7"));
}

#[actix_web::test]
async fn lookup_by_tracking_code() {
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_tracking_code_and_email()
        .withf(|code, email| code == "AA123BR" && email == "ana@example.com")
        .times(1)
        .returning(|_, _| Ok(Some(shipped_order())));
    let body = serde_json::json!({"tracking_code": "AA123BR", "email": "ana@example.com"});
    let (status, _) = lookup(store, body).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn mismatches_are_indistinguishable() {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_cpf_and_email().returning(|_, _| Ok(None));
    let (status, not_found) = lookup(store, serde_json::json!({"cpf": "52998224725", "email": "eve@example.com"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(not_found, r#"{"error":"Order not found"}"#);

    // A CPF that fails its checksum never reaches the store
    let store = MockOrderStore::new();
    let (status, body) = lookup(store, serde_json::json!({"cpf": "11111111112", "email": "ana@example.com"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);

    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_tracking_code_and_email()
        .returning(|_, _| Err(OrderStoreError::OrderNotFound(OrderId(1))));
    let (status, body) = lookup(store, serde_json::json!({"tracking_code": "ZZ", "email": "ana@example.com"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);
}

#[actix_web::test]
async fn incomplete_queries_are_bad_requests() {
    let (status, _) = lookup(MockOrderStore::new(), serde_json::json!({"email": "ana@example.com"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
