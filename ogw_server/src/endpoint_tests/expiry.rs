use actix_web::{http::StatusCode, test::TestRequest, web};
use chrono::{Duration, Utc};
use ogw_common::Secret;
use ogw_engine::{
    db_types::{Order, OrderStatusType},
    test_utils::fakes::{sample_new_order, RecordingNotifier},
    ExpiryApi,
    NotificationType,
    OrderManagement,
    SqliteDatabase,
};

use super::helpers::{fresh_database, send_request};
use crate::{
    data_objects::{CronToken, SweepSummary},
    routes::ExpireOrdersRoute,
};

async fn stale_order(db: &SqliteDatabase) -> Order {
    db.insert_order(sample_new_order(Utc::now() - Duration::hours(2), Duration::minutes(60))).await.unwrap()
}

async fn sweep(
    req: TestRequest,
    db: SqliteDatabase,
    notifier: RecordingNotifier,
    token: Option<&str>,
) -> (StatusCode, String) {
    let token = CronToken::new(token.map(Secret::from));
    send_request(req, move |cfg| {
        cfg.app_data(web::Data::new(ExpiryApi::new(db, notifier)))
            .app_data(web::Data::new(token))
            .service(ExpireOrdersRoute::<SqliteDatabase, RecordingNotifier>::new());
    })
    .await
}

#[actix_web::test]
async fn sweep_expires_stale_orders_once() {
    let db = fresh_database().await;
    let notifier = RecordingNotifier::new();
    let stale = stale_order(&db).await;
    let fresh = db.insert_order(sample_new_order(Utc::now(), Duration::minutes(60))).await.unwrap();

    let req = TestRequest::get().uri("/cron/expire-orders");
    let (status, body) = sweep(req, db.clone(), notifier.clone(), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let summary: SweepSummary = serde_json::from_str(&body).unwrap();
    assert_eq!(summary.expired, 1);
    assert_eq!(summary.order_ids, vec![stale.id]);
    assert_eq!(db.fetch_order_by_id(stale.id).await.unwrap().unwrap().status, OrderStatusType::CancelledExpired);
    assert_eq!(db.fetch_order_by_id(fresh.id).await.unwrap().unwrap().status, OrderStatusType::AwaitingPayment);
    assert_eq!(notifier.sent(), vec![(stale.id, NotificationType::Expiry)]);

    let req = TestRequest::get().uri("/cron/expire-orders");
    let (status, body) = sweep(req, db, notifier.clone(), None).await;
    assert_eq!(status, StatusCode::OK);
    let summary: SweepSummary = serde_json::from_str(&body).unwrap();
    assert_eq!(summary.expired, 0);
    assert_eq!(notifier.count(NotificationType::Expiry), 1);
}

#[actix_web::test]
async fn sweep_requires_the_cron_token() {
    let db = fresh_database().await;
    let notifier = RecordingNotifier::new();
    let stale = stale_order(&db).await;

    let req = TestRequest::get().uri("/cron/expire-orders");
    let (status, _) = sweep(req, db.clone(), notifier.clone(), Some("s3cr3t")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::get().uri("/cron/expire-orders?token=wrong");
    let (status, _) = sweep(req, db.clone(), notifier.clone(), Some("s3cr3t")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(db.fetch_order_by_id(stale.id).await.unwrap().unwrap().status, OrderStatusType::AwaitingPayment);

    let req = TestRequest::get().uri("/cron/expire-orders").insert_header(("x-cron-token", "s3cr3t"));
    let (status, _) = sweep(req, db.clone(), notifier.clone(), Some("s3cr3t")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(db.fetch_order_by_id(stale.id).await.unwrap().unwrap().status, OrderStatusType::CancelledExpired);
}

#[actix_web::test]
async fn token_in_query_string_is_accepted() {
    let db = fresh_database().await;
    let req = TestRequest::get().uri("/cron/expire-orders?token=s3cr3t");
    let (status, _) = sweep(req, db, RecordingNotifier::new(), Some("s3cr3t")).await;
    assert_eq!(status, StatusCode::OK);
}
