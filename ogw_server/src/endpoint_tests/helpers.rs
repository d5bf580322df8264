use actix_web::{body::to_bytes, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::Utc;
use log::debug;
use ogw_engine::{
    helpers::sign_request,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    SqliteDatabase,
};

use crate::server::json_config;

pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Sends `req` to an app set up by `configure` and returns the status and body. Errors raised by middleware are
/// rendered the way the server would render them.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let _ = env_logger::try_init();
    let app = App::new().app_data(json_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = to_bytes(res.into_body()).await.expect("Could not read response body");
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub async fn fresh_database() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

/// A correctly signed payment webhook call for `payment_id`.
pub fn signed_payment_webhook(payment_id: &str, request_id: &str) -> TestRequest {
    let ts = Utc::now().timestamp().to_string();
    let signature = sign_request(WEBHOOK_SECRET, payment_id, request_id, &ts).expect("Could not sign request");
    TestRequest::post()
        .uri(&format!("/webhooks/payments?type=payment&data.id={payment_id}"))
        .insert_header(("x-signature", signature))
        .insert_header(("x-request-id", request_id))
}
