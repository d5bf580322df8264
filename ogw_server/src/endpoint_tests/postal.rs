use actix_web::{http::StatusCode, test::TestRequest, web};
use ogw_common::Cents;
use ogw_engine::db_types::ShippingOption;
use provider_tools::{data_objects::PostalAddress, ProviderApiError};

use super::{
    helpers::send_request,
    mocks::{MockPostal, MockQuotes},
};
use crate::routes::{PostalCodeRoute, ShippingQuoteRoute};

async fn postal_lookup(postal: MockPostal, cep: &str) -> (StatusCode, String) {
    let req = TestRequest::get().uri(&format!("/postal-code/{cep}"));
    send_request(req, move |cfg| {
        cfg.app_data(web::Data::new(postal)).service(PostalCodeRoute::<MockPostal>::new());
    })
    .await
}

async fn shipping_quote(quotes: MockQuotes, body: serde_json::Value) -> (StatusCode, String) {
    let req = TestRequest::post().uri("/shipping/quote").set_json(body);
    send_request(req, move |cfg| {
        cfg.app_data(web::Data::new(quotes)).service(ShippingQuoteRoute::<MockQuotes>::new());
    })
    .await
}

fn recife() -> PostalAddress {
    PostalAddress {
        postal_code: "50050000".into(),
        street: "Rua da Aurora".into(),
        district: "Boa Vista".into(),
        city: "Recife".into(),
        state: "PE".into(),
        source: "viacep".into(),
    }
}

#[actix_web::test]
async fn postal_code_is_normalised_before_lookup() {
    let mut postal = MockPostal::new();
    postal.expect_lookup_postal_code().withf(|cep| cep == "50050000").times(1).returning(|_| Ok(recife()));
    let (status, body) = postal_lookup(postal, "50050-000").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let address: PostalAddress = serde_json::from_str(&body).unwrap();
    assert_eq!(address, recife());
}

#[actix_web::test]
async fn malformed_postal_code() {
    let mut postal = MockPostal::new();
    postal.expect_lookup_postal_code().never();
    let (status, body) = postal_lookup(postal, "5005").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("postal_code"), "{body}");
}

#[actix_web::test]
async fn unknown_postal_code() {
    let mut postal = MockPostal::new();
    postal.expect_lookup_postal_code().returning(|cep| Err(ProviderApiError::NotFound(format!("CEP {cep}"))));
    let (status, _) = postal_lookup(postal, "99999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn postal_sources_down() {
    let mut postal = MockPostal::new();
    postal.expect_lookup_postal_code().returning(|_| Err(ProviderApiError::Connection("refused".into())));
    let (status, body) = postal_lookup(postal, "50050000").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!body.contains("refused"), "{body}");
}

#[actix_web::test]
async fn shipping_quotes_for_a_cart() {
    let mut quotes = MockQuotes::new();
    quotes
        .expect_quote()
        .withf(|cep, items| cep == "50050000" && items.len() == 1 && items[0].quantity == 2)
        .times(1)
        .returning(|_, _| {
            Ok(vec![
                ShippingOption {
                    service_code: "1".into(),
                    name: "PAC".into(),
                    price: Cents::from(2_050),
                    delivery_days: Some(7),
                },
                ShippingOption {
                    service_code: "2".into(),
                    name: "SEDEX".into(),
                    price: Cents::from(4_590),
                    delivery_days: Some(2),
                },
            ])
        });
    let body = serde_json::json!({
        "postal_code": "50050-000",
        "items": [{"id": "mug-01", "title": "Caneca", "quantity": 2, "unit_price": 50.0}]
    });
    let (status, body) = shipping_quote(quotes, body).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let options: Vec<ShippingOption> = serde_json::from_str(&body).unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[1].price, Cents::from(4_590));
}

#[actix_web::test]
async fn shipping_quote_validation() {
    let mut quotes = MockQuotes::new();
    quotes.expect_quote().never();
    let body = serde_json::json!({"postal_code": "50050-000", "items": []});
    let (status, _) = shipping_quote(quotes, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut quotes = MockQuotes::new();
    quotes.expect_quote().never();
    let body = serde_json::json!({
        "postal_code": "123",
        "items": [{"id": "mug-01", "title": "Caneca", "quantity": 1, "unit_price": 50.0}]
    });
    let (status, _) = shipping_quote(quotes, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn carrier_down_during_quote() {
    let mut quotes = MockQuotes::new();
    quotes.expect_quote().returning(|_, _| Err(ProviderApiError::Timeout("5s".into())));
    let body = serde_json::json!({
        "postal_code": "50050000",
        "items": [{"id": "mug-01", "title": "Caneca", "quantity": 1, "unit_price": 50.0}]
    });
    let (status, _) = shipping_quote(quotes, body).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
