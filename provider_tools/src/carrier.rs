use log::*;
use ogw_common::Cents;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{
    config::CarrierConfig,
    helpers::{parse_decimal_price, string_or_number},
    retry::{with_retries, RetryPolicy},
    rest::RestClient,
    ProviderApiError,
};

//--------------------------------------       Shipment booking       --------------------------------------------------
/// A party on a shipment label. The sender block comes from configuration; the recipient from the order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipmentParty {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub document: String,
    pub address: String,
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state_abbr: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentProduct {
    pub name: String,
    pub quantity: u32,
    /// Major units
    pub unitary_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackageVolume {
    pub height: f64,
    pub width: f64,
    pub length: f64,
    /// Kilograms
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentTag {
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentOptions {
    pub insurance_value: f64,
    pub receipt: bool,
    pub own_hand: bool,
    pub tags: Vec<ShipmentTag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub service: String,
    pub from: ShipmentParty,
    pub to: ShipmentParty,
    pub products: Vec<ShipmentProduct>,
    pub volumes: Vec<PackageVolume>,
    pub options: ShipmentOptions,
}

#[derive(Debug, Clone, Deserialize)]
struct BookedShipment {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
}

//--------------------------------------        Shipping quotes       --------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotePostalCode {
    pub postal_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteProduct {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub length: f64,
    pub weight: f64,
    pub insurance_value: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub from: QuotePostalCode,
    pub to: QuotePostalCode,
    pub products: Vec<QuoteProduct>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawQuote {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    name: String,
    #[serde(default)]
    price: Option<serde_json::Value>,
    #[serde(default)]
    delivery_time: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

/// A rate offered by the carrier for one of its services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierQuote {
    pub service_code: String,
    pub name: String,
    pub price: Cents,
    pub delivery_days: Option<u32>,
}

impl TryFrom<RawQuote> for CarrierQuote {
    type Error = ProviderApiError;

    fn try_from(raw: RawQuote) -> Result<Self, Self::Error> {
        let price = match raw.price {
            Some(serde_json::Value::String(s)) => parse_decimal_price(&s)?,
            Some(serde_json::Value::Number(n)) => parse_decimal_price(&n.to_string())?,
            other => {
                return Err(ProviderApiError::InvalidCurrencyAmount(format!("service {}: {other:?}", raw.id)));
            },
        };
        Ok(Self { service_code: raw.id, name: raw.name, price, delivery_days: raw.delivery_time })
    }
}

//--------------------------------------          CarrierApi          --------------------------------------------------
#[derive(Clone)]
pub struct CarrierApi {
    config: CarrierConfig,
    client: RestClient,
}

impl CarrierApi {
    pub fn new(config: CarrierConfig) -> Result<Self, ProviderApiError> {
        let auth = format!("Bearer {}", config.token.reveal());
        let headers = [("authorization", auth.as_str()), ("user-agent", config.user_agent.as_str())];
        let client = RestClient::new(&config.api_url, &headers, &config.http)?;
        Ok(Self { config, client })
    }

    /// Adds a shipment to the carrier cart and returns the carrier's shipment id.
    ///
    /// Only connection failures are retried. A timed-out booking may have been created on the carrier side.
    pub async fn book_shipment(&self, request: &ShipmentRequest) -> Result<String, ProviderApiError> {
        let result = with_retries("book shipment", self.config.http.retry, RetryPolicy::ConnectionOnly, || {
            self.client.rest_query::<BookedShipment, ShipmentRequest>(Method::POST, "/api/v2/me/cart", Some(request))
        })
        .await;
        match result {
            Ok(booked) => {
                info!("🚚️ Carrier booked shipment {} for service {}", booked.id, request.service);
                Ok(booked.id)
            },
            Err(e) => {
                let payload = serde_json::to_string(request).unwrap_or_else(|_| format!("{request:?}"));
                error!("🚚️ Carrier rejected shipment booking. {e}. Request: {payload}");
                Err(e)
            },
        }
    }

    /// Fetches rates for every service the carrier offers on this route. Services that cannot serve the route
    /// are left out.
    pub async fn quote(&self, request: &QuoteRequest) -> Result<Vec<CarrierQuote>, ProviderApiError> {
        let raw = with_retries("quote shipping", self.config.http.retry, RetryPolicy::Transient, || {
            self.client.rest_query::<Vec<RawQuote>, QuoteRequest>(
                Method::POST,
                "/api/v2/me/shipment/calculate",
                Some(request),
            )
        })
        .await?;
        let mut quotes = Vec::with_capacity(raw.len());
        for q in raw {
            if let Some(err) = &q.error {
                debug!("🚚️ Service {} ({}) unavailable: {err}", q.id, q.name);
                continue;
            }
            match CarrierQuote::try_from(q) {
                Ok(quote) => quotes.push(quote),
                Err(e) => warn!("🚚️ Skipping quote with an unreadable price. {e}"),
            }
        }
        debug!("🚚️ {} shipping quotes for {}", quotes.len(), request.to.postal_code);
        Ok(quotes)
    }
}
