//! Carrier adapter: books shipments for paid orders and quotes shipping for carts.
use log::*;
use ogw_engine::{
    db_types::{LineItem, Order, ShippingOption},
    BookingError,
    CarrierBooking,
};
use provider_tools::{
    CarrierApi,
    PackageVolume,
    ProviderApiError,
    QuotePostalCode,
    QuoteProduct,
    QuoteRequest,
    ShipmentOptions,
    ShipmentParty,
    ShipmentProduct,
    ShipmentRequest,
    ShipmentTag,
};

use crate::config::{SenderConfig, ShippingConfig};

/// Shipping quotes for the storefront.
#[allow(async_fn_in_trait)]
pub trait ShippingQuotes: Clone {
    async fn quote(&self, postal_code: &str, items: &[LineItem]) -> Result<Vec<ShippingOption>, ProviderApiError>;
}

/// Σ(unit weight × quantity), but never less than `min_weight`.
pub fn package_weight(items: &[LineItem], item_weight: f64, min_weight: f64) -> f64 {
    let units: u32 = items.iter().map(|i| i.quantity).sum();
    (f64::from(units) * item_weight).max(min_weight)
}

fn sender_party(sender: &SenderConfig) -> ShipmentParty {
    ShipmentParty {
        name: sender.name.clone(),
        phone: sender.phone.clone(),
        email: sender.email.clone(),
        document: sender.document.clone(),
        address: sender.street.clone(),
        number: sender.number.clone(),
        complement: None,
        district: sender.district.clone(),
        city: sender.city.clone(),
        state_abbr: sender.state.clone(),
        postal_code: sender.postal_code.clone(),
    }
}

fn recipient_party(order: &Order) -> ShipmentParty {
    let address = &order.address;
    ShipmentParty {
        name: order.customer.name.clone(),
        phone: order.customer.phone.clone(),
        email: order.customer.email.clone(),
        document: order.customer.cpf.clone(),
        address: address.street.clone(),
        number: address.number.clone(),
        complement: address.complement.clone(),
        district: address.district.clone(),
        city: address.city.clone(),
        state_abbr: address.state.clone(),
        postal_code: address.postal_code.clone(),
    }
}

/// Builds the carrier booking request for a paid order. The insured value is the item subtotal and the order id
/// is the carrier-side tag.
pub fn build_shipment_request(order: &Order, shipping: &ShippingConfig) -> ShipmentRequest {
    let items = order.items.0.as_slice();
    let weight = package_weight(items, shipping.item_weight_kg, shipping.min_package_weight_kg);
    let dims = shipping.package;
    ShipmentRequest {
        service: order.shipping.0.service_code.clone(),
        from: sender_party(&shipping.sender),
        to: recipient_party(order),
        products: items
            .iter()
            .map(|i| ShipmentProduct {
                name: i.title.clone(),
                quantity: i.quantity,
                unitary_value: i.unit_price.as_major_units(),
            })
            .collect(),
        volumes: vec![PackageVolume { height: dims.height, width: dims.width, length: dims.length, weight }],
        options: ShipmentOptions {
            insurance_value: order.items_subtotal().as_major_units(),
            receipt: false,
            own_hand: false,
            tags: vec![ShipmentTag { tag: order.id.value().to_string() }],
        },
    }
}

pub fn build_quote_request(postal_code: &str, items: &[LineItem], shipping: &ShippingConfig) -> QuoteRequest {
    let dims = shipping.package;
    let weight = package_weight(items, shipping.item_weight_kg, shipping.min_package_weight_kg);
    let insurance_value = items.iter().map(LineItem::subtotal).sum::<ogw_common::Cents>().as_major_units();
    QuoteRequest {
        from: QuotePostalCode { postal_code: shipping.sender.postal_code.clone() },
        to: QuotePostalCode { postal_code: postal_code.to_string() },
        // The whole cart ships as a single package
        products: vec![QuoteProduct {
            id: "cart".to_string(),
            width: dims.width,
            height: dims.height,
            length: dims.length,
            weight,
            insurance_value,
            quantity: 1,
        }],
    }
}

pub fn booking_error(e: ProviderApiError) -> BookingError {
    match e {
        ProviderApiError::Connection(s) | ProviderApiError::Timeout(s) => BookingError::Unavailable(s),
        ProviderApiError::QueryError { status, message } => BookingError::Rejected { status, body: message },
        ProviderApiError::NotFound(body) => BookingError::Rejected { status: 404, body },
        other => BookingError::InvalidResponse(other.to_string()),
    }
}

#[derive(Clone)]
pub struct CarrierClient {
    api: CarrierApi,
    shipping: ShippingConfig,
}

impl CarrierClient {
    pub fn new(api: CarrierApi, shipping: ShippingConfig) -> Self {
        Self { api, shipping }
    }
}

impl CarrierBooking for CarrierClient {
    async fn book_shipment(&self, order: &Order) -> Result<String, BookingError> {
        let request = build_shipment_request(order, &self.shipping);
        debug!("🚚️ Booking shipment for order {} with service {}", order.id, request.service);
        let id = self.api.book_shipment(&request).await.map_err(booking_error)?;
        Ok(id)
    }
}

impl ShippingQuotes for CarrierClient {
    async fn quote(&self, postal_code: &str, items: &[LineItem]) -> Result<Vec<ShippingOption>, ProviderApiError> {
        let request = build_quote_request(postal_code, items, &self.shipping);
        let quotes = self.api.quote(&request).await?;
        let options = quotes
            .into_iter()
            .map(|q| ShippingOption {
                service_code: q.service_code,
                name: q.name,
                price: q.price,
                delivery_days: q.delivery_days,
            })
            .collect();
        Ok(options)
    }
}
