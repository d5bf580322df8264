//! Payment gateway adapter.
use chrono::{DateTime, Utc};
use log::*;
use ogw_engine::{
    db_types::Order,
    traits::{CheckoutSession, PaymentRecord, PaymentStatus},
    GatewayError,
    PaymentGateway,
};
use provider_tools::{
    data_objects::{NewPreference, PreferenceItem},
    GatewayPayment,
    PaymentsApi,
    ProviderApiError,
};

pub fn gateway_error(e: ProviderApiError) -> GatewayError {
    match e {
        ProviderApiError::Connection(s) | ProviderApiError::Timeout(s) => GatewayError::Unavailable(s),
        ProviderApiError::QueryError { status, message } => GatewayError::Rejected { status, message },
        ProviderApiError::NotFound(s) => GatewayError::PaymentNotFound(s),
        other => GatewayError::InvalidResponse(other.to_string()),
    }
}

/// The payment record the engine reconciles against. The method label prefers the payment type
/// (`credit_card`, `pix`, ...) over the brand.
pub fn payment_record(payment: GatewayPayment) -> PaymentRecord {
    let card_last_four = payment.card_last_four();
    PaymentRecord {
        status: PaymentStatus::from(payment.status.as_str()),
        method: payment.payment_type_id.or(payment.payment_method_id),
        card_last_four,
        external_reference: payment.external_reference,
        payment_id: payment.id,
    }
}

pub fn checkout_preference(order: &Order) -> NewPreference {
    let items = order
        .items
        .iter()
        .map(|i| PreferenceItem {
            id: i.id.clone(),
            title: i.title.clone(),
            quantity: i.quantity,
            unit_price: i.unit_price.as_major_units(),
        })
        .collect();
    NewPreference::new(
        &order.id.value().to_string(),
        items,
        &order.customer.name,
        &order.customer.email,
        order.shipping_price().as_major_units(),
    )
}

#[derive(Clone)]
pub struct GatewayClient {
    api: PaymentsApi,
}

impl GatewayClient {
    pub fn new(api: PaymentsApi) -> Self {
        Self { api }
    }
}

impl PaymentGateway for GatewayClient {
    async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentRecord, GatewayError> {
        let payment = self.api.get_payment(payment_id).await.map_err(|e| match e {
            ProviderApiError::NotFound(_) => GatewayError::PaymentNotFound(payment_id.to_string()),
            other => gateway_error(other),
        })?;
        Ok(payment_record(payment))
    }

    async fn create_checkout_session(
        &self,
        order: &Order,
        expires_at: DateTime<Utc>,
    ) -> Result<CheckoutSession, GatewayError> {
        let preference = checkout_preference(order);
        let created = self.api.create_preference(preference, expires_at).await.map_err(gateway_error)?;
        debug!("🛒️ Checkout session {} opened for order {}", created.id, order.id);
        Ok(CheckoutSession { session_id: created.id, redirect_url: created.init_point })
    }
}
