use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use ogw_common::{
    helpers::{digits_only, normalize_email},
    Cents,
};

use crate::{
    db_types::{Customer, DeliveryAddress, LineItem, NewOrder},
    helpers::{
        normalize_cpf,
        normalize_postal_code,
        normalize_state,
        require_non_empty,
        validate_email,
        ValidationError,
    },
    ogw_api::{
        errors::CheckoutError,
        order_objects::{CheckoutRequest, CheckoutResponse},
    },
    traits::{OrderManagement, PaymentGateway},
};

pub const DEFAULT_PAYMENT_WINDOW_MINUTES: i64 = 60;

/// `CheckoutApi` turns a storefront cart into a stored order and a hosted checkout session.
pub struct CheckoutApi<B, G> {
    db: B,
    gateway: G,
    payment_window: Duration,
}

impl<B, G> Debug for CheckoutApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({} minute window)", self.payment_window.num_minutes())
    }
}

impl<B, G> CheckoutApi<B, G> {
    pub fn new(db: B, gateway: G, payment_window: Duration) -> Self {
        Self { db, gateway, payment_window }
    }

    pub fn payment_window(&self) -> Duration {
        self.payment_window
    }
}

impl<B, G> CheckoutApi<B, G>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    /// Validates the cart, stores the order in `AWAITING_PAYMENT` and opens a checkout session for it.
    ///
    /// The total is computed here and never again. If the gateway call fails the order stays in the store and is
    /// cleaned up by the expiry sweep once its window closes.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutResponse, CheckoutError> {
        let CheckoutRequest { items, customer, address, shipping } = request;
        let items = validate_items(items)?;
        let customer = validate_customer(customer)?;
        let address = validate_address(address)?;
        if shipping.price.is_negative() {
            return Err(ValidationError::new("shipping.price", "must not be negative").into());
        }
        require_non_empty("shipping.service_code", &shipping.service_code)?;
        checked_total(&items, shipping.price)?;
        let new_order = NewOrder::new(customer, address, items, shipping, Utc::now(), self.payment_window);
        let order = self.db.insert_order(new_order).await?;
        info!("🛒️ Order {} created for {}. Total {}", order.id, order.customer.email, order.total_price);
        let session = self
            .gateway
            .create_checkout_session(&order, order.payment_expires_at)
            .await
            .map_err(|source| CheckoutError::Gateway { order_id: order.id, source })?;
        self.db.set_checkout_session_id(order.id, &session.session_id).await?;
        debug!("🛒️ Checkout session {} opened for order {}", session.session_id, order.id);
        Ok(CheckoutResponse { order_id: order.id, session_id: session.session_id, redirect_url: session.redirect_url })
    }
}

fn validate_items(items: Vec<LineItem>) -> Result<Vec<LineItem>, ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::new("items", "the cart is empty"));
    }
    for (i, item) in items.iter().enumerate() {
        require_non_empty(&format!("items[{i}].id"), &item.id)?;
        require_non_empty(&format!("items[{i}].title"), &item.title)?;
        if item.quantity == 0 {
            return Err(ValidationError::new(format!("items[{i}].quantity"), "must be at least 1"));
        }
        if item.unit_price.is_negative() {
            return Err(ValidationError::new(format!("items[{i}].unit_price"), "must not be negative"));
        }
    }
    Ok(items)
}

/// `Σ(unit price × quantity) + shipping`, or the field at which the sum stops fitting in an `i64`.
fn checked_total(items: &[LineItem], shipping: Cents) -> Result<Cents, ValidationError> {
    let mut total = Cents::default();
    for (i, item) in items.iter().enumerate() {
        total = item
            .checked_subtotal()
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or_else(|| ValidationError::new(format!("items[{i}].unit_price"), "total is too large"))?;
    }
    total.checked_add(shipping).ok_or_else(|| ValidationError::new("shipping.price", "total is too large"))
}

fn validate_customer(customer: Customer) -> Result<Customer, ValidationError> {
    require_non_empty("customer.name", &customer.name)?;
    validate_email(&customer.email)?;
    let cpf = normalize_cpf(&customer.cpf)?;
    Ok(Customer {
        name: customer.name.trim().to_string(),
        email: normalize_email(&customer.email),
        cpf,
        phone: digits_only(&customer.phone),
    })
}

fn validate_address(address: DeliveryAddress) -> Result<DeliveryAddress, ValidationError> {
    require_non_empty("address.street", &address.street)?;
    require_non_empty("address.number", &address.number)?;
    require_non_empty("address.district", &address.district)?;
    require_non_empty("address.city", &address.city)?;
    let state = normalize_state(&address.state)?;
    let postal_code = normalize_postal_code(&address.postal_code)?;
    let complement = address.complement.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    Ok(DeliveryAddress { state, postal_code, complement, ..address })
}

#[cfg(test)]
mod test {
    use super::*;

    fn customer() -> Customer {
        Customer {
            name: " Ana Souza ".into(),
            email: "Ana@Example.com".into(),
            cpf: "529.982.247-25".into(),
            phone: "(81) 99999-0000".into(),
        }
    }

    #[test]
    fn customers_are_normalized() {
        let c = validate_customer(customer()).unwrap();
        assert_eq!(c.name, "Ana Souza");
        assert_eq!(c.email, "ana@example.com");
        assert_eq!(c.cpf, "52998224725");
        assert_eq!(c.phone, "81999990000");
        let bad = Customer { cpf: "123.456.789-00".into(), ..customer() };
        assert_eq!(validate_customer(bad).unwrap_err().field, "cpf");
    }

    #[test]
    fn items_are_checked() {
        assert_eq!(validate_items(vec![]).unwrap_err().field, "items");
        let zero = vec![LineItem::new("p1", "Caneca", 0, Cents::from(100))];
        assert_eq!(validate_items(zero).unwrap_err().field, "items[0].quantity");
        let negative = vec![LineItem::new("p1", "Caneca", 1, Cents::from(-1))];
        assert_eq!(validate_items(negative).unwrap_err().field, "items[0].unit_price");
    }

    #[test]
    fn oversized_totals_are_rejected() {
        let huge = Cents::try_from_major_units(5.0e16).unwrap();
        let items = vec![LineItem::new("p1", "Caneca", 2, huge)];
        let err = checked_total(&items, Cents::from(2000)).unwrap_err();
        assert_eq!(err.field, "items[0].unit_price");
        assert_eq!(err.reason, "total is too large");

        let items = vec![LineItem::new("p1", "Caneca", 1, Cents::from(i64::MAX - 10))];
        assert_eq!(checked_total(&items, Cents::from(11)).unwrap_err().field, "shipping.price");
        assert_eq!(checked_total(&items, Cents::from(10)).unwrap(), Cents::from(i64::MAX));

        let items =
            vec![LineItem::new("p1", "Caneca", 2, Cents::from(5000)), LineItem::new("p2", "Camiseta", 1, Cents::from(5000))];
        assert_eq!(checked_total(&items, Cents::from(2000)).unwrap(), Cents::from(17_000));
    }
}
