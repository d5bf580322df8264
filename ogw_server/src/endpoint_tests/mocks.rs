use chrono::{DateTime, Utc};
use mockall::mock;
use ogw_engine::{
    db_types::{LineItem, NewOrder, Order, OrderId, ShippingOption},
    traits::StatusTransition,
    OrderManagement,
    OrderStoreError,
};
use provider_tools::{data_objects::PostalAddress, ProviderApiError};

use crate::integrations::{AddressLookup, ShippingQuotes};

mock! {
    pub OrderStore {}
    impl Clone for OrderStore {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for OrderStore {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;
        async fn fetch_order_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_by_carrier_shipment_id(&self, shipment_id: &str) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_by_cpf_and_email(&self, cpf: &str, email: &str) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_by_tracking_code_and_email(&self, tracking_code: &str, email: &str) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_expired_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>, OrderStoreError>;
        async fn set_checkout_session_id(&self, id: OrderId, session_id: &str) -> Result<(), OrderStoreError>;
        async fn transition_status(&self, id: OrderId, transition: &StatusTransition) -> Result<bool, OrderStoreError>;
        async fn set_carrier_shipment_id(&self, id: OrderId, shipment_id: &str) -> Result<bool, OrderStoreError>;
    }
}

mock! {
    pub Postal {}
    impl Clone for Postal {
        fn clone(&self) -> Self;
    }
    impl AddressLookup for Postal {
        async fn lookup_postal_code(&self, cep: &str) -> Result<PostalAddress, ProviderApiError>;
    }
}

mock! {
    pub Quotes {}
    impl Clone for Quotes {
        fn clone(&self) -> Self;
    }
    impl ShippingQuotes for Quotes {
        async fn quote(&self, postal_code: &str, items: &[LineItem]) -> Result<Vec<ShippingOption>, ProviderApiError>;
    }
}
