use std::fmt::Debug;

use log::*;
use ogw_common::helpers::normalize_email;

use crate::{
    helpers::{normalize_cpf, require_non_empty},
    ogw_api::{
        errors::LookupError,
        order_objects::{LookupQuery, OrderSnapshot},
    },
    traits::OrderManagement,
};

/// `LookupApi` lets customers check on an order without an account.
pub struct LookupApi<B> {
    db: B,
}

impl<B> Debug for LookupApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LookupApi")
    }
}

impl<B> LookupApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> LookupApi<B>
where B: OrderManagement
{
    pub async fn lookup(&self, query: LookupQuery) -> Result<OrderSnapshot, LookupError> {
        match query {
            LookupQuery::ByCpf { cpf, email } => self.by_cpf(&cpf, &email).await,
            LookupQuery::ByTrackingCode { tracking_code, email } => self.by_tracking_code(&tracking_code, &email).await,
        }
    }

    pub async fn by_cpf(&self, cpf: &str, email: &str) -> Result<OrderSnapshot, LookupError> {
        require_non_empty("email", email)?;
        // A CPF that fails its checksum cannot belong to any order
        let cpf = normalize_cpf(cpf).map_err(|_| LookupError::NotFound)?;
        let email = normalize_email(email);
        let order = self.db.fetch_order_by_cpf_and_email(&cpf, &email).await?.ok_or_else(|| {
            debug!("🔎️ No order for the given CPF and email");
            LookupError::NotFound
        })?;
        Ok(OrderSnapshot::from(order))
    }

    pub async fn by_tracking_code(&self, tracking_code: &str, email: &str) -> Result<OrderSnapshot, LookupError> {
        require_non_empty("email", email)?;
        require_non_empty("tracking_code", tracking_code)?;
        let email = normalize_email(email);
        let code = tracking_code.trim();
        let order = self.db.fetch_order_by_tracking_code_and_email(code, &email).await?.ok_or_else(|| {
            debug!("🔎️ No order for tracking code {code} and the given email");
            LookupError::NotFound
        })?;
        Ok(OrderSnapshot::from(order))
    }
}
