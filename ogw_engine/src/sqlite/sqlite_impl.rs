//! `SqliteDatabase` is the SQLite implementation of the [`OrderManagement`] order store.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{new_pool, orders};
use crate::{
    db_types::{NewOrder, Order, OrderId},
    traits::{OrderManagement, OrderStoreError, StatusTransition},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn fetch_order_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_carrier_shipment_id(&self, shipment_id: &str) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_carrier_shipment_id(shipment_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_cpf_and_email(&self, cpf: &str, email: &str) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_cpf_and_email(cpf, email, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_tracking_code_and_email(
        &self,
        tracking_code: &str,
        email: &str,
    ) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_tracking_code_and_email(tracking_code, email, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_expired_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_expired_orders(now, &mut conn).await?;
        Ok(orders)
    }

    async fn set_checkout_session_id(&self, id: OrderId, session_id: &str) -> Result<(), OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_checkout_session_id(id, session_id, &mut conn).await
    }

    async fn transition_status(&self, id: OrderId, transition: &StatusTransition) -> Result<bool, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let changed = orders::transition_status(id, transition, &mut conn).await?;
        if changed {
            debug!("🗃️ Order {id} moved to {}", transition.target);
        }
        Ok(changed)
    }

    async fn set_carrier_shipment_id(&self, id: OrderId, shipment_id: &str) -> Result<bool, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let written = orders::set_carrier_shipment_id(id, shipment_id, &mut conn).await?;
        if written {
            debug!("🗃️ Carrier shipment id {shipment_id} stored for order {id}");
        } else {
            warn!("🗃️ Order {id} already has a carrier shipment id. {shipment_id} was not stored.");
        }
        Ok(written)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, OrderStoreError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date with the migrations embedded in this crate.
    pub async fn migrate(&self) -> Result<(), OrderStoreError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
