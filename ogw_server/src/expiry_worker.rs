use std::time::Duration;

use chrono::Utc;
use log::*;
use ogw_engine::{db_types::Order, ExpiryApi, SqliteDatabase};
use tokio::task::JoinHandle;

use crate::integrations::EmailDispatcher;

/// Starts the in-process expiry sweep. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The sweep is idempotent, so it is safe to run this alongside the cron endpoint.
pub fn start_expiry_worker(api: ExpiryApi<SqliteDatabase, EmailDispatcher>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Order expiry worker started. Sweeping every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            debug!("🕰️ Running order expiry sweep");
            match api.sweep(Utc::now()).await {
                Ok(result) if result.expired_count() > 0 => {
                    info!("🕰️ {} orders expired: {}", result.expired_count(), order_list(&result.expired));
                    if result.store_errors > 0 {
                        warn!("🕰️ {} orders could not be expired and will be retried", result.store_errors);
                    }
                    if result.notification_failures > 0 {
                        warn!("🕰️ {} expiry emails could not be sent", result.notification_failures);
                    }
                },
                Ok(result) if result.store_errors > 0 => {
                    warn!("🕰️ {} orders could not be expired and will be retried", result.store_errors);
                },
                Ok(_) => trace!("🕰️ No orders to expire"),
                Err(e) => {
                    error!("🕰️ Error running order expiry sweep: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders.iter().map(|o| format!("[{}] {}", o.id, o.customer.email)).collect::<Vec<String>>().join(", ")
}
