use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::OrderStatusType,
    ogw_api::side_effects::send_notification,
    traits::{NotificationType, Notifier, OrderManagement, OrderStoreError, StatusTransition, SweepResult},
};

/// `ExpiryApi` cancels orders whose payment window has closed.
pub struct ExpiryApi<B, N> {
    db: B,
    notifier: N,
}

impl<B, N> Debug for ExpiryApi<B, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExpiryApi")
    }
}

impl<B, N> ExpiryApi<B, N> {
    pub fn new(db: B, notifier: N) -> Self {
        Self { db, notifier }
    }
}

impl<B, N> ExpiryApi<B, N>
where
    B: OrderManagement,
    N: Notifier,
{
    /// Moves every order that is still waiting for payment, and whose deadline is strictly before `now`, to
    /// `CANCELLED_EXPIRED`, and emails the customer for each order this sweep actually cancelled.
    ///
    /// A payment approval that lands between the scan and the update wins the race and the order is counted in
    /// `lost_races` instead. A store error on one order is counted in `store_errors` and the sweep moves on. Only a
    /// failure to scan for candidates is returned as an error.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepResult, OrderStoreError> {
        let candidates = self.db.fetch_expired_orders(now).await?;
        if candidates.is_empty() {
            trace!("🕰️ No orders have passed their payment deadline");
            return Ok(SweepResult::default());
        }
        debug!("🕰️ {} orders have passed their payment deadline", candidates.len());
        let mut result = SweepResult::default();
        let transition = StatusTransition::to(OrderStatusType::CancelledExpired);
        for mut order in candidates {
            match self.db.transition_status(order.id, &transition).await {
                Ok(true) => {},
                Ok(false) => {
                    info!("🕰️ Order {} changed status before it could be expired. Skipping.", order.id);
                    result.lost_races += 1;
                    continue;
                },
                Err(e) => {
                    error!("🕰️ Could not expire order {}. It will be retried on the next sweep. {e}", order.id);
                    result.store_errors += 1;
                    continue;
                },
            }
            info!("🕰️ Order {} expired. Its payment window closed at {}", order.id, order.payment_expires_at);
            order.status = OrderStatusType::CancelledExpired;
            if send_notification(&self.notifier, &order, NotificationType::Expiry).await.is_failure() {
                result.notification_failures += 1;
            }
            result.expired.push(order);
        }
        info!(
            "🕰️ Expiry sweep complete. {} expired, {} lost races, {} store errors, {} notification failures",
            result.expired.len(),
            result.lost_races,
            result.store_errors,
            result.notification_failures
        );
        Ok(result)
    }
}
