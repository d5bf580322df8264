use std::fmt::Debug;

use log::*;

use crate::{
    db_types::OrderStatusType,
    ogw_api::{errors::FulfillmentError, side_effects::send_notification},
    traits::{NotificationType, Notifier, OrderManagement, StatusTransition, TrackingOutcome},
};

/// `FulfillmentApi` applies carrier notifications to orders that are in production.
pub struct FulfillmentApi<B, N> {
    db: B,
    notifier: N,
}

impl<B, N> Debug for FulfillmentApi<B, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FulfillmentApi")
    }
}

impl<B, N> FulfillmentApi<B, N> {
    pub fn new(db: B, notifier: N) -> Self {
        Self { db, notifier }
    }
}

impl<B, N> FulfillmentApi<B, N>
where
    B: OrderManagement,
    N: Notifier,
{
    /// Records the tracking code for the order booked as `shipment_id` and moves it to `SHIPPED`.
    ///
    /// The tracking email is sent only by the call that made the transition.
    pub async fn record_tracking(
        &self,
        shipment_id: &str,
        tracking_code: &str,
    ) -> Result<TrackingOutcome, FulfillmentError> {
        let tracking_code = tracking_code.trim();
        if tracking_code.is_empty() {
            return Err(FulfillmentError::EmptyTrackingCode);
        }
        let order = self
            .db
            .fetch_order_by_carrier_shipment_id(shipment_id)
            .await?
            .ok_or_else(|| FulfillmentError::UnknownShipment(shipment_id.to_string()))?;
        let transition = StatusTransition::to(OrderStatusType::Shipped).with_tracking_code(tracking_code);
        if !self.db.transition_status(order.id, &transition).await? {
            info!(
                "🚚️ Tracking code {tracking_code} for order {} ignored. The order is {}, not IN_PRODUCTION.",
                order.id, order.status
            );
            return Ok(TrackingOutcome::Unchanged { order_id: order.id, status: order.status });
        }
        info!("🚚️ Order {} shipped with tracking code {tracking_code}", order.id);
        let mut shipped = order;
        shipped.status = OrderStatusType::Shipped;
        shipped.tracking_code = Some(tracking_code.to_string());
        let tracking_email = send_notification(&self.notifier, &shipped, NotificationType::Tracking).await;
        Ok(TrackingOutcome::Shipped { order_id: shipped.id, tracking_email })
    }
}
