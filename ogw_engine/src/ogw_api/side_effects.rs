//! Best-effort side effects that follow a committed status transition.
//!
//! None of these return errors. Failures are logged and reported as a [`SideEffectResult`] so that the caller can
//! carry on; a transition that has been committed is never rolled back because an email or booking failed.
use log::*;

use crate::{
    db_types::Order,
    traits::{CarrierBooking, NotificationType, Notifier, OrderManagement, SideEffectResult},
};

pub async fn send_notification<N: Notifier>(notifier: &N, order: &Order, kind: NotificationType) -> SideEffectResult {
    match notifier.notify(order, kind).await {
        Ok(()) => {
            info!("📧️ {kind} email for order {} sent to {}", order.id, order.customer.email);
            SideEffectResult::Succeeded
        },
        Err(e) => {
            error!("📧️ Could not send the {kind} email for order {}. {e}", order.id);
            SideEffectResult::Failed(e.to_string())
        },
    }
}

/// Books the shipment for `order` and stores the carrier's shipment id.
///
/// Orders that already carry a shipment id are skipped. The store only writes the id when none is present, so a
/// booking that slips past this check still cannot overwrite an earlier one.
pub async fn book_shipment<B, C>(db: &B, carrier: &C, order: &Order) -> SideEffectResult
where
    B: OrderManagement,
    C: CarrierBooking,
{
    if let Some(existing) = &order.carrier_shipment_id {
        info!("🚚️ Order {} already has carrier shipment {existing}. Not booking again.", order.id);
        return SideEffectResult::Skipped(format!("already booked as {existing}"));
    }
    let shipment_id = match carrier.book_shipment(order).await {
        Ok(id) => id,
        Err(e) => {
            error!("🚚️ Could not book a shipment for order {}. {e}", order.id);
            return SideEffectResult::Failed(e.to_string());
        },
    };
    match db.set_carrier_shipment_id(order.id, &shipment_id).await {
        Ok(true) => {
            info!("🚚️ Order {} booked with the carrier as {shipment_id}", order.id);
            SideEffectResult::Succeeded
        },
        Ok(false) => SideEffectResult::Skipped(format!("order already had a shipment id; {shipment_id} discarded")),
        Err(e) => {
            error!("🚚️ Order {} was booked as {shipment_id}, but the id could not be stored. {e}", order.id);
            SideEffectResult::Failed(e.to_string())
        },
    }
}
