use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{OrderId, OrderStatusType, PaymentDetails},
    ogw_api::{
        errors::ReconciliationError,
        side_effects::{book_shipment, send_notification},
    },
    traits::{
        CarrierBooking,
        NotificationType,
        Notifier,
        OrderManagement,
        PaymentGateway,
        PaymentRecord,
        ReconciliationOutcome,
        SideEffectReport,
        SideEffectResult,
        StatusTransition,
    },
};

/// `ReconciliationApi` applies payment notifications to orders.
///
/// Webhooks arrive at least once, in any order, and sometimes concurrently. The API never trusts the webhook body;
/// it fetches the payment from the gateway and then asks the store for a conditional status update. Only the
/// caller whose update changed the row runs the side effects, so replays and races are harmless.
pub struct ReconciliationApi<B, G, N, C> {
    db: B,
    gateway: G,
    notifier: N,
    carrier: C,
}

impl<B, G, N, C> Debug for ReconciliationApi<B, G, N, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, G, N, C> ReconciliationApi<B, G, N, C> {
    pub fn new(db: B, gateway: G, notifier: N, carrier: C) -> Self {
        Self { db, gateway, notifier, carrier }
    }
}

/// The status a payment with this gateway status should move its order to.
pub fn target_status(payment: &PaymentRecord) -> OrderStatusType {
    if payment.status.is_approved() {
        OrderStatusType::InProduction
    } else {
        OrderStatusType::PaymentPending
    }
}

impl<B, G, N, C> ReconciliationApi<B, G, N, C>
where
    B: OrderManagement,
    G: PaymentGateway,
    N: Notifier,
    C: CarrierBooking,
{
    /// Reconciles the order that payment `payment_id` refers to.
    ///
    /// Payments that do not reference one of our orders are ignored. Errors are only returned when the gateway or
    /// the store could not be reached; a failed side effect is reported in the outcome instead.
    pub async fn process_payment_event(&self, payment_id: &str) -> Result<ReconciliationOutcome, ReconciliationError> {
        let payment = self
            .gateway
            .fetch_payment(payment_id)
            .await
            .map_err(|source| ReconciliationError::Gateway { payment_id: payment_id.to_string(), source })?;
        trace!("💳️ Payment {payment_id} has status {}", payment.status);
        let Some(order_id) = payment.order_id() else {
            let reason = format!("payment {payment_id} has no usable external reference ({:?})", payment.external_reference);
            info!("💳️ Ignoring event: {reason}");
            return Ok(ReconciliationOutcome::Ignored { reason });
        };
        let Some(order) = self.db.fetch_order_by_id(order_id).await? else {
            let reason = format!("payment {payment_id} refers to order {order_id}, which does not exist");
            info!("💳️ Ignoring event: {reason}");
            return Ok(ReconciliationOutcome::Ignored { reason });
        };

        let target = target_status(&payment);
        let details = if target == OrderStatusType::InProduction {
            PaymentDetails::new(&payment.payment_id).with_method(payment.method.clone(), payment.card_last_four.clone())
        } else {
            PaymentDetails::new(&payment.payment_id)
        };
        let transition = StatusTransition::to(target).with_payment(details);
        if !self.db.transition_status(order_id, &transition).await? {
            // Another writer (most likely the sweep) may have moved the order after it was read above
            let current = self.current_status(order_id).await.unwrap_or(order.status);
            if current == OrderStatusType::CancelledExpired && target == OrderStatusType::InProduction {
                warn!(
                    "💳️ Payment {payment_id} was approved for order {order_id}, but the order has already expired. \
                     The payment needs to be handled manually."
                );
            } else {
                info!(
                    "💳️ Payment {payment_id} ({}) for order {order_id} did not change the order. It is {current}. \
                     Treating the event as a duplicate.",
                    payment.status
                );
            }
            return Ok(ReconciliationOutcome::Duplicate { order_id, target, current });
        }
        info!("💳️ Order {order_id} moved from {} to {target} by payment {payment_id}", order.status);

        let side_effects = match target {
            OrderStatusType::InProduction => self.on_paid(order_id).await,
            _ => SideEffectReport::none(),
        };
        Ok(ReconciliationOutcome::Transitioned { order_id, status: target, side_effects })
    }

    async fn current_status(&self, order_id: OrderId) -> Option<OrderStatusType> {
        match self.db.fetch_order_by_id(order_id).await {
            Ok(order) => order.map(|o| o.status),
            Err(e) => {
                warn!("💳️ Could not re-read order {order_id}. {e}");
                None
            },
        }
    }

    async fn on_paid(&self, order_id: OrderId) -> SideEffectReport {
        // Re-read so that the email and booking see the payment details that were just written
        let order = match self.db.fetch_order_by_id(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                error!("💳️ Order {order_id} vanished straight after it was paid. No side effects will run.");
                let failed = || SideEffectResult::Failed("order could not be re-read".to_string());
                return SideEffectReport { confirmation_email: failed(), carrier_booking: failed() };
            },
            Err(e) => {
                error!("💳️ Could not re-read paid order {order_id}. No side effects will run. {e}");
                let failed = || SideEffectResult::Failed(e.to_string());
                return SideEffectReport { confirmation_email: failed(), carrier_booking: failed() };
            },
        };
        let confirmation_email = send_notification(&self.notifier, &order, NotificationType::Confirmation).await;
        let carrier_booking = book_shipment(&self.db, &self.carrier, &order).await;
        SideEffectReport { confirmation_email, carrier_booking }
    }
}
