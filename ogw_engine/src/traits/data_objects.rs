use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, OrderStatusType};

/// What happened when a best-effort side effect was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideEffectResult {
    Succeeded,
    Skipped(String),
    Failed(String),
}

impl SideEffectResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, SideEffectResult::Failed(_))
    }
}

impl Display for SideEffectResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SideEffectResult::Succeeded => write!(f, "succeeded"),
            SideEffectResult::Skipped(reason) => write!(f, "skipped ({reason})"),
            SideEffectResult::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// The side effects run after an order was moved into `IN_PRODUCTION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffectReport {
    pub confirmation_email: SideEffectResult,
    pub carrier_booking: SideEffectResult,
}

impl SideEffectReport {
    pub fn none() -> Self {
        let skipped = || SideEffectResult::Skipped("no side effects for this transition".to_string());
        Self { confirmation_email: skipped(), carrier_booking: skipped() }
    }
}

/// The result of reconciling one payment event against the order store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationOutcome {
    /// The event does not refer to one of our orders. Nothing was changed.
    Ignored { reason: String },
    /// The conditional update did not match. Another delivery already moved the order, or the order is past
    /// the point where this event applies.
    /// `current` is the order's status as re-read after the update did not match.
    Duplicate { order_id: OrderId, target: OrderStatusType, current: OrderStatusType },
    /// This call moved the order.
    Transitioned { order_id: OrderId, status: OrderStatusType, side_effects: SideEffectReport },
}

impl ReconciliationOutcome {
    pub fn is_transition(&self) -> bool {
        matches!(self, ReconciliationOutcome::Transitioned { .. })
    }
}

/// The result of a single expiry sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepResult {
    /// Orders this sweep moved to `CANCELLED_EXPIRED`
    pub expired: Vec<Order>,
    /// Candidates that another writer moved before this sweep could
    pub lost_races: usize,
    /// Candidates whose update failed. They are still expirable and are picked up again next time.
    pub store_errors: usize,
    pub notification_failures: usize,
}

impl SweepResult {
    pub fn expired_count(&self) -> usize {
        self.expired.len()
    }
}

/// The result of applying a carrier tracking notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingOutcome {
    /// This call moved the order to `SHIPPED`.
    Shipped { order_id: OrderId, tracking_email: SideEffectResult },
    /// The order was not `IN_PRODUCTION` (most likely already shipped).
    Unchanged { order_id: OrderId, status: OrderStatusType },
}
