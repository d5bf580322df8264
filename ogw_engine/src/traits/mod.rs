//! # Collaborator contracts
//!
//! The engine is provider-agnostic. Everything it talks to is described by a trait in this module, and concrete
//! backends live elsewhere (the SQLite store in [`crate::sqlite`], HTTP adapters in the server crate).
//!
//! * [`OrderManagement`] is the order store. All writes are conditional updates that report whether they applied.
//! * [`PaymentGateway`] fetches authoritative payment records and opens checkout sessions.
//! * [`CarrierBooking`] books shipments for paid orders.
//! * [`Notifier`] sends transactional email.
mod carrier_booking;
mod data_objects;
mod notifier;
mod order_management;
mod payment_gateway;

pub use carrier_booking::{BookingError, CarrierBooking};
pub use data_objects::{ReconciliationOutcome, SideEffectReport, SideEffectResult, SweepResult, TrackingOutcome};
pub use notifier::{NotificationError, NotificationType, Notifier};
pub use order_management::{OrderManagement, OrderStoreError, StatusTransition};
pub use payment_gateway::{CheckoutSession, GatewayError, PaymentGateway, PaymentRecord, PaymentStatus};
