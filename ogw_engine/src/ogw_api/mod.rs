//! # Order gateway engine API
//!
//! The `ogw_api` module exposes the programmatic API of the order gateway. Each API is a small struct that owns the
//! collaborators it needs, so the server only wires up what each route uses.
//!
//! * [`checkout_api`] validates carts, stores new orders and opens checkout sessions.
//! * [`reconciliation_api`] applies payment webhooks to orders. This is where the status machine lives.
//! * [`expiry_api`] cancels orders whose payment window has closed.
//! * [`fulfillment_api`] applies carrier tracking notifications.
//! * [`lookup_api`] returns sanitized order snapshots to customers.
//!
//! # API usage
//!
//! An API instance is created by supplying backends that implement the traits in [`crate::traits`].
//!
//! ```rust,ignore
//! use ogw_engine::{ReconciliationApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = ReconciliationApi::new(db, gateway, mailer, carrier);
//! let outcome = api.process_payment_event("123456789").await?;
//! ```
pub mod checkout_api;
pub mod errors;
pub mod expiry_api;
pub mod fulfillment_api;
pub mod lookup_api;
pub mod order_objects;
pub mod reconciliation_api;
pub mod side_effects;
