//! # Order Gateway server
//! The HTTP face of the order gateway. It is responsible for:
//! * Turning storefront carts into orders and hosted checkout sessions.
//! * Receiving payment gateway notifications, reconciling them against the order store and triggering the
//!   confirmation email and carrier booking.
//! * Receiving carrier tracking notifications.
//! * Expiring unpaid orders, on a schedule or in-process.
//! * Letting customers look up their orders.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /checkout`: Creates an order and returns the checkout redirect.
//! * `POST /webhooks/payments`: Payment notifications. Signed; see [middleware].
//! * `POST /webhooks/carrier`: Carrier tracking notifications.
//! * `GET /cron/expire-orders`: Runs the expiry sweep.
//! * `POST /orders/lookup`: Customer order lookup.
//! * `GET /postal-code/{cep}`: Address lookup for a CEP.
//! * `POST /shipping/quote`: Carrier quotes for a cart.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
