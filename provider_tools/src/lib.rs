//! REST clients for the third-party services the order gateway talks to: the payment gateway, the carrier, the
//! postal-code services and the mail provider.
mod carrier;
mod config;
mod error;
mod mail;
mod payments;
mod postal;
mod rest;

pub mod data_objects;
pub mod helpers;
pub mod retry;

pub use carrier::{
    CarrierApi,
    CarrierQuote,
    PackageVolume,
    QuotePostalCode,
    QuoteProduct,
    QuoteRequest,
    ShipmentOptions,
    ShipmentParty,
    ShipmentProduct,
    ShipmentRequest,
    ShipmentTag,
};
pub use config::{CarrierConfig, HttpConfig, MailConfig, PaymentsConfig, PostalConfig, DEFAULT_HTTP_TIMEOUT};
pub use error::ProviderApiError;
pub use mail::{is_sender_identity_rejection, Email, MailApi};
pub use payments::{GatewayCard, GatewayPayment, PaymentsApi};
pub use postal::PostalApi;
