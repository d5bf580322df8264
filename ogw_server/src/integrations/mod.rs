//! Adapters that connect the engine's collaborator traits to the HTTP clients in `provider_tools`.
pub mod carrier;
pub mod gateway;
pub mod notifications;
pub mod postal;
pub mod templates;

pub use carrier::{CarrierClient, ShippingQuotes};
pub use gateway::GatewayClient;
pub use notifications::{EmailDispatcher, MailBackend};
pub use postal::AddressLookup;
