//! Postal code lookup for the storefront's address form.
use provider_tools::{data_objects::PostalAddress, PostalApi, ProviderApiError};

#[allow(async_fn_in_trait)]
pub trait AddressLookup: Clone {
    /// `cep` is already normalised to 8 digits.
    async fn lookup_postal_code(&self, cep: &str) -> Result<PostalAddress, ProviderApiError>;
}

impl AddressLookup for PostalApi {
    async fn lookup_postal_code(&self, cep: &str) -> Result<PostalAddress, ProviderApiError> {
        self.lookup(cep).await
    }
}
