use log::*;
use reqwest::Method;
use serde::Deserialize;

use crate::{
    config::PostalConfig,
    data_objects::PostalAddress,
    retry::{with_retries, RetryPolicy},
    rest::RestClient,
    ProviderApiError,
};

#[derive(Debug, Deserialize)]
struct ViaCepAddress {
    #[serde(default)]
    cep: String,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    /// Present (as `true` or `"true"`) when the CEP does not exist
    #[serde(default)]
    erro: Option<serde_json::Value>,
}

impl ViaCepAddress {
    fn is_error(&self) -> bool {
        match &self.erro {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s != "false",
            Some(_) => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BrasilApiAddress {
    cep: String,
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    neighborhood: Option<String>,
    city: String,
    state: String,
}

/// Resolves CEPs into addresses. The primary source is tried first; if it fails for any reason the fallback source
/// is asked. Each source gets its own retry budget.
#[derive(Clone)]
pub struct PostalApi {
    config: PostalConfig,
    primary: RestClient,
    fallback: RestClient,
}

impl PostalApi {
    pub fn new(config: PostalConfig) -> Result<Self, ProviderApiError> {
        let primary = RestClient::new(&config.primary_url, &[], &config.http)?;
        let fallback = RestClient::new(&config.fallback_url, &[], &config.http)?;
        Ok(Self { config, primary, fallback })
    }

    /// `cep` must already be normalised to 8 digits.
    pub async fn lookup(&self, cep: &str) -> Result<PostalAddress, ProviderApiError> {
        match self.lookup_primary(cep).await {
            Ok(address) => Ok(address),
            Err(e) => {
                warn!("📮️ Primary postal lookup for {cep} failed. Trying the fallback source. {e}");
                let address = self.lookup_fallback(cep).await.map_err(|e| {
                    warn!("📮️ Fallback postal lookup for {cep} failed too. {e}");
                    e
                })?;
                Ok(address)
            },
        }
    }

    async fn lookup_primary(&self, cep: &str) -> Result<PostalAddress, ProviderApiError> {
        let path = format!("/ws/{cep}/json/");
        let result = with_retries("postal lookup (primary)", self.config.http.retry, RetryPolicy::Transient, || {
            self.primary.rest_query::<ViaCepAddress, ()>(Method::GET, &path, None)
        })
        .await?;
        if result.is_error() {
            return Err(ProviderApiError::NotFound(format!("CEP {cep}")));
        }
        debug!("📮️ Resolved {cep} with the primary source");
        Ok(PostalAddress {
            postal_code: ogw_common::helpers::digits_only(&result.cep),
            street: result.logradouro,
            district: result.bairro,
            city: result.localidade,
            state: result.uf,
            source: "viacep".to_string(),
        })
    }

    async fn lookup_fallback(&self, cep: &str) -> Result<PostalAddress, ProviderApiError> {
        let path = format!("/api/cep/v1/{cep}");
        let result = with_retries("postal lookup (fallback)", self.config.http.retry, RetryPolicy::Transient, || {
            self.fallback.rest_query::<BrasilApiAddress, ()>(Method::GET, &path, None)
        })
        .await?;
        debug!("📮️ Resolved {cep} with the fallback source");
        Ok(PostalAddress {
            postal_code: ogw_common::helpers::digits_only(&result.cep),
            street: result.street.unwrap_or_default(),
            district: result.neighborhood.unwrap_or_default(),
            city: result.city,
            state: result.state,
            source: "brasilapi".to_string(),
        })
    }
}
