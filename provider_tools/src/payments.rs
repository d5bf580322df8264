use chrono::{DateTime, SecondsFormat, Utc};
use log::*;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{
    config::PaymentsConfig,
    data_objects::{BackUrls, NewPreference, Preference},
    helpers::string_or_number,
    retry::{with_retries, RetryPolicy},
    rest::RestClient,
    ProviderApiError,
};

/// A payment as the gateway reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub payment_type_id: Option<String>,
    #[serde(default)]
    pub card: Option<GatewayCard>,
    #[serde(default)]
    pub external_reference: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayCard {
    #[serde(default)]
    pub last_four_digits: Option<String>,
}

impl GatewayPayment {
    pub fn card_last_four(&self) -> Option<String> {
        self.card.as_ref().and_then(|c| c.last_four_digits.clone())
    }
}

#[derive(Clone)]
pub struct PaymentsApi {
    config: PaymentsConfig,
    client: RestClient,
}

impl PaymentsApi {
    pub fn new(config: PaymentsConfig) -> Result<Self, ProviderApiError> {
        let auth = format!("Bearer {}", config.access_token.reveal());
        let client = RestClient::new(&config.api_url, &[("authorization", auth.as_str())], &config.http)?;
        Ok(Self { config, client })
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, ProviderApiError> {
        let path = format!("/v1/payments/{payment_id}");
        debug!("Fetching payment {payment_id}");
        let payment = with_retries("fetch payment", self.config.http.retry, RetryPolicy::Transient, || {
            self.client.rest_query::<GatewayPayment, ()>(Method::GET, &path, None)
        })
        .await?;
        info!("Fetched payment {payment_id}. Status: {}", payment.status);
        Ok(payment)
    }

    /// Creates a checkout preference. The notification URL and back-URLs come from the configuration.
    pub async fn create_preference(
        &self,
        mut preference: NewPreference,
        expires_at: DateTime<Utc>,
    ) -> Result<Preference, ProviderApiError> {
        preference.notification_url = Some(self.config.notification_url.clone());
        preference.back_urls = Some(BackUrls::all(&self.config.back_url));
        preference.auto_return = Some("approved".to_string());
        preference.expires = true;
        preference.expiration_date_to = Some(expires_at.to_rfc3339_opts(SecondsFormat::Millis, true));
        debug!("Creating checkout preference for {}", preference.external_reference);
        // Creating a preference is not idempotent, so only retry if the request never left
        let result = with_retries("create preference", self.config.http.retry, RetryPolicy::ConnectionOnly, || {
            self.client.rest_query::<Preference, NewPreference>(Method::POST, "/checkout/preferences", Some(&preference))
        })
        .await?;
        info!("Created checkout preference {} for {}", result.id, preference.external_reference);
        Ok(result)
    }
}
