use log::*;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{
    config::MailConfig,
    retry::{with_retries, RetryPolicy},
    rest::RestClient,
    ProviderApiError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SentEmail {
    id: String,
}

/// True if the mail provider refused the message because of who it claims to be from (unverified domain or a
/// malformed `from` field). These are the only rejections worth retrying with another sender.
pub fn is_sender_identity_rejection(err: &ProviderApiError) -> bool {
    match err {
        ProviderApiError::QueryError { status: 403 | 422, message } => {
            let message = message.to_lowercase();
            message.contains("domain") || message.contains("`from`") || message.contains("from field")
        },
        _ => false,
    }
}

#[derive(Clone)]
pub struct MailApi {
    config: MailConfig,
    client: RestClient,
}

impl MailApi {
    pub fn new(config: MailConfig) -> Result<Self, ProviderApiError> {
        let auth = format!("Bearer {}", config.api_key.reveal());
        let client = RestClient::new(&config.api_url, &[("authorization", auth.as_str())], &config.http)?;
        Ok(Self { config, client })
    }

    /// Sends the email and returns the provider's message id.
    pub async fn send(&self, email: &Email) -> Result<String, ProviderApiError> {
        let sent = with_retries("send email", self.config.http.retry, RetryPolicy::ConnectionOnly, || {
            self.client.rest_query::<SentEmail, Email>(Method::POST, "/emails", Some(email))
        })
        .await?;
        debug!("📧️ Mail provider accepted \"{}\" as {}", email.subject, sent.id);
        Ok(sent.id)
    }
}
