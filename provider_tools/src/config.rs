//! Client configuration. These are plain values; reading them from the environment is the server's job.
use std::time::Duration;

use ogw_common::Secret;

use crate::retry::RetryConfig;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout: DEFAULT_HTTP_TIMEOUT, retry: RetryConfig::default() }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    pub api_url: String,
    pub access_token: Secret<String>,
    /// Where the gateway should send payment webhooks
    pub notification_url: String,
    /// Storefront page the customer returns to after paying
    pub back_url: String,
    pub http: HttpConfig,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.mercadopago.com".to_string(),
            access_token: Secret::default(),
            notification_url: "http://localhost:8370/webhooks/payments".to_string(),
            back_url: "http://localhost:3000".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CarrierConfig {
    pub api_url: String,
    pub token: Secret<String>,
    /// The carrier requires a contact in the User-Agent
    pub user_agent: String,
    pub http: HttpConfig,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            api_url: "https://sandbox.melhorenvio.com.br".to_string(),
            token: Secret::default(),
            user_agent: "order-gateway (contato@example.com)".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostalConfig {
    pub primary_url: String,
    pub fallback_url: String,
    pub http: HttpConfig,
}

impl Default for PostalConfig {
    fn default() -> Self {
        Self {
            primary_url: "https://viacep.com.br".to_string(),
            fallback_url: "https://brasilapi.com.br".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub http: HttpConfig,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self { api_url: "https://api.resend.com".to_string(), api_key: Secret::default(), http: HttpConfig::default() }
    }
}
