//! Server configuration.
//!
//! Everything is read once, at startup, from `OGW_*` environment variables (a `.env` file is honoured). Invalid
//! values are logged and replaced with the defaults; components receive the parts they need through their
//! constructors and never read the environment themselves.
use std::{env, env::VarError, fmt::Display, str::FromStr, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use ogw_common::Secret;
use ogw_engine::{sqlite::db::SQLITE_DB_URL, DEFAULT_PAYMENT_WINDOW_MINUTES};
use provider_tools::{
    retry::RetryConfig,
    CarrierConfig,
    HttpConfig,
    MailConfig,
    PaymentsConfig,
    PostalConfig,
    DEFAULT_HTTP_TIMEOUT,
};

const DEFAULT_OGW_HOST: &str = "127.0.0.1";
const DEFAULT_OGW_PORT: u16 = 8370;
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8370";
const DEFAULT_STORE_URL: &str = "http://localhost:3000";
const DEFAULT_ITEM_WEIGHT_KG: f64 = 0.3;
const DEFAULT_MIN_PACKAGE_WEIGHT_KG: f64 = 0.3;
const DEFAULT_MAIL_FROM: &str = "Pedidos <pedidos@example.com>";
const DEFAULT_HTTP_RETRIES: u32 = 3;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The address the payment gateway uses to reach this server
    pub public_url: String,
    pub payment_window: Duration,
    pub payments: PaymentsConfig,
    /// Shared secret for payment webhook signatures. `None` switches verification off.
    pub webhook_secret: Option<Secret<String>>,
    pub carrier: CarrierConfig,
    pub shipping: ShippingConfig,
    pub mail: MailConfig,
    pub mail_identity: MailIdentity,
    pub postal: PostalConfig,
    /// Token guarding the sweep endpoint. `None` leaves the endpoint open.
    pub cron_token: Option<Secret<String>>,
    /// Run the expiry sweep in-process at this interval
    pub sweep_interval: Option<StdDuration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OGW_HOST.to_string(),
            port: DEFAULT_OGW_PORT,
            database_url: SQLITE_DB_URL.to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            payment_window: Duration::minutes(DEFAULT_PAYMENT_WINDOW_MINUTES),
            payments: PaymentsConfig::default(),
            webhook_secret: None,
            carrier: CarrierConfig::default(),
            shipping: ShippingConfig::default(),
            mail: MailConfig::default(),
            mail_identity: MailIdentity::default(),
            postal: PostalConfig::default(),
            cron_token: None,
            sweep_interval: None,
        }
    }
}

//-------------------------------------------------  Shipping  ---------------------------------------------------------
/// The fixed sender block printed on every shipping label.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SenderConfig {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub document: String,
    pub street: String,
    pub number: String,
    pub district: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// Centimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackageDimensions {
    pub height: f64,
    pub width: f64,
    pub length: f64,
}

impl Default for PackageDimensions {
    fn default() -> Self {
        Self { height: 10.0, width: 15.0, length: 20.0 }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShippingConfig {
    pub sender: SenderConfig,
    /// Weight of a single unit of any product, in kg
    pub item_weight_kg: f64,
    /// Packages are never declared lighter than this
    pub min_package_weight_kg: f64,
    pub package: PackageDimensions,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            sender: SenderConfig::default(),
            item_weight_kg: DEFAULT_ITEM_WEIGHT_KG,
            min_package_weight_kg: DEFAULT_MIN_PACKAGE_WEIGHT_KG,
            package: PackageDimensions::default(),
        }
    }
}

//-------------------------------------------------  Mail  -------------------------------------------------------------
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailIdentity {
    pub from: String,
    /// A sender on a verified domain, used once if the provider rejects `from`
    pub fallback_from: Option<String>,
    /// Receives a blind copy of every confirmation email
    pub operator_bcc: Option<String>,
}

impl Default for MailIdentity {
    fn default() -> Self {
        Self { from: DEFAULT_MAIL_FROM.to_string(), fallback_from: None, operator_bcc: None }
    }
}

//-------------------------------------------------  Loading  ----------------------------------------------------------
impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OGW_HOST").ok().unwrap_or_else(|| DEFAULT_OGW_HOST.into());
        let port = parse_env("OGW_PORT", env::var("OGW_PORT"), DEFAULT_OGW_PORT);
        let database_url = env::var("OGW_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ OGW_DATABASE_URL is not set. Using {SQLITE_DB_URL}.");
            SQLITE_DB_URL.to_string()
        });
        let public_url = env::var("OGW_PUBLIC_URL")
            .ok()
            .unwrap_or_else(|| {
                warn!(
                    "🪛️ OGW_PUBLIC_URL is not set. The payment gateway will be told to send webhooks to \
                     {DEFAULT_PUBLIC_URL}, which it probably cannot reach."
                );
                DEFAULT_PUBLIC_URL.to_string()
            })
            .trim_end_matches('/')
            .to_string();
        let window_minutes = parse_env(
            "OGW_PAYMENT_WINDOW_MINUTES",
            env::var("OGW_PAYMENT_WINDOW_MINUTES"),
            DEFAULT_PAYMENT_WINDOW_MINUTES,
        );
        let window_minutes = if window_minutes > 0 {
            window_minutes
        } else {
            warn!("🪛️ OGW_PAYMENT_WINDOW_MINUTES must be positive. Using {DEFAULT_PAYMENT_WINDOW_MINUTES} minutes.");
            DEFAULT_PAYMENT_WINDOW_MINUTES
        };
        let http = http_config_from_env();
        let payments = payments_config_from_env(&public_url, http);
        let webhook_secret = optional_secret("OGW_GATEWAY_WEBHOOK_SECRET");
        let carrier = carrier_config_from_env(http);
        let shipping = shipping_config_from_env();
        let (mail, mail_identity) = mail_config_from_env(http);
        let postal = postal_config_from_env(http);
        let cron_token = optional_secret("OGW_CRON_TOKEN");
        if cron_token.is_none() {
            warn!("🪛️ OGW_CRON_TOKEN is not set. Anyone can trigger the expiry sweep.");
        }
        let sweep_interval = env::var("OGW_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| {
                s.trim()
                    .parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for OGW_SWEEP_INTERVAL_SECS. {e}"))
                    .ok()
            })
            .filter(|secs| *secs > 0)
            .map(StdDuration::from_secs);
        Self {
            host,
            port,
            database_url,
            public_url,
            payment_window: Duration::minutes(window_minutes),
            payments,
            webhook_secret,
            carrier,
            shipping,
            mail,
            mail_identity,
            postal,
            cron_token,
            sweep_interval,
        }
    }
}

/// Parses an environment value, logging and falling back to `default` if it is missing or invalid.
pub fn parse_env<T>(name: &str, value: Result<String, VarError>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match value {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(VarError::NotPresent) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
        Err(VarError::NotUnicode(_)) => {
            error!("🪛️ {name} is not valid unicode. Using the default, {default}, instead.");
            default
        },
    }
}

fn optional_secret(name: &str) -> Option<Secret<String>> {
    env::var(name).ok().map(Secret::new).and_then(Secret::non_blank)
}

fn required_secret(name: &str) -> Secret<String> {
    optional_secret(name).unwrap_or_else(|| {
        error!("🪛️ {name} is not set. Calls that need it will fail.");
        Secret::default()
    })
}

fn string_or(name: &str, default: &str) -> String {
    env::var(name).ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| default.to_string())
}

fn optional_string(name: &str) -> Option<String> {
    env::var(name).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn http_config_from_env() -> HttpConfig {
    let timeout_secs =
        parse_env("OGW_HTTP_TIMEOUT_SECS", env::var("OGW_HTTP_TIMEOUT_SECS"), DEFAULT_HTTP_TIMEOUT.as_secs());
    let attempts = parse_env("OGW_HTTP_RETRIES", env::var("OGW_HTTP_RETRIES"), DEFAULT_HTTP_RETRIES).max(1);
    let retry = RetryConfig { attempts, ..RetryConfig::default() };
    HttpConfig { timeout: StdDuration::from_secs(timeout_secs.max(1)), retry }
}

fn payments_config_from_env(public_url: &str, http: HttpConfig) -> PaymentsConfig {
    let defaults = PaymentsConfig::default();
    PaymentsConfig {
        api_url: string_or("OGW_GATEWAY_API_URL", &defaults.api_url),
        access_token: required_secret("OGW_GATEWAY_ACCESS_TOKEN"),
        notification_url: format!("{public_url}/webhooks/payments"),
        back_url: string_or("OGW_STORE_URL", DEFAULT_STORE_URL),
        http,
    }
}

fn carrier_config_from_env(http: HttpConfig) -> CarrierConfig {
    let defaults = CarrierConfig::default();
    CarrierConfig {
        api_url: string_or("OGW_CARRIER_API_URL", &defaults.api_url),
        token: required_secret("OGW_CARRIER_TOKEN"),
        user_agent: string_or("OGW_CARRIER_USER_AGENT", &defaults.user_agent),
        http,
    }
}

fn shipping_config_from_env() -> ShippingConfig {
    let sender = SenderConfig {
        name: string_or("OGW_SENDER_NAME", ""),
        phone: string_or("OGW_SENDER_PHONE", ""),
        email: string_or("OGW_SENDER_EMAIL", ""),
        document: string_or("OGW_SENDER_DOCUMENT", ""),
        street: string_or("OGW_SENDER_STREET", ""),
        number: string_or("OGW_SENDER_NUMBER", ""),
        district: string_or("OGW_SENDER_DISTRICT", ""),
        city: string_or("OGW_SENDER_CITY", ""),
        state: string_or("OGW_SENDER_STATE", ""),
        postal_code: string_or("OGW_SENDER_POSTAL_CODE", ""),
    };
    if sender.postal_code.is_empty() {
        warn!("🪛️ OGW_SENDER_POSTAL_CODE is not set. Shipping quotes and bookings will be rejected by the carrier.");
    }
    let dims = PackageDimensions::default();
    ShippingConfig {
        sender,
        item_weight_kg: parse_env("OGW_ITEM_WEIGHT_KG", env::var("OGW_ITEM_WEIGHT_KG"), DEFAULT_ITEM_WEIGHT_KG),
        min_package_weight_kg: parse_env(
            "OGW_MIN_PACKAGE_WEIGHT_KG",
            env::var("OGW_MIN_PACKAGE_WEIGHT_KG"),
            DEFAULT_MIN_PACKAGE_WEIGHT_KG,
        ),
        package: PackageDimensions {
            height: parse_env("OGW_PACKAGE_HEIGHT_CM", env::var("OGW_PACKAGE_HEIGHT_CM"), dims.height),
            width: parse_env("OGW_PACKAGE_WIDTH_CM", env::var("OGW_PACKAGE_WIDTH_CM"), dims.width),
            length: parse_env("OGW_PACKAGE_LENGTH_CM", env::var("OGW_PACKAGE_LENGTH_CM"), dims.length),
        },
    }
}

fn mail_config_from_env(http: HttpConfig) -> (MailConfig, MailIdentity) {
    let defaults = MailConfig::default();
    let api_key = optional_secret("OGW_MAIL_API_KEY").unwrap_or_else(|| {
        warn!("🪛️ OGW_MAIL_API_KEY is not set. Emails will be written to the log instead of being sent.");
        Secret::default()
    });
    let config = MailConfig { api_url: string_or("OGW_MAIL_API_URL", &defaults.api_url), api_key, http };
    let identity = MailIdentity {
        from: string_or("OGW_MAIL_FROM", DEFAULT_MAIL_FROM),
        fallback_from: optional_string("OGW_MAIL_FALLBACK_FROM"),
        operator_bcc: optional_string("OGW_MAIL_OPERATOR_BCC"),
    };
    (config, identity)
}

fn postal_config_from_env(http: HttpConfig) -> PostalConfig {
    let defaults = PostalConfig::default();
    PostalConfig {
        primary_url: string_or("OGW_POSTAL_PRIMARY_URL", &defaults.primary_url),
        fallback_url: string_or("OGW_POSTAL_FALLBACK_URL", &defaults.fallback_url),
        http,
    }
}

#[cfg(test)]
mod test {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn env_values_fall_back_to_defaults() {
        assert_eq!(parse_env("OGW_PORT", Ok("9000".into()), DEFAULT_OGW_PORT), 9000);
        assert_eq!(parse_env("OGW_PORT", Ok(" 9000 ".into()), DEFAULT_OGW_PORT), 9000);
        assert_eq!(parse_env("OGW_PORT", Ok("http".into()), DEFAULT_OGW_PORT), DEFAULT_OGW_PORT);
        assert_eq!(parse_env("OGW_PORT", Ok("70000".into()), DEFAULT_OGW_PORT), DEFAULT_OGW_PORT);
        assert_eq!(parse_env("OGW_PORT", Err(VarError::NotPresent), DEFAULT_OGW_PORT), DEFAULT_OGW_PORT);
        let bad = Err(VarError::NotUnicode(OsString::from("x")));
        assert_eq!(parse_env("OGW_ITEM_WEIGHT_KG", bad, 0.3), 0.3);
        assert_eq!(parse_env("OGW_ITEM_WEIGHT_KG", Ok("0.45".into()), 0.3), 0.45);
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8370);
        assert_eq!(config.payment_window, Duration::minutes(60));
        assert_eq!(config.database_url, "sqlite://data/orders.db");
        assert!(config.webhook_secret.is_none());
        assert!(config.sweep_interval.is_none());
        assert_eq!(config.shipping.package, PackageDimensions { height: 10.0, width: 15.0, length: 20.0 });
        assert_eq!(config.shipping.min_package_weight_kg, 0.3);
    }
}
