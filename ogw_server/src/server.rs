use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use ogw_engine::{CheckoutApi, ExpiryApi, FulfillmentApi, LookupApi, ReconciliationApi, SqliteDatabase};
use provider_tools::{CarrierApi, MailApi, PaymentsApi, PostalApi};

use crate::{
    config::ServerConfig,
    data_objects::CronToken,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::{CarrierClient, EmailDispatcher, GatewayClient, MailBackend},
    middleware::SignatureMiddlewareFactory,
    routes::{
        health,
        CarrierWebhookRoute,
        CheckoutRoute,
        ExpireOrdersRoute,
        OrderLookupRoute,
        PaymentWebhookRoute,
        PostalCodeRoute,
        ShippingQuoteRoute,
    },
};

/// The concrete clients for every external system the server talks to.
#[derive(Clone)]
pub struct Integrations {
    pub gateway: GatewayClient,
    pub carrier: CarrierClient,
    pub mailer: EmailDispatcher,
    pub postal: PostalApi,
}

impl Integrations {
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let init_err = |e: provider_tools::ProviderApiError| ServerError::InitializeError(e.to_string());
        let gateway = GatewayClient::new(PaymentsApi::new(config.payments.clone()).map_err(init_err)?);
        let carrier_api = CarrierApi::new(config.carrier.clone()).map_err(init_err)?;
        let carrier = CarrierClient::new(carrier_api, config.shipping.clone());
        let backend = if config.mail.api_key.is_blank() {
            warn!("📧️ No mail API key is configured. Emails will only be written to the log.");
            MailBackend::LogOnly
        } else {
            MailBackend::Http(MailApi::new(config.mail.clone()).map_err(init_err)?)
        };
        let mailer = EmailDispatcher::new(backend, config.mail_identity.clone());
        let postal = PostalApi::new(config.postal.clone()).map_err(init_err)?;
        Ok(Self { gateway, carrier, mailer, postal })
    }
}

/// Malformed JSON bodies get the same `{"error": ..}` shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let integrations = Integrations::from_config(&config)?;
    if config.webhook_secret.is_none() {
        warn!("🔐️ No webhook secret is configured. Payment webhook signatures will NOT be checked.");
    }
    if !CronToken::new(config.cron_token.clone()).is_enabled() {
        warn!("🔐️ No cron token is configured. Anyone can trigger the expiry sweep.");
    }
    if let Some(interval) = config.sweep_interval {
        let api = ExpiryApi::new(db.clone(), integrations.mailer.clone());
        // Runs until the runtime shuts down
        let _ = start_expiry_worker(api, interval);
    }
    let srv = create_server_instance(config, db, integrations)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    integrations: Integrations,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let Integrations { gateway, carrier, mailer, postal } = integrations.clone();
        let checkout_api = CheckoutApi::new(db.clone(), gateway.clone(), config.payment_window);
        let reconciliation_api = ReconciliationApi::new(db.clone(), gateway, mailer.clone(), carrier.clone());
        let fulfillment_api = FulfillmentApi::new(db.clone(), mailer.clone());
        let expiry_api = ExpiryApi::new(db.clone(), mailer);
        let lookup_api = LookupApi::new(db.clone());
        // The payment scope must be registered before `/webhooks`, which would otherwise swallow it
        let payment_scope = web::scope("/webhooks/payments")
            .wrap(SignatureMiddlewareFactory::new(config.webhook_secret.clone()))
            .service(PaymentWebhookRoute::<SqliteDatabase, GatewayClient, EmailDispatcher, CarrierClient>::new());
        let webhook_scope =
            web::scope("/webhooks").service(CarrierWebhookRoute::<SqliteDatabase, EmailDispatcher>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ogw::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(fulfillment_api))
            .app_data(web::Data::new(expiry_api))
            .app_data(web::Data::new(lookup_api))
            .app_data(web::Data::new(postal))
            .app_data(web::Data::new(carrier))
            .app_data(web::Data::new(CronToken::new(config.cron_token.clone())))
            .service(health)
            .service(CheckoutRoute::<SqliteDatabase, GatewayClient>::new())
            .service(payment_scope)
            .service(webhook_scope)
            .service(ExpireOrdersRoute::<SqliteDatabase, EmailDispatcher>::new())
            .service(OrderLookupRoute::<SqliteDatabase>::new())
            .service(PostalCodeRoute::<PostalApi>::new())
            .service(ShippingQuoteRoute::<CarrierClient>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
