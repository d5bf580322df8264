//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use ogw_engine::{
    helpers::normalize_postal_code,
    order_objects::{CheckoutRequest, LookupQuery},
    traits::{ReconciliationOutcome, TrackingOutcome},
    CarrierBooking,
    CheckoutApi,
    CheckoutError,
    ExpiryApi,
    FulfillmentApi,
    FulfillmentError,
    LookupApi,
    LookupError,
    Notifier,
    OrderManagement,
    PaymentGateway,
    ReconciliationApi,
};
use provider_tools::ProviderApiError;

use crate::{
    data_objects::{
        CarrierTrackingNotification,
        CronQuery,
        CronToken,
        JsonResponse,
        ShippingQuoteRequest,
        SweepSummary,
        WebhookEvent,
        WebhookQuery,
    },
    errors::ServerError,
    integrations::{AddressLookup, ShippingQuotes},
};

pub const CRON_TOKEN_HEADER: &str = "x-cron-token";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// The handler's type parameters must be declared in the same order as the bounds.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl OrderManagement, PaymentGateway);
/// Route handler for the checkout endpoint
///
/// Validates the cart, stores the order in `AWAITING_PAYMENT` and returns the hosted checkout URL the storefront
/// should redirect the customer to.
///
/// Validation failures are reported with a `400` naming the offending field. If the gateway cannot open a checkout
/// session the order is left to expire. Store and gateway failures both give the customer the same generic message.
pub async fn checkout<B, G>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    trace!("💻️ Received checkout request");
    let response = api.checkout(body.into_inner()).await.map_err(|e| match e {
        CheckoutError::Validation(e) => {
            debug!("💻️ Checkout rejected. {e}");
            ServerError::ValidationError(e.to_string())
        },
        CheckoutError::Store(e) => {
            error!("💻️ Could not store order. {e}");
            ServerError::CheckoutFailed
        },
        CheckoutError::Gateway { order_id, source } => {
            error!("💻️ Order {order_id} has no checkout session. {source}");
            ServerError::CheckoutFailed
        },
    })?;
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Payment webhook  ---------------------------------------------
route!(payment_webhook => Post "" impl OrderManagement, PaymentGateway, Notifier, CarrierBooking);
/// Route handler for payment gateway notifications
///
/// The signature has already been checked by the middleware on the enclosing scope. The notification body is not
/// trusted: only the payment id is taken from the call, and the payment itself is fetched from the gateway.
///
/// The gateway retries anything that is not a 2xx, and every retry would be another duplicate, so this endpoint
/// answers `200` whatever happens here.
pub async fn payment_webhook<B, G, N, C>(
    req: HttpRequest,
    api: web::Data<ReconciliationApi<B, G, N, C>>,
) -> HttpResponse
where
    B: OrderManagement,
    G: PaymentGateway,
    N: Notifier,
    C: CarrierBooking,
{
    trace!("💻️ Received payment webhook: {}", req.query_string());
    let query = web::Query::<WebhookQuery>::from_query(req.query_string()).map(|q| q.into_inner()).unwrap_or_default();
    let payment_id = match WebhookEvent::try_from(&query) {
        Ok(WebhookEvent::Payment { payment_id }) => payment_id,
        Ok(WebhookEvent::Other { topic }) => {
            debug!("💻️ Ignoring {topic} notification");
            return HttpResponse::Ok().json(JsonResponse::success(format!("Ignored {topic} notification")));
        },
        Err(e) => {
            warn!("💻️ Could not decode payment webhook. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure(e));
        },
    };
    match api.process_payment_event(&payment_id).await {
        Ok(ReconciliationOutcome::Transitioned { order_id, status, side_effects }) => {
            info!(
                "💻️ Payment {payment_id} moved order {order_id} to {status}. Confirmation email {}. Carrier booking {}.",
                side_effects.confirmation_email, side_effects.carrier_booking
            );
            HttpResponse::Ok().json(JsonResponse::success(format!("Order {order_id} is now {status}")))
        },
        Ok(ReconciliationOutcome::Duplicate { order_id, target, current }) => {
            debug!(
                "💻️ Payment {payment_id} did not move order {order_id} to {target}. It is {current}. Nothing to do."
            );
            HttpResponse::Ok().json(JsonResponse::success("Already processed"))
        },
        Ok(ReconciliationOutcome::Ignored { reason }) => {
            info!("💻️ Payment {payment_id} ignored. {reason}");
            HttpResponse::Ok().json(JsonResponse::success("Ignored"))
        },
        Err(e) => {
            error!("💻️ Could not reconcile payment {payment_id}. {e}");
            HttpResponse::Ok().json(JsonResponse::failure("Payment could not be processed"))
        },
    }
}

//----------------------------------------------   Carrier webhook  ---------------------------------------------
route!(carrier_webhook => Post "/carrier" impl OrderManagement, Notifier);
/// Route handler for carrier tracking notifications
///
/// Records the tracking code against the order that owns the shipment and moves it to `SHIPPED`. Once the body has
/// been decoded the carrier always gets a `200`.
pub async fn carrier_webhook<B, N>(
    body: web::Json<CarrierTrackingNotification>,
    api: web::Data<FulfillmentApi<B, N>>,
) -> HttpResponse
where
    B: OrderManagement,
    N: Notifier,
{
    let CarrierTrackingNotification { resource_id, tracking_code } = body.into_inner();
    trace!("💻️ Received carrier notification for shipment {resource_id}");
    let Some(code) = tracking_code else {
        debug!("💻️ Carrier notification for {resource_id} has no tracking code yet");
        return HttpResponse::Ok().json(JsonResponse::success("No tracking code"));
    };
    match api.record_tracking(&resource_id, &code).await {
        Ok(TrackingOutcome::Shipped { order_id, tracking_email }) => {
            info!("💻️ Order {order_id} shipped with tracking code {code}. Tracking email {tracking_email}.");
            HttpResponse::Ok().json(JsonResponse::success(format!("Order {order_id} shipped")))
        },
        Ok(TrackingOutcome::Unchanged { order_id, status }) => {
            debug!("💻️ Order {order_id} is {status}. Tracking code {code} was not applied.");
            HttpResponse::Ok().json(JsonResponse::success("Nothing to do"))
        },
        Err(FulfillmentError::UnknownShipment(id)) => {
            warn!("💻️ Carrier notification for unknown shipment {id}");
            HttpResponse::Ok().json(JsonResponse::failure("Unknown shipment"))
        },
        Err(e) => {
            error!("💻️ Could not record tracking code for shipment {resource_id}. {e}");
            HttpResponse::Ok().json(JsonResponse::failure("Tracking code could not be recorded"))
        },
    }
}

//----------------------------------------------   Expiry sweep  ------------------------------------------------
route!(expire_orders => Get "/cron/expire-orders" impl OrderManagement, Notifier);
/// Route handler for the scheduled expiry sweep
///
/// If a cron token is configured, callers must supply it in the `token` query parameter or the `x-cron-token`
/// header.
pub async fn expire_orders<B, N>(
    req: HttpRequest,
    query: web::Query<CronQuery>,
    token: web::Data<CronToken>,
    api: web::Data<ExpiryApi<B, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    N: Notifier,
{
    let supplied = query
        .token
        .as_deref()
        .or_else(|| req.headers().get(CRON_TOKEN_HEADER).and_then(|v| v.to_str().ok()));
    if !token.authorizes(supplied) {
        warn!("💻️ Expiry sweep request with a missing or invalid token");
        return Err(ServerError::Unauthorized);
    }
    let result = api.sweep(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(SweepSummary::from(result)))
}

//----------------------------------------------   Order lookup  ------------------------------------------------
route!(order_lookup => Post "/orders/lookup" impl OrderManagement);
/// Route handler for customer order lookups
///
/// Every failure, including a mismatched email, is answered with the same `404` so that the endpoint cannot be
/// used to discover orders.
pub async fn order_lookup<B: OrderManagement>(
    body: web::Json<LookupQuery>,
    api: web::Data<LookupApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let snapshot = api.lookup(body.into_inner()).await.map_err(|e| {
        match &e {
            LookupError::Store(err) => error!("💻️ Order lookup failed. {err}"),
            _ => debug!("💻️ Order lookup failed. {e}"),
        }
        ServerError::NoRecordFound("Order not found".to_string())
    })?;
    Ok(HttpResponse::Ok().json(snapshot))
}

//----------------------------------------------   Postal lookup  -----------------------------------------------
route!(postal_code => Get "/postal-code/{cep}" impl AddressLookup);
pub async fn postal_code<A: AddressLookup>(
    path: web::Path<String>,
    api: web::Data<A>,
) -> Result<HttpResponse, ServerError> {
    let cep = normalize_postal_code(&path.into_inner()).map_err(|e| ServerError::ValidationError(e.to_string()))?;
    let address = api.lookup_postal_code(&cep).await.map_err(|e| match e {
        ProviderApiError::NotFound(_) => ServerError::NoRecordFound(format!("Postal code {cep} not found")),
        e => {
            warn!("💻️ Postal lookup for {cep} failed. {e}");
            ServerError::UpstreamError("Postal lookup is unavailable".to_string())
        },
    })?;
    Ok(HttpResponse::Ok().json(address))
}

//----------------------------------------------   Shipping quote  ----------------------------------------------
route!(shipping_quote => Post "/shipping/quote" impl ShippingQuotes);
pub async fn shipping_quote<Q: ShippingQuotes>(
    body: web::Json<ShippingQuoteRequest>,
    api: web::Data<Q>,
) -> Result<HttpResponse, ServerError> {
    let ShippingQuoteRequest { postal_code, items } = body.into_inner();
    let cep = normalize_postal_code(&postal_code).map_err(|e| ServerError::ValidationError(e.to_string()))?;
    if items.is_empty() || items.iter().any(|i| i.quantity == 0) {
        return Err(ServerError::ValidationError("items: must contain at least one unit of each product".into()));
    }
    let options = api.quote(&cep, &items).await.map_err(|e| {
        warn!("💻️ Shipping quote for {cep} failed. {e}");
        ServerError::UpstreamError("Shipping quotes are unavailable".to_string())
    })?;
    Ok(HttpResponse::Ok().json(options))
}
