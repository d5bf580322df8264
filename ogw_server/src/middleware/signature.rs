//! Payment webhook signature middleware for Actix Web.
//!
//! The payment gateway signs each webhook call with the shared secret. The signature covers the payment id from the
//! query string, the `x-request-id` header and a timestamp, and arrives in the `x-signature` header. See
//! [`ogw_engine::helpers::verify_webhook_signature`] for the format.
//!
//! Wrap the payment webhook scope with this middleware. Calls that fail verification are answered with
//! `401 Unauthorized` and never reach the handler. If no secret is configured, every call is let through.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use ogw_common::Secret;
use ogw_engine::helpers::{verify_webhook_signature, SignatureCheck, SignedRequest};

use crate::{data_objects::WebhookQuery, errors::ServerError};

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct SignatureMiddlewareFactory {
    secret: Option<Secret<String>>,
}

impl SignatureMiddlewareFactory {
    pub fn new(secret: Option<Secret<String>>) -> Self {
        SignatureMiddlewareFactory { secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignatureMiddlewareService { secret: self.secret.clone(), service: Rc::new(service) }))
    }
}

pub struct SignatureMiddlewareService<S> {
    secret: Option<Secret<String>>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.as_ref().map(|s| s.reveal().clone());
        Box::pin(async move {
            let check = {
                let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());
                // An unreadable query string is treated as one without a payment id
                let query = web::Query::<WebhookQuery>::from_query(req.query_string())
                    .map(|q| q.into_inner())
                    .unwrap_or_default();
                let signed =
                    SignedRequest::new(header(SIGNATURE_HEADER), header(REQUEST_ID_HEADER), query.payment_id());
                verify_webhook_signature(secret.as_deref(), &signed)
            };
            match check {
                Ok(SignatureCheck::Verified) => {
                    trace!("🔐️ Webhook signature for {} ✅️", req.path());
                    service.call(req).await
                },
                Ok(SignatureCheck::Disabled) => {
                    trace!("🔐️ Webhook signature checks are disabled. Allowing request.");
                    service.call(req).await
                },
                Err(e) => {
                    warn!("🔐️ Rejected webhook call to {}. {e}", req.path());
                    Err(ServerError::InvalidSignature(e).into())
                },
            }
        })
    }
}
