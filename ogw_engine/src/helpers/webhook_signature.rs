//! # Payment webhook signatures
//!
//! The payment provider signs each webhook call with a secret shared with the merchant. The signature travels in
//! the `x-signature` header as a list of comma-separated `key=value` parts:
//!
//! ```text
//!    ts=1704908010,v1=618c85345248dd820d5fd456117c2ab2ef8eda45a0282ff693eac24131a5e839
//! ```
//!
//! The `v1` value is the hex-encoded HMAC-SHA256, keyed with the shared secret, of the manifest
//!
//! ```text
//!    id:{payment_id};request-id:{x-request-id};ts:{ts};
//! ```
//!
//! where `payment_id` is the `data.id` query parameter of the call. Parts may appear in any order and whitespace
//! around them is ignored.
//!
//! When no secret is configured verification is switched off and every call is accepted.
use hmac::{Hmac, Mac};
use log::trace;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("The signature header is missing")]
    MissingSignature,
    #[error("The request id header is missing")]
    MissingRequestId,
    #[error("The signature header is malformed. {0}")]
    MalformedSignature(String),
    #[error("The payment id is missing from the query string")]
    MissingPaymentId,
    #[error("The signature does not match the request")]
    HashMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    /// The hash matched.
    Verified,
    /// No secret is configured, so nothing was checked.
    Disabled,
}

/// The request fields that go into signature verification, as received.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignedRequest<'a> {
    pub signature: Option<&'a str>,
    pub request_id: Option<&'a str>,
    pub payment_id: Option<&'a str>,
}

impl<'a> SignedRequest<'a> {
    pub fn new(signature: Option<&'a str>, request_id: Option<&'a str>, payment_id: Option<&'a str>) -> Self {
        Self { signature, request_id, payment_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader {
    ts: String,
    hash: Vec<u8>,
}

pub fn signature_manifest(payment_id: &str, request_id: &str, ts: &str) -> String {
    format!("id:{payment_id};request-id:{request_id};ts:{ts};")
}

/// Produces the `x-signature` header value the provider would send for these fields.
pub fn sign_request(secret: &str, payment_id: &str, request_id: &str, ts: &str) -> Result<String, SignatureError> {
    let hash = manifest_mac(secret, &signature_manifest(payment_id, request_id, ts))?.finalize().into_bytes();
    Ok(format!("ts={ts},v1={}", hex::encode(hash)))
}

fn manifest_mac(secret: &str, manifest: &str) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SignatureError::MalformedSignature(format!("Unusable secret. {e}")))?;
    mac.update(manifest.as_bytes());
    Ok(mac)
}

fn parse_signature_header(header: &str) -> Result<SignatureHeader, SignatureError> {
    let mut ts = None;
    let mut hash = None;
    for part in header.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| SignatureError::MalformedSignature(format!("'{part}' is not a key=value pair")))?;
        match key.trim() {
            "ts" => ts = Some(value.trim().to_string()),
            "v1" => hash = Some(value.trim()),
            _ => trace!("🔐️ Ignoring unknown signature part '{key}'"),
        }
    }
    let ts = ts.filter(|t| !t.is_empty()).ok_or_else(|| SignatureError::MalformedSignature("ts is missing".into()))?;
    let hash = hash.ok_or_else(|| SignatureError::MalformedSignature("v1 is missing".into()))?;
    let hash = hex::decode(hash).map_err(|e| SignatureError::MalformedSignature(format!("v1 is not hex. {e}")))?;
    Ok(SignatureHeader { ts, hash })
}

/// Checks the authenticity of a payment webhook call.
///
/// Checks run in a fixed order: secret, signature header, request id, header format, payment id, hash. The first
/// failure is returned. The hash comparison is constant-time.
pub fn verify_webhook_signature(
    secret: Option<&str>,
    request: &SignedRequest<'_>,
) -> Result<SignatureCheck, SignatureError> {
    let secret = match secret.filter(|s| !s.is_empty()) {
        Some(s) => s,
        None => {
            trace!("🔐️ No webhook secret is configured. Signature verification is disabled.");
            return Ok(SignatureCheck::Disabled);
        },
    };
    let signature = request.signature.filter(|s| !s.trim().is_empty()).ok_or(SignatureError::MissingSignature)?;
    let request_id = request.request_id.filter(|s| !s.trim().is_empty()).ok_or(SignatureError::MissingRequestId)?;
    let header = parse_signature_header(signature)?;
    let payment_id = request.payment_id.filter(|s| !s.trim().is_empty()).ok_or(SignatureError::MissingPaymentId)?;
    let manifest = signature_manifest(payment_id, request_id, &header.ts);
    trace!("🔐️ Verifying webhook signature over manifest {manifest}");
    manifest_mac(secret, &manifest)?.verify_slice(&header.hash).map_err(|_| SignatureError::HashMismatch)?;
    Ok(SignatureCheck::Verified)
}

#[cfg(test)]
mod test {
    use super::*;

    const SECRET: &str = "a-shared-webhook-secret";

    fn signed(sig: &str) -> SignedRequest<'_> {
        SignedRequest::new(Some(sig), Some("bf6f4a1c-9b2e-4d1e"), Some("123456789"))
    }

    #[test]
    fn manifest_format() {
        assert_eq!(signature_manifest("123", "abc", "1700000000"), "id:123;request-id:abc;ts:1700000000;");
    }

    #[test]
    fn valid_signature_is_accepted() {
        let sig = sign_request(SECRET, "123456789", "bf6f4a1c-9b2e-4d1e", "1704908010").unwrap();
        assert!(sig.starts_with("ts=1704908010,v1="));
        assert_eq!(verify_webhook_signature(Some(SECRET), &signed(&sig)), Ok(SignatureCheck::Verified));
    }

    #[test]
    fn part_order_case_and_whitespace_are_tolerated() {
        let sig = sign_request(SECRET, "123456789", "bf6f4a1c-9b2e-4d1e", "1704908010").unwrap();
        let hash = sig.split_once("v1=").unwrap().1.to_uppercase();
        let reordered = format!(" v1={hash} , ts=1704908010 ");
        assert_eq!(verify_webhook_signature(Some(SECRET), &signed(&reordered)), Ok(SignatureCheck::Verified));
    }

    #[test]
    fn tampered_hash_is_rejected() {
        let sig = sign_request(SECRET, "123456789", "bf6f4a1c-9b2e-4d1e", "1704908010").unwrap();
        let mut tampered = sig.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == '0' { '1' } else { '0' });
        assert_eq!(verify_webhook_signature(Some(SECRET), &signed(&tampered)), Err(SignatureError::HashMismatch));
        // Same hash, different payment id
        let other = SignedRequest::new(Some(&sig), Some("bf6f4a1c-9b2e-4d1e"), Some("987654321"));
        assert_eq!(verify_webhook_signature(Some(SECRET), &other), Err(SignatureError::HashMismatch));
        // Wrong secret
        assert_eq!(verify_webhook_signature(Some("nope"), &signed(&sig)), Err(SignatureError::HashMismatch));
    }

    #[test]
    fn no_secret_accepts_anything() {
        let req = SignedRequest::default();
        assert_eq!(verify_webhook_signature(None, &req), Ok(SignatureCheck::Disabled));
        assert_eq!(verify_webhook_signature(Some(""), &req), Ok(SignatureCheck::Disabled));
        assert_eq!(verify_webhook_signature(None, &signed("garbage")), Ok(SignatureCheck::Disabled));
    }

    #[test]
    fn failure_modes_are_checked_in_order() {
        let secret = Some(SECRET);
        let none = SignedRequest::default();
        assert_eq!(verify_webhook_signature(secret, &none), Err(SignatureError::MissingSignature));

        let no_request_id = SignedRequest::new(Some("garbage"), None, None);
        assert_eq!(verify_webhook_signature(secret, &no_request_id), Err(SignatureError::MissingRequestId));

        let malformed = SignedRequest::new(Some("garbage"), Some("rid"), None);
        assert!(matches!(verify_webhook_signature(secret, &malformed), Err(SignatureError::MalformedSignature(_))));

        let no_hash = SignedRequest::new(Some("ts=1"), Some("rid"), Some("1"));
        assert!(matches!(verify_webhook_signature(secret, &no_hash), Err(SignatureError::MalformedSignature(_))));

        let not_hex = SignedRequest::new(Some("ts=1,v1=xyz"), Some("rid"), Some("1"));
        assert!(matches!(verify_webhook_signature(secret, &not_hex), Err(SignatureError::MalformedSignature(_))));

        let no_payment_id = SignedRequest::new(Some("ts=1,v1=abcd"), Some("rid"), None);
        assert_eq!(verify_webhook_signature(secret, &no_payment_id), Err(SignatureError::MissingPaymentId));

        let mismatch = SignedRequest::new(Some("ts=1,v1=abcd"), Some("rid"), Some("1"));
        assert_eq!(verify_webhook_signature(secret, &mismatch), Err(SignatureError::HashMismatch));
    }
}
