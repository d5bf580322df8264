mod validation;
mod webhook_signature;

pub use validation::{
    normalize_cpf,
    normalize_postal_code,
    normalize_state,
    require_non_empty,
    validate_email,
    ValidationError,
};
pub use webhook_signature::{
    sign_request,
    signature_manifest,
    verify_webhook_signature,
    SignatureCheck,
    SignatureError,
    SignedRequest,
};
