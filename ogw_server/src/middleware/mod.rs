mod signature;

pub use signature::{SignatureMiddlewareFactory, SignatureMiddlewareService, REQUEST_ID_HEADER, SIGNATURE_HEADER};
