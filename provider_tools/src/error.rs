use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not connect: {0}")]
    Connection(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
}

impl ProviderApiError {
    /// The request never reached the remote server.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, ProviderApiError::Connection(_))
    }

    /// Failures worth retrying when the request is safe to repeat.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderApiError::Connection(_) | ProviderApiError::Timeout(_) => true,
            ProviderApiError::QueryError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            ProviderApiError::Connection(e.to_string())
        } else if e.is_timeout() {
            ProviderApiError::Timeout(e.to_string())
        } else if e.is_decode() {
            ProviderApiError::JsonError(e.to_string())
        } else {
            ProviderApiError::RestResponseError(e.to_string())
        }
    }
}
