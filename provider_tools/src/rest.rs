use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{config::HttpConfig, ProviderApiError};

/// A JSON REST client bound to one base URL, with default headers and a per-request timeout.
#[derive(Clone)]
pub struct RestClient {
    base_url: String,
    client: Arc<Client>,
}

impl RestClient {
    pub fn new(base_url: &str, headers: &[(&str, &str)], http: &HttpConfig) -> Result<Self, ProviderApiError> {
        let mut map = HeaderMap::with_capacity(headers.len() + 1);
        for (name, value) in headers {
            let val = HeaderValue::from_str(value).map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
            let name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
            map.insert(name, val);
        }
        map.insert("accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(map)
            .timeout(http.timeout)
            .build()
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { base_url, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends the request and returns the raw status and body, without judging the status.
    pub async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(u16, String), ProviderApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok((status, text))
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ProviderApiError> {
        let (status, text) = self.send(method, path, body).await?;
        if (200..300).contains(&status) {
            trace!("REST query successful. {status}");
            serde_json::from_str::<T>(&text).map_err(|e| ProviderApiError::JsonError(format!("{e}. Body: {text}")))
        } else if status == 404 {
            Err(ProviderApiError::NotFound(text))
        } else {
            Err(ProviderApiError::QueryError { status, message: text })
        }
    }
}
