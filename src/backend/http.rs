//! reqwest implementation of the backend transport

use super::types::{DiscoveryResponse, Endpoint, Method, QueryRequest, QueryResponse};
use super::{ApiError, Backend};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// HTTP client bound to one backend base URL
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().build().map_err(ApiError::unexpected)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Issue a single request and return the body text of a 2xx response.
    async fn send(
        &self,
        endpoint: Endpoint,
        payload: Option<&Value>,
        timeout: Duration,
    ) -> Result<String, ApiError> {
        let url = self.url(endpoint);
        let mut request = match endpoint.method() {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        request = request.timeout(timeout);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.classify_error(&e, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.classify_error(&e, timeout))?;

        if !status.is_success() {
            return Err(ApiError::http(status, &body));
        }

        Ok(body)
    }

    fn classify_error(&self, e: &reqwest::Error, timeout: Duration) -> ApiError {
        if e.is_connect() {
            ApiError::connection(&self.base_url)
        } else if e.is_timeout() {
            ApiError::timeout(timeout)
        } else {
            ApiError::unexpected(e)
        }
    }

    /// Call an endpoint and decode the JSON reply.
    ///
    /// An empty 2xx body decodes to `null`.
    pub async fn call(
        &self,
        endpoint: Endpoint,
        payload: Option<&Value>,
        timeout: Duration,
    ) -> Result<Value, ApiError> {
        let body = self.send(endpoint, payload, timeout).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(ApiError::unexpected)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        let payload = serde_json::to_value(request).map_err(ApiError::unexpected)?;
        let value = self.call(Endpoint::Query, Some(&payload), self.timeout).await?;
        serde_json::from_value(value).map_err(ApiError::unexpected)
    }

    async fn discover_content(&self) -> Result<DiscoveryResponse, ApiError> {
        match self.call(Endpoint::DiscoverContent, None, self.timeout).await? {
            Value::Null => Ok(DiscoveryResponse::default()),
            value => serde_json::from_value(value).map_err(ApiError::unexpected),
        }
    }

    async fn health(&self) -> Result<(), ApiError> {
        self.send(Endpoint::Health, None, self.timeout).await.map(|_| ())
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
