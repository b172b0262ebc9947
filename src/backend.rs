//! Question-answering backend client
//!
//! The backend is consumed purely over HTTP: one query endpoint, one schema
//! discovery endpoint and a health probe.

mod error;
mod http;
mod types;

pub use error::{ApiError, ApiErrorKind};
pub use http::HttpBackend;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Common interface for backend transports
#[async_trait]
pub trait Backend: Send + Sync {
    /// Ask a question within a session
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError>;

    /// Ask the backend to (re)index the database schema
    async fn discover_content(&self) -> Result<DiscoveryResponse, ApiError>;

    /// Probe the backend; any 2xx answer is healthy
    async fn health(&self) -> Result<(), ApiError>;

    /// Base URL the backend is reached at
    fn base_url(&self) -> &str;
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Arc<T> {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        (**self).query(request).await
    }

    async fn discover_content(&self) -> Result<DiscoveryResponse, ApiError> {
        (**self).discover_content().await
    }

    async fn health(&self) -> Result<(), ApiError> {
        (**self).health().await
    }

    fn base_url(&self) -> &str {
        (**self).base_url()
    }
}

/// Logging wrapper for backends
pub struct LoggingBackend<B> {
    inner: B,
}

impl<B: Backend> LoggingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    fn log_outcome<T>(endpoint: Endpoint, start: Instant, result: &Result<T, ApiError>) {
        let duration = start.elapsed();
        match result {
            Ok(_) => {
                tracing::info!(
                    endpoint = endpoint.path(),
                    duration_ms = %duration.as_millis(),
                    "Backend call completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = endpoint.path(),
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.label(),
                    error = %e.message,
                    "Backend call failed"
                );
            }
        }
    }
}

#[async_trait]
impl<B: Backend> Backend for LoggingBackend<B> {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        let start = Instant::now();
        let result = self.inner.query(request).await;
        if let Ok(response) = &result {
            tracing::debug!(
                session_id = %request.session_id,
                rows = response.results.len(),
                has_sql = response.sql().is_some(),
                "Query answered"
            );
        }
        Self::log_outcome(Endpoint::Query, start, &result);
        result
    }

    async fn discover_content(&self) -> Result<DiscoveryResponse, ApiError> {
        let start = Instant::now();
        let result = self.inner.discover_content().await;
        Self::log_outcome(Endpoint::DiscoverContent, start, &result);
        result
    }

    async fn health(&self) -> Result<(), ApiError> {
        let start = Instant::now();
        let result = self.inner.health().await;
        Self::log_outcome(Endpoint::Health, start, &result);
        result
    }

    fn base_url(&self) -> &str {
        self.inner.base_url()
    }
}
