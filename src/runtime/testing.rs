//! Mock implementations for testing
//!
//! These mocks enable runtime testing without real I/O.

use crate::backend::{ApiError, Backend, DiscoveryResponse, QueryRequest, QueryResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

const MOCK_BASE_URL: &str = "http://mock.invalid";

// ============================================================================
// Mock Backend
// ============================================================================

/// Mock backend that returns queued query replies
pub struct MockBackend {
    responses: Mutex<VecDeque<Result<QueryResponse, ApiError>>>,
    discovery: Mutex<Result<DiscoveryResponse, ApiError>>,
    health: Mutex<Result<(), ApiError>>,
    /// Record of all query requests made
    pub requests: Mutex<Vec<QueryRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            discovery: Mutex::new(Ok(DiscoveryResponse::default())),
            health: Mutex::new(Ok(())),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful query reply
    pub fn queue_response(&self, response: QueryResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a failed query reply
    pub fn queue_error(&self, error: ApiError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn set_discovery(&self, result: Result<DiscoveryResponse, ApiError>) {
        *self.discovery.lock().unwrap() = result;
    }

    pub fn set_health(&self, result: Result<(), ApiError>) {
        *self.health.lock().unwrap() = result;
    }

    /// Get recorded query requests
    pub fn recorded_requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<QueryResponse, ApiError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::unexpected("No mock response queued")))
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_response()
    }

    async fn discover_content(&self) -> Result<DiscoveryResponse, ApiError> {
        self.discovery.lock().unwrap().clone()
    }

    async fn health(&self) -> Result<(), ApiError> {
        self.health.lock().unwrap().clone()
    }

    fn base_url(&self) -> &str {
        MOCK_BASE_URL
    }
}

// ============================================================================
// Delayed Mock Backend (for in-flight testing)
// ============================================================================

/// Mock backend whose queries take a while to answer
pub struct DelayedMockBackend {
    inner: MockBackend,
    delay: Duration,
}

impl DelayedMockBackend {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockBackend::new(),
            delay,
        }
    }

    pub fn queue_response(&self, response: QueryResponse) {
        self.inner.queue_response(response);
    }

    pub fn recorded_requests(&self) -> Vec<QueryRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl Backend for DelayedMockBackend {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        tokio::time::sleep(self.delay).await;
        self.inner.next_response()
    }

    async fn discover_content(&self) -> Result<DiscoveryResponse, ApiError> {
        self.inner.discover_content().await
    }

    async fn health(&self) -> Result<(), ApiError> {
        self.inner.health().await
    }

    fn base_url(&self) -> &str {
        self.inner.base_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend() {
        let mock = MockBackend::new();
        mock.queue_response(QueryResponse::default());

        let request = QueryRequest {
            query: "q".to_string(),
            session_id: "s".to_string(),
        };
        assert!(mock.query(&request).await.is_ok());

        // Second call should fail (no more responses)
        assert!(mock.query(&request).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }
}
