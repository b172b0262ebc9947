//! Administrative backend operations
//!
//! These run beside the conversation and never touch the transcript. Every
//! failure is reduced to status text.

use crate::backend::Backend;
use std::fmt;

/// Outcome of a schema discovery request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryStatus {
    Indexed(u64),
    Failed(String),
}

impl fmt::Display for DiscoveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryStatus::Indexed(n) => {
                write!(f, "Discovery complete! {n} schema documents were indexed.")
            }
            DiscoveryStatus::Failed(error) => write!(f, "Discovery Failed: {error}"),
        }
    }
}

/// Passive backend connectivity indicator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HealthStatus {
    /// Not checked yet
    #[default]
    Unknown,
    Connected,
    Disconnected(String),
}

impl HealthStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, HealthStatus::Connected)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Unknown => f.write_str("Checking backend…"),
            HealthStatus::Connected => f.write_str("Backend Connected"),
            HealthStatus::Disconnected(_) => f.write_str("Backend Disconnected"),
        }
    }
}

/// Ask the backend to analyze and embed the database schema.
pub async fn discover_schema<B: Backend + ?Sized>(backend: &B) -> DiscoveryStatus {
    match backend.discover_content().await {
        Ok(resp) => {
            tracing::info!(documents = resp.documents_added, "Schema discovery complete");
            DiscoveryStatus::Indexed(resp.documents_added)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Schema discovery failed");
            DiscoveryStatus::Failed(e.message)
        }
    }
}

/// Ping the backend root.
pub async fn check_health<B: Backend + ?Sized>(backend: &B) -> HealthStatus {
    match backend.health().await {
        Ok(()) => HealthStatus::Connected,
        Err(e) => HealthStatus::Disconnected(e.message),
    }
}
