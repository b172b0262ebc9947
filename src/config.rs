//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 30;

/// Configuration for the backend connection and the client itself
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the question-answering backend, without trailing `/`
    pub backend_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Period of background health checks; `None` disables them
    pub health_interval: Option<Duration>,
    pub log_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            health_interval: Some(Duration::from_secs(DEFAULT_HEALTH_INTERVAL_SECS)),
            log_path: default_log_path(std::env::var("HOME").ok()),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparseable values use defaults.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backend_url = lookup("BACKEND_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let timeout_secs = lookup("QUERYDESK_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let health_secs = lookup("QUERYDESK_HEALTH_INTERVAL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_HEALTH_INTERVAL_SECS);

        let log_path = lookup("QUERYDESK_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_log_path(lookup("HOME")));

        Self {
            backend_url,
            timeout: Duration::from_secs(timeout_secs),
            health_interval: (health_secs > 0).then(|| Duration::from_secs(health_secs)),
            log_path,
        }
    }
}

fn default_log_path(home: Option<String>) -> PathBuf {
    let home = home.unwrap_or_else(|| "/tmp".to_string());
    PathBuf::from(home).join(".querydesk").join("querydesk.log")
}
