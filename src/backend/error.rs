//! Backend transport error types

use thiserror::Error;

/// Fallback used when an error body names no `error` field
const DEFAULT_HTTP_ERROR: &str = "An HTTP error occurred";

/// Transport error with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build an error from a non-2xx response.
    ///
    /// A JSON object body is read for `error` and `details`; anything else is
    /// reported as the raw body text.
    pub fn http(status: reqwest::StatusCode, body: &str) -> Self {
        let kind = ApiErrorKind::Http {
            status: status.as_u16(),
        };

        if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str(body) {
            let error = fields
                .get("error")
                .map_or_else(|| DEFAULT_HTTP_ERROR.to_string(), json_text);
            let details = fields
                .get("details")
                .map_or_else(|| status_line(status), json_text);
            return Self::new(kind, format!("{error}: {details}"));
        }

        if body.trim().is_empty() {
            Self::new(kind, status_line(status))
        } else {
            Self::new(kind, body)
        }
    }

    pub fn connection(base_url: &str) -> Self {
        Self::new(
            ApiErrorKind::Connection,
            format!("Connection Error: Backend at {base_url} is unreachable."),
        )
    }

    pub fn timeout(after: std::time::Duration) -> Self {
        Self::new(
            ApiErrorKind::Timeout,
            format!("Request timed out after {}s", after.as_secs()),
        )
    }

    pub fn unexpected(cause: impl std::fmt::Display) -> Self {
        Self::new(
            ApiErrorKind::Unexpected,
            format!("An unexpected error occurred: {cause}"),
        )
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Backend answered with a non-2xx status
    Http { status: u16 },
    /// Backend could not be reached at all
    Connection,
    /// No answer within the caller's timeout
    Timeout,
    /// Anything else, including undecodable bodies
    Unexpected,
}

impl ApiErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::Unexpected => "unexpected",
        }
    }
}

fn status_line(status: reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {reason}", status.as_u16()),
        None => format!("HTTP {}", status.as_u16()),
    }
}

/// Render a JSON field without quoting plain strings
fn json_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
