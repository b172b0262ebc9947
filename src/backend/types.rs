//! Wire types for the question-answering backend

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One result record: column name to scalar, in backend column order
pub type Row = Map<String, Value>;

/// Body of `POST /query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub query: String,
    pub session_id: String,
}

/// Reply of `POST /query`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResponse {
    #[serde(default, deserialize_with = "string_or_none")]
    pub sql_query: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<Row>,
}

impl QueryResponse {
    /// The generated query, treating an empty string as absent
    pub fn sql(&self) -> Option<&str> {
        self.sql_query.as_deref().filter(|sql| !sql.trim().is_empty())
    }
}

/// Reply of `POST /discover-content`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DiscoveryResponse {
    #[serde(default)]
    pub documents_added: u64,
}

/// HTTP method used for a backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// The three endpoints the backend exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Query,
    DiscoverContent,
    Health,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Query => "/query",
            Endpoint::DiscoverContent => "/discover-content",
            Endpoint::Health => "/",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Endpoint::Query | Endpoint::DiscoverContent => Method::Post,
            Endpoint::Health => Method::Get,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Row>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Row>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Anything but a string means no query was generated
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(sql) => Some(sql),
        _ => None,
    })
}
