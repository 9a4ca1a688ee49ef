//! APM backend collaborator
//!
//! The façade never talks to a vendor SDK directly. It drives whatever
//! implements [`Agent`] and [`Transaction`]: start a transaction, open
//! datastore/external/generic segments on it, attach attributes, end it.
//!
//! The default backend is [`TracingAgent`], which maps transactions and
//! segments onto `tracing` spans (and from there onto OpenTelemetry when the
//! `otel` feature is enabled).
//!
//! # Semantic Conventions
//!
//! | Attribute | Description | Example |
//! |-----------|-------------|---------|
//! | `db.system` | Datastore product | `postgres` |
//! | `db.collection` | Table or collection | `users` |
//! | `db.operation` | Operation verb | `SELECT` |
//! | `db.statement` | Parameterized query | `GET user:42` |
//! | `http.method` | Outbound method | `GET` |
//! | `http.url` | Outbound URL | `https://api.example.com/v1` |
//! | `http.status_code` | Response status | `200` |

mod tracing_agent;

pub use tracing_agent::TracingAgent;

use hyper::http::{HeaderMap, Method, StatusCode};
use hyper::{Request, Response};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Request metadata handed to the backend when a transaction starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    pub host: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestInfo {
    /// Capture the parts of an inbound request the backend cares about
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            host: header("host"),
            user_agent: header("user-agent"),
        }
    }
}

/// Datastore products known to the façade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatastoreProduct {
    /// Relational database
    Postgres,
    /// Key/value cache
    Redis,
}

impl DatastoreProduct {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatastoreProduct::Postgres => "postgres",
            DatastoreProduct::Redis => "redis",
        }
    }
}

impl fmt::Display for DatastoreProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for a datastore segment
#[derive(Debug, Clone, PartialEq)]
pub struct DatastoreParams {
    pub product: DatastoreProduct,
    pub collection: Option<String>,
    pub operation: String,
    pub parameterized_query: Option<String>,
    pub query_parameters: HashMap<String, serde_json::Value>,
}

impl DatastoreParams {
    /// Datastore params with only product and operation set
    pub fn new(product: DatastoreProduct, operation: impl Into<String>) -> Self {
        Self {
            product,
            collection: None,
            operation: operation.into(),
            parameterized_query: None,
            query_parameters: HashMap::new(),
        }
    }
}

/// Outbound call as seen by an external segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
}

impl<B> From<&Request<B>> for OutboundRequest {
    fn from(request: &Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            url: request.uri().to_string(),
        }
    }
}

impl From<&reqwest::Request> for OutboundRequest {
    fn from(request: &reqwest::Request) -> Self {
        Self {
            method: request.method().clone(),
            url: request.url().to_string(),
        }
    }
}

/// Response of an outbound call, attached to its external segment
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMeta {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl<B> From<&Response<B>> for ResponseMeta {
    fn from(response: &Response<B>) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
        }
    }
}

impl From<&reqwest::Response> for ResponseMeta {
    fn from(response: &reqwest::Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
        }
    }
}

/// Backend client capable of starting transactions
///
/// Shared by every request for the life of the process, so implementations
/// must be safe for concurrent use.
pub trait Agent: Send + Sync {
    fn start_transaction(&self, name: &str, request: &RequestInfo) -> Arc<dyn Transaction>;
}

/// One in-flight traced request
#[cfg_attr(test, mockall::automock)]
pub trait Transaction: Send + Sync {
    /// Finish the transaction and report it. Called exactly once.
    fn end(&self);

    fn add_attribute(&self, key: &str, value: &str);

    /// Record the status code written back to the client
    fn set_response_status(&self, status: StatusCode);

    fn start_datastore_segment(&self, params: DatastoreParams) -> Box<dyn SegmentHandle>;

    fn start_external_segment(&self, request: &OutboundRequest)
        -> Box<dyn ExternalSegmentHandle>;

    fn start_segment(&self, name: &str) -> Box<dyn SegmentHandle>;
}

/// Backend handle for a datastore or generic segment
pub trait SegmentHandle: Send {
    fn end(self: Box<Self>);
}

/// Backend handle for an outbound call segment
pub trait ExternalSegmentHandle: Send {
    fn set_response(&mut self, response: Option<ResponseMeta>);

    fn end(self: Box<Self>);
}
