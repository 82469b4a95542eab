//! Request descriptors, raw responses, and the transport seam.
//!
//! The generic [`Bot`](crate::Bot) resolves descriptors into fully-qualified
//! [`HttpRequest`]s and hands them to a [`Transport`]. Only the transport does
//! I/O; tests substitute an in-memory implementation.

mod http;

pub use http::HttpTransport;

use crate::error::BotError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub use reqwest::Method;

/// An authenticated capability call, relative to the provider defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path below the provider's path prefix (e.g. `account/me`).
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A lower-level request that bypasses the default host/prefix and carries a
/// form body. Used for token endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
    /// Overrides the provider's default hostname when set.
    pub hostname: Option<String>,
    pub method: Method,
    pub path: String,
    pub path_prefix: String,
    /// Form-encoded body fields, in order.
    pub post: Vec<(String, String)>,
}

/// A fully resolved request, ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub form: Option<Vec<(String, String)>>,
}

/// Response as received from the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status_code: u16,
    /// Header names are lower-cased.
    pub headers: HashMap<String, String>,
    pub data: String,
}

impl RawResponse {
    /// Response with a JSON body and no headers.
    pub fn json_body(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            data: body.to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Decodes the body as JSON.
    pub fn json(&self) -> Result<Value, BotError> {
        serde_json::from_str(&self.data).map_err(|e| BotError::Decode(e.to_string()))
    }

    /// Body for error reporting: decoded JSON, or the raw text as a string.
    pub fn error_body(&self) -> Value {
        serde_json::from_str(&self.data).unwrap_or_else(|_| Value::String(self.data.clone()))
    }
}

/// Sends resolved requests. Implementations must not interpret status codes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, BotError>;
}
