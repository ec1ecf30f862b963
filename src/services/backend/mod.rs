//! # Backend Transport

//! The seam between the booking services and the OData backend. Services build `BackendRequest`s and
//! hand them to a `BackendTransport`; production uses [`HttpTransport`], tests script their own.

pub mod http_transport;
pub mod envelope;
pub mod client;

pub use http_transport::*;
pub use envelope::*;
pub use client::*;

use std::collections::HashMap;
use async_trait::async_trait;
use derive_more::Display;
use crate::errors::DockBookingResult;

/// Which backend host a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BackendHost {
    /// Reads and token issuance
    #[display("read")]
    Read,
    /// The appointment creation POST
    #[display("write")]
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum HttpMethod {
    #[display("GET")]
    Get,
    #[display("POST")]
    Post,
}

/// A single call to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub method: HttpMethod,
    pub host: BackendHost,
    /// Path below the host's base URL, starting with `/`
    pub path: String,
    /// OData query options in order (`$filter`, `$format`, ...), appended unencoded except for spaces and quotes
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// JSON body for writes
    pub body: Option<serde_json::Value>,
}

impl BackendRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            host: BackendHost::Read,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            host: BackendHost::Write,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// The path plus query string as it goes on the wire
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self.query
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }
}

/// Status, headers and raw body of a backend answer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BackendResponse {
    pub status: u16,
    /// Header names are lower-case; repeated headers are joined with `", "`
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl BackendResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Sends requests to the booking backend.
///
/// Implementations authenticate every call with HTTP basic auth, surface transport failures as
/// `DockBookingError::Transport` and return every HTTP answer, whatever its status, as a `BackendResponse`.
#[async_trait]
pub trait BackendTransport: Send + Sync {
    async fn send(&self, request: BackendRequest) -> DockBookingResult<BackendResponse>;
}
