//! Transport abstraction module.
//!
//! This module provides the [`Transport`] trait: a minimal HTTP-like
//! request/response mechanism returning status codes and JSON bodies. The
//! store owns URL layout, headers and content encoding; a transport only
//! moves requests.
//!
//! Implementations:
//!
//! - [`HttpTransport`]: `reqwest`-backed, used against the real backend
//! - [`InMemoryBackend`]: emulates the contents API in memory (tests, demos)
//!
//! ## Object safety
//!
//! `Transport` is object-safe so it can be used behind `dyn Transport`.
//! To enable this, `send` returns a boxed future.

mod http;
mod memory;

pub use http::HttpTransport;
pub use memory::InMemoryBackend;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

/// A boxed future for object-safe async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// HTTP method subset used by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// A request as built by the store.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL, query string included
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header (builder pattern).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body (builder pattern).
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// First header value with the given (case-insensitive) name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response as seen by the store.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Parsed JSON body; `Value::Null` when empty, a string when not JSON
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Backend-provided error message, if any.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

/// Moves requests to the backend.
///
/// A transport reports only failures to obtain a response at all
/// (connection errors, timeouts) and must map them to
/// [`NotehubError::Unavailable`](crate::error::NotehubError::Unavailable).
/// Non-2xx statuses are returned as ordinary responses.
pub trait Transport: Send + Sync {
    /// Send one request and wait for its response.
    fn send<'a>(&'a self, request: HttpRequest) -> BoxFuture<'a, Result<HttpResponse>>;
}

// Blanket implementations for shared transports
impl<T: Transport + ?Sized> Transport for &T {
    fn send<'a>(&'a self, request: HttpRequest) -> BoxFuture<'a, Result<HttpResponse>> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send<'a>(&'a self, request: HttpRequest) -> BoxFuture<'a, Result<HttpResponse>> {
        (**self).send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let req = HttpRequest::new(Method::Put, "https://example.com/x")
            .header("Authorization", "token t")
            .json(json!({"message": "m"}));

        assert_eq!(req.method.as_str(), "PUT");
        assert_eq!(req.header_value("authorization"), Some("token t"));
        assert_eq!(req.body.unwrap()["message"], "m");
    }

    #[test]
    fn test_response_helpers() {
        let ok = HttpResponse::new(201, Value::Null);
        assert!(ok.is_success());

        let err = HttpResponse::new(409, json!({"message": "is at abc but expected def"}));
        assert!(!err.is_success());
        assert_eq!(err.message(), Some("is at abc but expected def"));
    }
}
