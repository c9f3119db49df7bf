//! Transport abstraction.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use wukongim_protocol::{Endpoint, WireRequest};

/// A raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a 200 response with a JSON body.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual transport. An `Err` means the
/// request never produced an HTTP response (connection refused, timeout,
/// broken pipe); any response, whatever its status, is `Ok`.
pub trait HttpClient: Send + Sync {
    /// Executes a request against the given base address.
    fn execute(&self, base_url: &str, request: &WireRequest) -> Result<HttpResponse, String>;
}

impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    fn execute(&self, base_url: &str, request: &WireRequest) -> Result<HttpResponse, String> {
        (**self).execute(base_url, request)
    }
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn execute(&self, base_url: &str, request: &WireRequest) -> Result<HttpResponse, String> {
        (**self).execute(base_url, request)
    }
}

/// A mock HTTP client with canned per-endpoint responses, for testing.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    responses: Mutex<HashMap<Endpoint, Result<HttpResponse, String>>>,
    calls: Mutex<Vec<WireRequest>>,
}

impl MockHttpClient {
    /// Creates a mock with no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the response for an endpoint.
    pub fn set_response(&self, endpoint: Endpoint, response: HttpResponse) {
        self.responses.lock().insert(endpoint, Ok(response));
    }

    /// Sets a 200 JSON response for an endpoint.
    pub fn set_json(&self, endpoint: Endpoint, value: serde_json::Value) {
        self.set_response(endpoint, HttpResponse::json(&value));
    }

    /// Makes an endpoint fail at the transport level.
    pub fn set_failure(&self, endpoint: Endpoint, message: impl Into<String>) {
        self.responses.lock().insert(endpoint, Err(message.into()));
    }

    /// Returns every request received so far.
    pub fn calls(&self) -> Vec<WireRequest> {
        self.calls.lock().clone()
    }

    /// Returns the number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl HttpClient for MockHttpClient {
    fn execute(&self, _base_url: &str, request: &WireRequest) -> Result<HttpResponse, String> {
        self.calls.lock().push(request.clone());
        self.responses
            .lock()
            .get(&request.endpoint)
            .cloned()
            .unwrap_or_else(|| Err(format!("no mock response set for {}", request.path())))
    }
}
