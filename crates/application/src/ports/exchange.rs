//! Exchange port
//!
//! The capability surface the chaos and recording engines need from an
//! in-flight HTTP exchange: read access to the request, mutable access to the
//! response, and a small per-request key/value store used to hand data from
//! one middleware to the next (request id, chaos markers).

use std::collections::HashMap;

use domain::{Headers, QueryParams};
use serde_json::Value;

/// Key under which the propagated request id is stored
pub const REQUEST_ID_KEY: &str = "request_id";

/// Key set to `true` once a chaos scenario has been applied
pub const CHAOS_APPLIED_KEY: &str = "chaos_applied";

/// Key holding the name of the applied chaos scenario
pub const CHAOS_SCENARIO_KEY: &str = "chaos_scenario";

/// A request/response exchange as seen by the engines
///
/// Header names are always handled in lowercase.
pub trait Exchange: Send + Sync {
    /// Request method (upper case)
    fn method(&self) -> &str;

    /// Request URI including the query string
    fn uri(&self) -> &str;

    /// Request path without the query string
    fn path(&self) -> &str {
        let uri = self.uri();
        uri.split_once('?').map_or(uri, |(path, _)| path)
    }

    /// All request headers
    fn request_headers(&self) -> &Headers;

    /// A single request header, looked up case-insensitively
    fn request_header(&self, name: &str) -> Option<&str> {
        self.request_headers()
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Raw request body
    fn request_body(&self) -> &[u8];

    /// Decoded query parameters
    fn query_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some((_, query)) = self.uri().split_once('?') {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                params
                    .entry(key.into_owned())
                    .or_default()
                    .push(value.into_owned());
            }
        }
        params
    }

    /// Client address, when known
    fn remote_addr(&self) -> Option<&str>;

    /// Response status, `0` until one has been set
    fn response_status(&self) -> u16;

    /// Set the response status
    fn set_response_status(&mut self, status: u16);

    /// Response headers
    fn response_headers(&self) -> &Headers;

    /// Set a response header, replacing any previous value
    fn set_response_header(&mut self, name: &str, value: &str);

    /// Response body written so far
    fn response_body(&self) -> &[u8];

    /// Append to the response body
    fn write_response_body(&mut self, body: &[u8]);

    /// Whether a response has already been produced for this exchange
    fn is_committed(&self) -> bool;

    /// Read a value from the per-request store
    fn value(&self, key: &str) -> Option<&Value>;

    /// Write a value into the per-request store
    fn set_value(&mut self, key: &str, value: Value);
}

/// Owned, in-memory exchange
///
/// Used by the HTTP middleware (which buffers request and response bodies)
/// and by tests.
#[derive(Debug, Clone, Default)]
pub struct HttpExchange {
    method: String,
    uri: String,
    request_headers: Headers,
    request_body: Vec<u8>,
    remote_addr: Option<String>,
    status: u16,
    response_headers: Headers,
    response_body: Vec<u8>,
    committed: bool,
    values: HashMap<String, Value>,
}

impl HttpExchange {
    /// Create an exchange for the given request line
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Add a request header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.request_headers
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set the request body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.request_body = body.into();
        self
    }

    /// Set the client address
    #[must_use]
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Fill in a response produced elsewhere (e.g. by the router)
    #[must_use]
    pub fn with_response(mut self, status: u16, headers: Headers, body: impl Into<Vec<u8>>) -> Self {
        self.status = status;
        self.response_headers = headers;
        self.response_body = body.into();
        self.committed = true;
        self
    }

    /// Consume the exchange and return the response parts
    pub fn into_response_parts(self) -> (u16, Headers, Vec<u8>) {
        (self.status, self.response_headers, self.response_body)
    }
}

impl Exchange for HttpExchange {
    fn method(&self) -> &str {
        &self.method
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn request_headers(&self) -> &Headers {
        &self.request_headers
    }

    fn request_body(&self) -> &[u8] {
        &self.request_body
    }

    fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    fn response_status(&self) -> u16 {
        self.status
    }

    fn set_response_status(&mut self, status: u16) {
        self.status = status;
        self.committed = true;
    }

    fn response_headers(&self) -> &Headers {
        &self.response_headers
    }

    fn set_response_header(&mut self, name: &str, value: &str) {
        self.response_headers
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    fn response_body(&self) -> &[u8] {
        &self.response_body
    }

    fn write_response_body(&mut self, body: &[u8]) {
        if self.status == 0 {
            self.status = 200;
        }
        self.response_body.extend_from_slice(body);
        self.committed = true;
    }

    fn is_committed(&self) -> bool {
        self.committed
    }

    fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn set_value(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}
