//! HTTP server configuration.

use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    #[serde(default)]
    pub shutdown_timeout_secs: Option<u64>,

    /// Maximum request/response body size buffered by the middleware (default: 10MB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Static mock responses served by the fallback handler
    #[serde(default)]
    pub routes: Vec<MockRouteConfig>,
}

/// A canned response for one method + path pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockRouteConfig {
    /// HTTP method, `*` for any
    #[serde(default = "default_route_method")]
    pub method: String,

    /// Exact request path
    pub path: String,

    /// Response status
    #[serde(default = "default_route_status")]
    pub status: u16,

    /// Response body
    #[serde(default)]
    pub body: String,

    /// Response content type
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl MockRouteConfig {
    /// Check whether this route answers the given request
    pub fn matches(&self, method: &str, path: &str) -> bool {
        (self.method == "*" || self.method.eq_ignore_ascii_case(method)) && self.path == path
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024 // 10MB
}

fn default_route_method() -> String {
    "GET".to_string()
}

const fn default_route_status() -> u16 {
    200
}

fn default_content_type() -> String {
    "application/json".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: Some(30),
            max_body_bytes: default_max_body_bytes(),
            routes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_matches_method_and_exact_path() {
        let route = MockRouteConfig {
            method: "get".to_string(),
            path: "/users".to_string(),
            status: 200,
            body: "[]".to_string(),
            content_type: default_content_type(),
        };
        assert!(route.matches("GET", "/users"));
        assert!(!route.matches("POST", "/users"));
        assert!(!route.matches("GET", "/users/1"));
    }

    #[test]
    fn wildcard_method_matches_any() {
        let route = MockRouteConfig {
            method: "*".to_string(),
            path: "/ping".to_string(),
            status: 204,
            body: String::new(),
            content_type: default_content_type(),
        };
        assert!(route.matches("DELETE", "/ping"));
    }
}
