//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! crate shapes `HttpRequest` values without ever touching the network; the
//! caller (host) is responsible for executing the actual I/O and, if it
//! wants the core's error taxonomy, for mapping failures to
//! `ApiError::TransportError`. This keeps the core deterministic and easy
//! to test.
//!
//! All fields use owned types (`String`, `Vec`) so values can be handed to
//! any transport without lifetime concerns.

use std::time::Duration;

use serde_json::{Map, Value};

/// HTTP method for a shaped request. `Get` and `Post` are the only verbs
/// the ACS API distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    /// Parse a method name case-insensitively. Returns `None` for anything
    /// other than get/post, letting callers decide what to do with
    /// unrecognized override values.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("get") {
            Some(HttpMethod::Get)
        } else if s.eq_ignore_ascii_case("post") {
            Some(HttpMethod::Post)
        } else {
            None
        }
    }
}

/// An outgoing HTTP request described as plain data.
///
/// Produced by the request shaper for RPC endpoints. The caller executes
/// this request against the network and builds the corresponding
/// `HttpResponse`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Headers in emission order.
    pub headers: Vec<(String, String)>,
    /// Query parameters in emission order, already flattened to scalars.
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
    /// Encoding the response body is expected in. Defaults to "utf8".
    pub response_encoding: String,
    /// Transport overrides the shaper did not recognize, passed through
    /// verbatim for transport-specific escape hatches.
    pub extra: Map<String, Value>,
}

/// An HTTP response described as plain data.
///
/// Constructed by the caller after executing an `HttpRequest`. The core
/// performs no schema validation on response bodies; interpretation is a
/// host concern.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!(HttpMethod::parse("get"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("GET"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("Post"), Some(HttpMethod::Post));
        assert_eq!(HttpMethod::parse("delete"), None);
    }
}
