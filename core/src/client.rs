//! Stateless client facade for the ACS courier API.
//!
//! # Design
//! `AcsClient` holds only the validated `ClientConfig` and carries no
//! mutable state between calls; `get` and `post` delegate straight to the
//! request shaper. RPC endpoints yield an `HttpRequest` the caller executes
//! over its transport of choice; the print endpoints yield a finished
//! `PrintUrlResult` and need no transport at all. Since no call mutates the
//! client, one instance is safe to share across concurrent calls.

use serde_json::{Map, Value};

use crate::config::{ClientConfig, ClientOptions};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::shape::{shape, ShapedRequest};

/// Stateless request-shaping client. Construct once, call freely.
#[derive(Debug, Clone)]
pub struct AcsClient {
    config: ClientConfig,
}

impl AcsClient {
    /// Validate `options` and build a client. Fails with
    /// `ApiError::OptionsError` on the first missing credential; no network
    /// capability is granted before validation passes.
    pub fn new(options: ClientOptions) -> Result<Self, ApiError> {
        Ok(AcsClient {
            config: ClientConfig::new(options)?,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shape a GET call. Pass an empty map when there are no extra query
    /// params.
    pub fn get(
        &self,
        endpoint: &str,
        data: &Map<String, Value>,
        params: &Map<String, Value>,
    ) -> Result<ShapedRequest, ApiError> {
        shape(HttpMethod::Get, endpoint, data, params, &self.config)
    }

    /// Shape a POST call. Print endpoints shape identically regardless of
    /// verb; non-print shaping differs from `get` only in the descriptor's
    /// method.
    pub fn post(
        &self,
        endpoint: &str,
        data: &Map<String, Value>,
        params: &Map<String, Value>,
    ) -> Result<ShapedRequest, ApiError> {
        shape(HttpMethod::Post, endpoint, data, params, &self.config)
    }
}
