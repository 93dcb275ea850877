//! Error types for the ACS courier API client.
//!
//! # Design
//! Construction errors fail fast: a client with a missing credential must
//! never exist. Redirect-URL construction failures are *not* represented
//! here; that path reports through `PrintUrlResult` so callers get a
//! uniform status/url shape for both success and failure.
//! `TransportError` is reserved for hosts executing `HttpRequest` values;
//! the core itself never touches the network.

use std::fmt;

/// Errors returned by `AcsClient` construction and request shaping.
#[derive(Debug)]
pub enum ApiError {
    /// A required credential option is missing or empty. The message names
    /// the offending field.
    OptionsError(String),

    /// The RPC envelope could not be serialized to JSON.
    SerializationError(String),

    /// A network, timeout, or HTTP-level failure reported by the host
    /// transport executing a shaped request. No retry or backoff is
    /// attempted at this layer.
    TransportError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::OptionsError(msg) => write!(f, "options error: {msg}"),
            ApiError::SerializationError(msg) => {
                write!(f, "serialization failed: {msg}")
            }
            ApiError::TransportError(msg) => {
                write!(f, "transport failed: {msg}")
            }
        }
    }
}

impl std::error::Error for ApiError {}
