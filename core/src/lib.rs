//! Request-shaping client core for the ACS Courier REST API.
//!
//! # Overview
//! Wraps voucher creation, printing, and tracking behind a small facade.
//! The core builds `HttpRequest` values and print URLs without touching the
//! network (host-does-IO pattern); the caller executes RPC descriptors over
//! whatever HTTP transport it prefers, keeping this crate deterministic and
//! testable.
//!
//! # Design
//! - `AcsClient` is stateless after construction; it holds only the
//!   validated, immutable `ClientConfig`.
//! - Endpoints split into two families: JSON-RPC calls (an `ACSAlias` +
//!   `ACSInputParameters` envelope posted to one fixed URL) and print
//!   redirects, whose output is a browser-navigable URL rather than an API
//!   call. `ShapedRequest` makes the split explicit.
//! - Maps keep insertion order end to end (serde_json `preserve_order`);
//!   parameter and header order is part of the wire contract.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod shape;

pub use client::AcsClient;
pub use config::{ClientConfig, ClientOptions};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use shape::{EndpointKind, PrintUrlResult, ShapedRequest};
