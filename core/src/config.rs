//! Client configuration: option intake, validation, defaults.
//!
//! # Design
//! `ClientOptions` is the loose, all-optional input record (it also
//! deserializes from JSON so credentials can live in a config file).
//! `ClientConfig` is the validated, immutable result; once built it is
//! never mutated, so it is safe to share across concurrent calls.
//! Validation is fail-fast: fields are checked in a fixed order and the
//! first missing one decides the single error raised. Construction never
//! performs network I/O.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Print type appended to voucher-print URLs when the caller supplies none.
pub const DEFAULT_PRINT_TYPE: u32 = 2;

/// Response encoding used when the caller supplies none.
pub const DEFAULT_ENCODING: &str = "utf8";

/// Unvalidated client options.
///
/// Every field is optional at this stage; `ClientConfig::new` decides which
/// ones are actually required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub company_id: Option<String>,
    pub company_password: Option<String>,
    pub user_id: Option<String>,
    pub user_password: Option<String>,
    pub billing_code: Option<String>,
    pub api_key: Option<String>,
    pub print_type: Option<u32>,
    pub encoding: Option<String>,
    /// Request timeout, deserialized from milliseconds.
    #[serde(deserialize_with = "deserialize_timeout_ms")]
    pub timeout: Option<Duration>,
    /// Opaque options merged last into every shaped RPC request.
    /// Recognized keys replace descriptor fields; the rest pass through in
    /// `HttpRequest::extra`.
    pub transport_overrides: Option<Map<String, Value>>,
}

fn deserialize_timeout_ms<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = Option::<u64>::deserialize(deserializer)?;
    Ok(ms.map(Duration::from_millis))
}

/// Validated, immutable client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub company_id: String,
    pub company_password: String,
    pub user_id: Option<String>,
    pub user_password: String,
    pub billing_code: String,
    pub api_key: String,
    pub print_type: u32,
    pub encoding: String,
    pub timeout: Option<Duration>,
    pub transport_overrides: Map<String, Value>,
}

impl ClientConfig {
    /// Validate `options` and build the immutable configuration.
    ///
    /// Required fields are checked in order: company id, company password,
    /// user password, billing code, API key. The first missing or empty
    /// field fails construction with an `OptionsError` naming it; missing
    /// fields are not aggregated.
    pub fn new(options: ClientOptions) -> Result<Self, ApiError> {
        let company_id = require(options.company_id, "Company Id")?;
        let company_password = require(options.company_password, "Company Password")?;
        let user_password = require(options.user_password, "User Password")?;
        let billing_code = require(options.billing_code, "Billing Code")?;
        let api_key = require(options.api_key, "AcsApiKey")?;

        Ok(ClientConfig {
            company_id,
            company_password,
            user_id: options.user_id,
            user_password,
            billing_code,
            api_key,
            print_type: options.print_type.unwrap_or(DEFAULT_PRINT_TYPE),
            encoding: options
                .encoding
                .unwrap_or_else(|| DEFAULT_ENCODING.to_string()),
            timeout: options.timeout,
            transport_overrides: options.transport_overrides.unwrap_or_default(),
        })
    }
}

/// Empty strings count as missing, matching the remote service's notion of
/// an absent credential.
fn require(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::OptionsError(format!("{name} is required"))),
    }
}
