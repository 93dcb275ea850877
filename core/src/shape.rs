//! Request shaping: turns an endpoint name plus loose data into either an
//! RPC request descriptor or a ready-made print URL.
//!
//! # Design
//! Shaping is a pure function of (method, endpoint, data, params, config).
//! Endpoints split into two families. The two print endpoints are not API
//! calls at all: their "request" is a browser-navigable URL carrying the
//! credentials in its query string, so that path builds a `PrintUrlResult`
//! and never performs I/O. Everything else becomes a JSON envelope
//! (`ACSAlias` + `ACSInputParameters`) posted to the single RPC endpoint.
//!
//! Key order is a wire contract on both paths: credentials go first, then
//! caller data in its own iteration order (serde_json's `preserve_order`
//! keeps maps in insertion order). A caller-supplied key that collides with
//! a credential overrides its value while keeping the credential's
//! position, the same way a shallow spread behaves.

use std::time::Duration;

use serde_json::{Map, Value};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};

/// The single JSON-RPC endpoint.
pub const RPC_URL: &str =
    "https://webservices.acscourier.net/ACSRestServices/api/ACSAutoRest";

/// Voucher print redirect base.
pub const GET_VOUCHER_URL: &str =
    "https://acs-eud2.acscourier.net/Eshops/GetVoucher.aspx";

/// List print redirect base.
pub const GET_LIST_URL: &str = "https://acs-eud2.acscourier.net/Eshops/getlist.aspx";

/// The one endpoint whose envelope carries `Billing_Code`.
const CREATE_VOUCHER_ENDPOINT: &str = "ACS_Create_Voucher";

/// Which family an endpoint name belongs to. Unknown names are RPC calls;
/// classification never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    RpcCall,
    VoucherPrintRedirect,
    ListPrintRedirect,
}

impl EndpointKind {
    pub fn classify(endpoint: &str) -> Self {
        match endpoint {
            "ACS_Print_Voucher" => EndpointKind::VoucherPrintRedirect,
            "ACS_Print_List" => EndpointKind::ListPrintRedirect,
            _ => EndpointKind::RpcCall,
        }
    }
}

/// Outcome of shaping a print endpoint. A tagged result rather than an
/// HTTP response: 200 with the constructed URL, or 500 with the captured
/// construction error. Callers check `status`/`error`; nothing on this
/// path is thrown.
#[derive(Debug, Clone)]
pub struct PrintUrlResult {
    pub status: u16,
    pub error: String,
    pub url: Option<Url>,
}

/// What a `get`/`post` call produced: a request descriptor for the host
/// transport to execute, or a final print URL.
///
/// The two arms are deliberately asymmetric (one still needs I/O, one is
/// done); the enum makes the split explicit so callers must match on it.
#[derive(Debug, Clone)]
pub enum ShapedRequest {
    Rpc(HttpRequest),
    Print(PrintUrlResult),
}

/// Shape one call. Pure; the only fallible step is envelope serialization
/// on the RPC path.
pub fn shape(
    method: HttpMethod,
    endpoint: &str,
    data: &Map<String, Value>,
    params: &Map<String, Value>,
    config: &ClientConfig,
) -> Result<ShapedRequest, ApiError> {
    match EndpointKind::classify(endpoint) {
        EndpointKind::VoucherPrintRedirect => Ok(ShapedRequest::Print(build_print_url(
            GET_VOUCHER_URL,
            true,
            data,
            config,
        ))),
        EndpointKind::ListPrintRedirect => Ok(ShapedRequest::Print(build_print_url(
            GET_LIST_URL,
            false,
            data,
            config,
        ))),
        EndpointKind::RpcCall => Ok(ShapedRequest::Rpc(build_rpc_request(
            method, endpoint, data, params, config,
        )?)),
    }
}

/// Build a print URL: credentials in fixed order, then the default print
/// type (voucher prints only, and only when the caller did not supply one),
/// then every data entry in map order. `params` plays no part on this path.
fn build_print_url(
    base: &str,
    with_default_print_type: bool,
    data: &Map<String, Value>,
    config: &ClientConfig,
) -> PrintUrlResult {
    let mut url = match Url::parse(base) {
        Ok(url) => url,
        Err(err) => {
            return PrintUrlResult {
                status: 500,
                error: err.to_string(),
                url: None,
            }
        }
    };

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("MainID", &config.company_id);
        pairs.append_pair("MainPass", &config.company_password);
        pairs.append_pair("UserID", config.user_id.as_deref().unwrap_or(""));
        pairs.append_pair("UserPass", &config.user_password);

        if with_default_print_type && !data.contains_key("PrintType") {
            pairs.append_pair("PrintType", &config.print_type.to_string());
        }

        for (key, value) in data {
            pairs.append_pair(key, &query_value(value));
        }
    }

    PrintUrlResult {
        status: 200,
        error: String::new(),
        url: Some(url),
    }
}

/// Build the RPC request descriptor: envelope body, fixed headers,
/// flattened query params, then transport overrides applied last.
fn build_rpc_request(
    method: HttpMethod,
    endpoint: &str,
    data: &Map<String, Value>,
    params: &Map<String, Value>,
    config: &ClientConfig,
) -> Result<HttpRequest, ApiError> {
    let envelope = build_envelope(endpoint, data, config);
    let body = serde_json::to_string(&envelope)
        .map_err(|err| ApiError::SerializationError(err.to_string()))?;

    let mut request = HttpRequest {
        method,
        url: RPC_URL.to_string(),
        headers: vec![
            (
                "User-Agent".to_string(),
                format!(
                    "ACS Courier REST API - Rust Client/{}",
                    env!("CARGO_PKG_VERSION")
                ),
            ),
            ("Accept".to_string(), "application/json".to_string()),
            ("AcsApiKey".to_string(), config.api_key.clone()),
            // Only set because every RPC call carries a JSON body.
            ("Content-Type".to_string(), "application/json".to_string()),
        ],
        query: flatten_params(params),
        body: Some(body),
        timeout: config.timeout,
        response_encoding: config.encoding.clone(),
        extra: Map::new(),
    };

    apply_overrides(&mut request, &config.transport_overrides);
    Ok(request)
}

/// Build `ACSInputParameters` in wire order: credentials first, then caller
/// data. `Billing_Code` appears only in `ACS_Create_Voucher` envelopes and
/// is otherwise absent entirely. `User_ID` is omitted when unset.
fn build_envelope(endpoint: &str, data: &Map<String, Value>, config: &ClientConfig) -> Value {
    let mut input = Map::new();
    input.insert(
        "Company_ID".to_string(),
        Value::String(config.company_id.clone()),
    );
    input.insert(
        "Company_Password".to_string(),
        Value::String(config.company_password.clone()),
    );
    if let Some(user_id) = &config.user_id {
        input.insert("User_ID".to_string(), Value::String(user_id.clone()));
    }
    input.insert(
        "User_Password".to_string(),
        Value::String(config.user_password.clone()),
    );
    if endpoint == CREATE_VOUCHER_ENDPOINT {
        input.insert(
            "Billing_Code".to_string(),
            Value::String(config.billing_code.clone()),
        );
    }

    // Caller keys win on collision but keep the credential's position.
    for (key, value) in data {
        input.insert(key.clone(), value.clone());
    }

    let mut envelope = Map::new();
    envelope.insert("ACSAlias".to_string(), Value::String(endpoint.to_string()));
    envelope.insert("ACSInputParameters".to_string(), Value::Object(input));
    Value::Object(envelope)
}

/// Flatten extra query params one level: a top-level key `k` whose value is
/// an object with property `p` becomes the derived key `k[p]`; scalars pass
/// through. No recursion beyond one level.
pub fn flatten_params(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut query = Vec::new();
    for (key, value) in params {
        match value {
            Value::Object(inner) => {
                for (prop, item) in inner {
                    query.push((format!("{key}[{prop}]"), query_value(item)));
                }
            }
            other => query.push((key.clone(), query_value(other))),
        }
    }
    query
}

/// String conversion for query values: strings pass through unquoted,
/// everything else renders as its JSON text.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Apply transport overrides, last-wins. Recognized keys replace the
/// matching descriptor field wholesale (`headers` and `query` included);
/// unrecognized keys, or recognized keys of the wrong type, are carried in
/// `extra` for the transport to interpret.
fn apply_overrides(request: &mut HttpRequest, overrides: &Map<String, Value>) {
    for (key, value) in overrides {
        match (key.as_str(), value) {
            ("method", Value::String(s)) => match HttpMethod::parse(s) {
                Some(method) => request.method = method,
                None => {
                    request.extra.insert(key.clone(), value.clone());
                }
            },
            ("url", Value::String(s)) => request.url = s.clone(),
            ("headers", Value::Object(map)) => {
                request.headers = map
                    .iter()
                    .map(|(name, v)| (name.clone(), query_value(v)))
                    .collect();
            }
            ("query", Value::Object(map)) => request.query = flatten_params(map),
            ("body", Value::String(s)) => request.body = Some(s.clone()),
            ("timeout", Value::Number(n)) => match n.as_u64() {
                Some(ms) => request.timeout = Some(Duration::from_millis(ms)),
                None => {
                    request.extra.insert(key.clone(), value.clone());
                }
            },
            ("response_encoding", Value::String(s)) => {
                request.response_encoding = s.clone();
            }
            _ => {
                request.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientOptions;
    use serde_json::json;

    fn config() -> ClientConfig {
        ClientConfig::new(ClientOptions {
            company_id: Some("demo".to_string()),
            company_password: Some("demo".to_string()),
            user_id: Some("demo".to_string()),
            user_password: Some("demo".to_string()),
            billing_code: Some("2ΑΘ999999".to_string()),
            api_key: Some("5328eb0603974ac6bd4fc8339356dbf2".to_string()),
            ..ClientOptions::default()
        })
        .unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn rpc(shaped: ShapedRequest) -> HttpRequest {
        match shaped {
            ShapedRequest::Rpc(request) => request,
            other => panic!("expected Rpc, got {other:?}"),
        }
    }

    fn print(shaped: ShapedRequest) -> PrintUrlResult {
        match shaped {
            ShapedRequest::Print(result) => result,
            other => panic!("expected Print, got {other:?}"),
        }
    }

    fn input_parameters(request: &HttpRequest) -> Map<String, Value> {
        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        body["ACSInputParameters"].as_object().unwrap().clone()
    }

    #[test]
    fn classification_defaults_to_rpc() {
        assert_eq!(
            EndpointKind::classify("ACS_Print_Voucher"),
            EndpointKind::VoucherPrintRedirect
        );
        assert_eq!(
            EndpointKind::classify("ACS_Print_List"),
            EndpointKind::ListPrintRedirect
        );
        assert_eq!(
            EndpointKind::classify("ACS_Create_Voucher"),
            EndpointKind::RpcCall
        );
        assert_eq!(EndpointKind::classify(""), EndpointKind::RpcCall);
    }

    #[test]
    fn create_voucher_envelope_carries_billing_code() {
        let data = object(json!({ "Recipient_Name": "TEST" }));
        let shaped = shape(
            HttpMethod::Post,
            "ACS_Create_Voucher",
            &data,
            &Map::new(),
            &config(),
        )
        .unwrap();
        let request = rpc(shaped);

        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["ACSAlias"], "ACS_Create_Voucher");
        let input = body["ACSInputParameters"].as_object().unwrap();
        assert_eq!(input["Company_ID"], "demo");
        assert_eq!(input["Company_Password"], "demo");
        assert_eq!(input["User_ID"], "demo");
        assert_eq!(input["User_Password"], "demo");
        assert_eq!(input["Billing_Code"], "2ΑΘ999999");
        assert_eq!(input["Recipient_Name"], "TEST");
    }

    #[test]
    fn other_endpoints_omit_billing_code_entirely() {
        let data = object(json!({ "Voucher_No": "7400000000" }));
        let shaped = shape(
            HttpMethod::Post,
            "ACS_Trackingdetails",
            &data,
            &Map::new(),
            &config(),
        )
        .unwrap();
        let input = input_parameters(&rpc(shaped));
        assert!(!input.contains_key("Billing_Code"));
        assert_eq!(input["Voucher_No"], "7400000000");
    }

    #[test]
    fn caller_data_overrides_credentials_in_place() {
        let data = object(json!({ "Company_ID": "override", "Weight": 0.5 }));
        let shaped = shape(
            HttpMethod::Post,
            "ACS_Create_Voucher",
            &data,
            &Map::new(),
            &config(),
        )
        .unwrap();
        let input = input_parameters(&rpc(shaped));
        assert_eq!(input["Company_ID"], "override");
        // Overridden key keeps the credential's leading position.
        assert_eq!(input.keys().next().unwrap(), "Company_ID");
        assert_eq!(input["Weight"], 0.5);
    }

    #[test]
    fn caller_billing_code_passes_through_on_non_create_endpoints() {
        // The credential Billing_Code is injected only for create calls,
        // but a Billing_Code the caller puts in its own data is caller
        // data like any other key and survives on every endpoint.
        let data = object(json!({ "Billing_Code": "CALLER", "Voucher_No": "123" }));
        let shaped = shape(
            HttpMethod::Post,
            "ACS_Trackingdetails",
            &data,
            &Map::new(),
            &config(),
        )
        .unwrap();
        let input = input_parameters(&rpc(shaped));
        assert_eq!(input["Billing_Code"], "CALLER");
    }

    #[test]
    fn user_id_is_omitted_from_envelope_when_unset() {
        let mut no_user = config();
        no_user.user_id = None;
        let shaped = shape(
            HttpMethod::Post,
            "ACS_Trackingdetails",
            &Map::new(),
            &Map::new(),
            &no_user,
        )
        .unwrap();
        let input = input_parameters(&rpc(shaped));
        assert!(!input.contains_key("User_ID"));
    }

    #[test]
    fn rpc_request_has_fixed_headers_and_url() {
        let shaped = shape(
            HttpMethod::Get,
            "ACS_Address_Validation",
            &Map::new(),
            &Map::new(),
            &config(),
        )
        .unwrap();
        let request = rpc(shaped);

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, RPC_URL);
        assert_eq!(request.response_encoding, "utf8");
        let headers: Vec<&str> = request.headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            headers,
            ["User-Agent", "Accept", "AcsApiKey", "Content-Type"]
        );
        let user_agent = &request.headers[0].1;
        assert!(user_agent.starts_with("ACS Courier REST API - Rust Client/"));
        assert_eq!(request.headers[2].1, "5328eb0603974ac6bd4fc8339356dbf2");
        assert_eq!(request.headers[3].1, "application/json");
    }

    #[test]
    fn params_flatten_one_level() {
        let params = object(json!({ "Filter": { "Status": "A", "Type": "B" }, "Page": 2 }));
        let flattened = flatten_params(&params);
        assert_eq!(
            flattened,
            vec![
                ("Filter[Status]".to_string(), "A".to_string()),
                ("Filter[Type]".to_string(), "B".to_string()),
                ("Page".to_string(), "2".to_string()),
            ]
        );
        // No bare key survives for flattened objects.
        assert!(flattened.iter().all(|(k, _)| k != "Filter"));
    }

    #[test]
    fn print_voucher_appends_default_print_type() {
        let data = object(json!({ "voucherno": "123", "StartFromNumber": 1 }));
        let result = print(
            shape(
                HttpMethod::Get,
                "ACS_Print_Voucher",
                &data,
                &Map::new(),
                &config(),
            )
            .unwrap(),
        );

        assert_eq!(result.status, 200);
        assert_eq!(result.error, "");
        let url = result.url.unwrap();
        assert!(url.as_str().starts_with(GET_VOUCHER_URL));
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("MainID".to_string(), "demo".to_string()),
                ("MainPass".to_string(), "demo".to_string()),
                ("UserID".to_string(), "demo".to_string()),
                ("UserPass".to_string(), "demo".to_string()),
                ("PrintType".to_string(), "2".to_string()),
                ("voucherno".to_string(), "123".to_string()),
                ("StartFromNumber".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn caller_print_type_suppresses_default() {
        let data = object(json!({ "PrintType": 1, "voucherno": "123" }));
        let result = print(
            shape(
                HttpMethod::Get,
                "ACS_Print_Voucher",
                &data,
                &Map::new(),
                &config(),
            )
            .unwrap(),
        );
        let url = result.url.unwrap();
        let print_types: Vec<String> = url
            .query_pairs()
            .filter(|(k, _)| k == "PrintType")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(print_types, ["1"]);
    }

    #[test]
    fn print_url_user_id_is_empty_when_unset() {
        let mut no_user = config();
        no_user.user_id = None;
        let data = object(json!({ "voucherno": "123" }));
        let result = print(
            shape(HttpMethod::Get, "ACS_Print_Voucher", &data, &Map::new(), &no_user).unwrap(),
        );

        let url = result.url.unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        // The parameter list is fixed: UserID still appears, empty.
        assert_eq!(pairs[2], ("UserID".to_string(), String::new()));
        assert_eq!(pairs[3].0, "UserPass");
    }

    #[test]
    fn print_list_never_gets_print_type() {
        let data = object(json!({ "pickup_date": "2024-01-31" }));
        let result = print(
            shape(
                HttpMethod::Get,
                "ACS_Print_List",
                &data,
                &Map::new(),
                &config(),
            )
            .unwrap(),
        );
        let url = result.url.unwrap();
        assert!(url.as_str().starts_with(GET_LIST_URL));
        assert!(url.query_pairs().all(|(k, _)| k != "PrintType"));
    }

    #[test]
    fn print_path_ignores_params() {
        let data = object(json!({ "voucherno": "123" }));
        let params = object(json!({ "Filter": { "Status": "A" } }));
        let result = print(
            shape(HttpMethod::Get, "ACS_Print_Voucher", &data, &params, &config()).unwrap(),
        );
        let url = result.url.unwrap();
        assert!(url.query_pairs().all(|(k, _)| k != "Filter[Status]"));
    }

    #[test]
    fn overrides_replace_method_url_and_headers() {
        let mut cfg = config();
        cfg.transport_overrides = object(json!({
            "method": "post",
            "url": "http://127.0.0.1:9999/rpc",
            "headers": { "X-Test": "1" },
            "query": { "trace": { "id": "7" } },
            "body": "{\"raw\":true}",
            "timeout": 1500,
            "response_encoding": "latin7",
            "proxy": "socks5://localhost:1080"
        }));
        let shaped = shape(
            HttpMethod::Get,
            "ACS_Trackingdetails",
            &Map::new(),
            &Map::new(),
            &cfg,
        )
        .unwrap();
        let request = rpc(shaped);

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "http://127.0.0.1:9999/rpc");
        assert_eq!(
            request.headers,
            vec![("X-Test".to_string(), "1".to_string())]
        );
        assert_eq!(
            request.query,
            vec![("trace[id]".to_string(), "7".to_string())]
        );
        assert_eq!(request.body.as_deref(), Some("{\"raw\":true}"));
        assert_eq!(request.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(request.response_encoding, "latin7");
        assert_eq!(request.extra["proxy"], "socks5://localhost:1080");
    }

    #[test]
    fn mistyped_override_lands_in_extra() {
        let mut cfg = config();
        cfg.transport_overrides = object(json!({ "method": 7, "timeout": "fast" }));
        let request = rpc(
            shape(
                HttpMethod::Get,
                "ACS_Trackingdetails",
                &Map::new(),
                &Map::new(),
                &cfg,
            )
            .unwrap(),
        );
        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.timeout.is_none());
        assert_eq!(request.extra["method"], 7);
        assert_eq!(request.extra["timeout"], "fast");
    }

    #[test]
    fn query_values_render_without_quotes() {
        let params = object(json!({ "s": "text", "n": 50.5, "b": true, "z": null }));
        let flattened = flatten_params(&params);
        assert_eq!(
            flattened,
            vec![
                ("s".to_string(), "text".to_string()),
                ("n".to_string(), "50.5".to_string()),
                ("b".to_string(), "true".to_string()),
                ("z".to_string(), "null".to_string()),
            ]
        );
    }
}
