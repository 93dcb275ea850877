//! In-memory stand-in for the ACS courier RPC endpoint, used by the core
//! crate's integration tests.
//!
//! Speaks just enough of the remote protocol to exercise a client: one POST
//! route accepting the `{ACSAlias, ACSInputParameters}` envelope, guarded
//! by the `AcsApiKey` header, answering with the service's
//! `ACSOutputResponce` schema. Application-level failures (unknown alias,
//! missing fields) come back as HTTP 200 with a non-empty
//! `ACSExecutionErrorMessage`, the way the real service reports them.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// The RPC envelope every call arrives in.
#[derive(Debug, Deserialize)]
pub struct RpcEnvelope {
    #[serde(rename = "ACSAlias")]
    pub alias: String,
    #[serde(rename = "ACSInputParameters")]
    pub input: Map<String, Value>,
}

pub struct ServerState {
    api_key: String,
    vouchers: RwLock<HashMap<String, Map<String, Value>>>,
    next_voucher: AtomicU64,
}

pub type SharedState = Arc<ServerState>;

pub fn app(api_key: &str) -> Router {
    let state: SharedState = Arc::new(ServerState {
        api_key: api_key.to_string(),
        vouchers: RwLock::new(HashMap::new()),
        next_voucher: AtomicU64::new(7_400_000_001),
    });
    // The real service answers the envelope on GET as well as POST;
    // clients shape tracking lookups as GETs carrying a JSON body.
    Router::new()
        .route("/ACSRestServices/api/ACSAutoRest", post(rpc).get(rpc))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

async fn rpc(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(envelope): Json<RpcEnvelope>,
) -> Result<Json<Value>, StatusCode> {
    let key = headers.get("AcsApiKey").and_then(|v| v.to_str().ok());
    if key != Some(state.api_key.as_str()) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let response = match envelope.alias.as_str() {
        "ACS_Create_Voucher" => create_voucher(&state, envelope.input).await,
        "ACS_Trackingdetails" => tracking_details(&state, &envelope.input).await,
        other => rpc_response(&format!("Unknown ACSAlias: {other}"), Vec::new()),
    };
    Ok(Json(response))
}

/// Wrap value rows in the service's response schema.
fn rpc_response(error: &str, rows: Vec<Value>) -> Value {
    json!({
        "ACSExecutionErrorMessage": error,
        "ACSOutputResponce": {
            "ACSValueOutput": rows,
            "ACSTableOutput": {},
        },
    })
}

async fn create_voucher(state: &ServerState, input: Map<String, Value>) -> Value {
    for field in ["Company_ID", "Company_Password", "User_Password", "Billing_Code"] {
        if !input.contains_key(field) {
            return rpc_response(&format!("{field} is missing"), Vec::new());
        }
    }

    let voucher_no = state
        .next_voucher
        .fetch_add(1, Ordering::Relaxed)
        .to_string();
    state
        .vouchers
        .write()
        .await
        .insert(voucher_no.clone(), input);

    rpc_response(
        "",
        vec![json!({ "Voucher_No": voucher_no, "Error_Message": "" })],
    )
}

async fn tracking_details(state: &ServerState, input: &Map<String, Value>) -> Value {
    // Voucher numbers arrive as strings or bare numbers depending on the
    // caller; accept both.
    let voucher_no = input.get("Voucher_No").and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let Some(voucher_no) = voucher_no else {
        return rpc_response("Voucher_No is missing", Vec::new());
    };

    if !state.vouchers.read().await.contains_key(&voucher_no) {
        return rpc_response(
            "",
            vec![json!({ "Error_Message": "No tracking data found for this voucher" })],
        );
    }

    rpc_response(
        "",
        vec![
            json!({
                "checkpoint_date_time": "2024-01-31T09:00:00",
                "checkpoint_action": "Picked up",
                "checkpoint_location": "ATHENS",
                "Error_Message": "",
            }),
            json!({
                "checkpoint_date_time": "2024-01-31T18:30:00",
                "checkpoint_action": "Delivered",
                "checkpoint_location": "ATHENS",
                "Error_Message": "",
            }),
        ],
    )
}
