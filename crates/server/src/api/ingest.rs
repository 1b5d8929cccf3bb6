use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use opspulse_ingest::{precheck_auth, InboundMessage, MsgType};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ServerError;

const PROVISION_TOKEN_HEADER: &str = "x-provision-token";
const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct TelemetryBody {
    pub site_id: String,
    #[serde(default)]
    pub seq: i64,
    #[serde(default)]
    pub metrics: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    accepted: bool,
}

fn provision_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(PROVISION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

async fn submit(
    state: &AppState,
    msg: InboundMessage,
) -> Result<(), ServerError> {
    precheck_auth(&msg, &state.cache, state.registry.as_ref())
        .await
        .map_err(|failure| match failure {
            opspulse_ingest::ValidateFailure::Quarantine(reason) => ServerError::Rejected(reason),
            opspulse_ingest::ValidateFailure::Backend(e) => ServerError::Backend(e),
        })?;

    let raw = serde_json::to_string(&msg).expect("InboundMessage always serializes");
    state.ingest.submit(raw).map_err(ServerError::from)
}

/// `POST /ingest/v1/tenant/{tenant_id}/device/{device_id}/telemetry` (spec.md §6).
pub async fn telemetry(
    State(state): State<AppState>,
    Path((tenant_id, device_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<TelemetryBody>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ServerError> {
    let msg = InboundMessage {
        tenant_id,
        device_id,
        site_id: body.site_id,
        msg_type: MsgType::Telemetry,
        seq: body.seq,
        metrics: body.metrics,
        provision_token: provision_token(&headers),
    };
    submit(&state, msg).await?;
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { accepted: true })))
}

/// `POST /ingest/v1/tenant/{tenant_id}/device/{device_id}/heartbeat`.
///
/// Not named in spec.md's HTTP doc, but the pipeline already models
/// `MsgType::Heartbeat` end to end and the MQTT ingress documents both
/// message types (spec.md §6 "Broker"), so the HTTP surface carries it too.
pub async fn heartbeat(
    State(state): State<AppState>,
    Path((tenant_id, device_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<TelemetryBody>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ServerError> {
    let msg = InboundMessage {
        tenant_id,
        device_id,
        site_id: body.site_id,
        msg_type: MsgType::Heartbeat,
        seq: body.seq,
        metrics: serde_json::Value::Null,
        provision_token: provision_token(&headers),
    };
    submit(&state, msg).await?;
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { accepted: true })))
}

#[derive(Debug, Deserialize)]
pub struct BatchItem {
    pub tenant_id: String,
    pub device_id: String,
    pub site_id: String,
    pub msg_type: MsgType,
    #[serde(default)]
    pub seq: i64,
    #[serde(default)]
    pub metrics: serde_json::Value,
    pub provision_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    accepted: usize,
    rejected: usize,
}

/// `POST /ingest/v1/tenant/{tenant_id}/batch`, capped at
/// [`MAX_BATCH_SIZE`] items. Each item carries its own `provision_token`
/// since a batch can span multiple devices.
pub async fn batch(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(items): Json<Vec<BatchItem>>,
) -> Result<(StatusCode, Json<BatchResponse>), ServerError> {
    if items.len() > MAX_BATCH_SIZE {
        return Err(ServerError::Config(format!(
            "batch exceeds maximum of {MAX_BATCH_SIZE} items"
        )));
    }

    let mut accepted = 0;
    let mut rejected = 0;
    for item in items {
        let msg = InboundMessage {
            tenant_id: tenant_id.clone(),
            device_id: item.device_id,
            site_id: item.site_id,
            msg_type: item.msg_type,
            seq: item.seq,
            metrics: item.metrics,
            provision_token: item.provision_token,
        };
        match submit(&state, msg).await {
            Ok(()) => accepted += 1,
            Err(_) => rejected += 1,
        }
    }

    Ok((StatusCode::ACCEPTED, Json(BatchResponse { accepted, rejected })))
}
