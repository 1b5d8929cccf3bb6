use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    accepted: u64,
    quarantined: u64,
    malformed: u64,
    unregistered_device: u64,
    device_revoked: u64,
    site_mismatch: u64,
    invalid_token: u64,
    rate_limited: u64,
}

/// `GET /health` — liveness probe reporting ingest counters (spec.md §5).
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let stats = state.ingest.stats();
    let body = HealthResponse {
        status: "ok",
        accepted: stats.accepted,
        quarantined: stats.quarantined_total(),
        malformed: stats.malformed,
        unregistered_device: stats.unregistered_device,
        device_revoked: stats.device_revoked,
        site_mismatch: stats.site_mismatch,
        invalid_token: stats.invalid_token,
        rate_limited: stats.rate_limited,
    };
    (StatusCode::OK, Json(body))
}
