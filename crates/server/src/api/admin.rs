use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use opspulse_core::{Alert, DeliveryJob, JobId, QuarantineEvent, TenantId};
use opspulse_tenant::{record_operator_bypass, TenantContext};

use super::AppState;
use crate::error::ServerError;

const ADMIN_KEY_HEADER: &str = "x-admin-api-key";

/// Every admin handler authenticates the bearer key, then constructs an
/// operator [`TenantContext`] and records the bypass before touching
/// tenant-scoped state (spec.md §4.7's fail-closed/audit-before-query
/// contract — `record_operator_bypass` both logs and returns an audit
/// record, so one call satisfies both).
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<(), ServerError> {
    let key = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServerError::Unauthorized("missing admin API key".to_owned()))?;
    state
        .admin_keys
        .authenticate(key)
        .ok_or_else(|| ServerError::Unauthorized("invalid admin API key".to_owned()))?;
    Ok(())
}

/// `GET /admin/v1/tenant/{tenant_id}/quarantine`.
pub async fn list_quarantine(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<QuarantineEvent>>, ServerError> {
    authenticate(&state, &headers)?;
    let ctx = TenantContext::operator(TenantId::new(tenant_id.clone()));
    record_operator_bypass(&ctx, "list_quarantine");

    let events: Vec<QuarantineEvent> = state
        .quarantine
        .recent(200)
        .into_iter()
        .filter(|e| e.tenant_id.as_str() == tenant_id)
        .collect();
    Ok(Json(events))
}

/// `GET /admin/v1/tenant/{tenant_id}/alerts`.
pub async fn list_alerts(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Alert>>, ServerError> {
    authenticate(&state, &headers)?;
    let tenant_id = TenantId::new(tenant_id);
    let ctx = TenantContext::operator(tenant_id.clone());
    record_operator_bypass(&ctx, "list_alerts");

    let alerts = state.alerts.list_open(&tenant_id).await?;
    Ok(Json(alerts))
}

/// `GET /admin/v1/tenant/{tenant_id}/jobs/dead`.
pub async fn list_dead_jobs(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<DeliveryJob>>, ServerError> {
    authenticate(&state, &headers)?;
    let tenant_id = TenantId::new(tenant_id);
    let ctx = TenantContext::operator(tenant_id.clone());
    record_operator_bypass(&ctx, "list_dead_jobs");

    let jobs = state.jobs.list_dead(&tenant_id).await?;
    Ok(Json(jobs))
}

/// `POST /admin/v1/tenant/{tenant_id}/jobs/{job_id}/requeue`.
///
/// Reads the job's current `attempt` so the requeue doesn't silently reset
/// the retry counter, then re-enters it as `PENDING` via `mark_retry`.
pub async fn requeue_job(
    State(state): State<AppState>,
    Path((tenant_id, job_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ServerError> {
    authenticate(&state, &headers)?;
    let tenant_id = TenantId::new(tenant_id);
    let ctx = TenantContext::operator(tenant_id.clone());
    record_operator_bypass(&ctx, "requeue_job");

    let job_id = JobId::new(job_id);
    let job = state
        .jobs
        .get(&tenant_id, &job_id)
        .await?
        .ok_or(ServerError::NotFound)?;

    state
        .jobs
        .mark_retry(&job_id, job.attempt, Utc::now(), "requeued by operator")
        .await?;
    Ok(StatusCode::ACCEPTED)
}
