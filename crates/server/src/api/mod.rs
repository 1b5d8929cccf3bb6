pub mod admin;
pub mod health;
pub mod ingest;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use opspulse_cache::AuthCache;
use opspulse_ingest::IngestPipeline;
use opspulse_ingest::InMemoryQuarantineSink;
use opspulse_state::{AlertStore, DeliveryJobStore, DeviceRegistryStore};
use tower_http::trace::TraceLayer;

use crate::auth::AdminApiKeys;

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestPipeline>,
    pub cache: Arc<AuthCache>,
    pub registry: Arc<dyn DeviceRegistryStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub jobs: Arc<dyn DeliveryJobStore>,
    pub quarantine: Arc<InMemoryQuarantineSink>,
    pub admin_keys: Arc<AdminApiKeys>,
}

/// Build the device-ingress + admin Axum router (spec.md §6 "HTTP Ingress API").
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/ingest/v1/tenant/{tenant_id}/device/{device_id}/telemetry",
            post(ingest::telemetry),
        )
        .route(
            "/ingest/v1/tenant/{tenant_id}/device/{device_id}/heartbeat",
            post(ingest::heartbeat),
        )
        .route("/ingest/v1/tenant/{tenant_id}/batch", post(ingest::batch))
        .route(
            "/admin/v1/tenant/{tenant_id}/quarantine",
            get(admin::list_quarantine),
        )
        .route("/admin/v1/tenant/{tenant_id}/alerts", get(admin::list_alerts))
        .route(
            "/admin/v1/tenant/{tenant_id}/jobs/dead",
            get(admin::list_dead_jobs),
        )
        .route(
            "/admin/v1/tenant/{tenant_id}/jobs/{job_id}/requeue",
            post(admin::requeue_job),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
