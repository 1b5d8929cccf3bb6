#![cfg(test)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use opspulse_core::{DeliveryJob, Integration, IntegrationId, IntegrationKind, JobId, JobState, RouteId, TenantId};
use opspulse_provider::{ProviderError, Sender};
use opspulse_state::{DeliveryJobStore, RouteStore};
use opspulse_state_memory::MemoryBackend;

use crate::config::DeliveryConfig;
use crate::senders::SenderRegistry;
use crate::worker::DeliveryWorker;

struct AlwaysSucceed;

#[async_trait]
impl Sender for AlwaysSucceed {
    async fn send(&self, _job: &DeliveryJob, _integration: &Integration, _correlation_id: &str) -> Result<serde_json::Value, ProviderError> {
        Ok(serde_json::json!({"ok": true}))
    }
}

struct CountingFailures(Arc<AtomicUsize>);

#[async_trait]
impl Sender for CountingFailures {
    async fn send(&self, _job: &DeliveryJob, _integration: &Integration, _correlation_id: &str) -> Result<serde_json::Value, ProviderError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Connection("connection refused".into()))
    }
}

async fn seed_route(backend: &MemoryBackend, tenant: &TenantId) {
    backend
        .upsert_integration(Integration {
            tenant_id: tenant.clone(),
            integration_id: IntegrationId::new("i1"),
            kind: IntegrationKind::Webhook { url: "https://example.com/hook".into(), hmac_secret: None },
        })
        .await
        .unwrap();
    backend
        .upsert_route(opspulse_core::Route {
            tenant_id: tenant.clone(),
            route_id: RouteId::new("r1"),
            integration_id: IntegrationId::new("i1"),
            min_severity: opspulse_core::Severity::Info,
            alert_types: vec![],
            device_selector: None,
            device_selector_raw: "*".into(),
            throttle_seconds: None,
            payload_template: None,
        })
        .await
        .unwrap();
}

fn pending_job(tenant: &TenantId) -> DeliveryJob {
    DeliveryJob {
        job_id: JobId::new(uuid::Uuid::now_v7().to_string()),
        tenant_id: tenant.clone(),
        alert_id: opspulse_core::AlertId::new("a1"),
        route_id: RouteId::new("r1"),
        attempt: 0,
        next_attempt_at: Utc::now(),
        state: JobState::Pending,
        last_error: None,
        payload: serde_json::json!({"severity": "critical"}),
        lease: None,
    }
}

#[tokio::test]
async fn successful_delivery_marks_the_job_succeeded() {
    let backend = Arc::new(MemoryBackend::default());
    let tenant = TenantId::new("t1");
    seed_route(&backend, &tenant).await;
    let job = pending_job(&tenant);
    let job_id = job.job_id.clone();
    backend.insert(job).await.unwrap();

    let senders = SenderRegistry::new(Arc::new(AlwaysSucceed), Arc::new(AlwaysSucceed), Arc::new(AlwaysSucceed), Arc::new(AlwaysSucceed));
    let worker = DeliveryWorker::new(DeliveryConfig::default(), backend.clone(), backend.clone(), senders);

    let claimed = worker.tick().await;
    assert_eq!(claimed, 1);

    let stored = backend.get(&tenant, &job_id).await.unwrap().unwrap();
    assert_eq!(stored.state, JobState::Succeeded);
}

#[tokio::test]
async fn failed_delivery_retries_with_backoff_until_dead() {
    let backend = Arc::new(MemoryBackend::default());
    let tenant = TenantId::new("t1");
    seed_route(&backend, &tenant).await;
    let job = pending_job(&tenant);
    let job_id = job.job_id.clone();
    backend.insert(job).await.unwrap();

    let failures = Arc::new(AtomicUsize::new(0));
    let senders = SenderRegistry::new(
        Arc::new(CountingFailures(failures.clone())),
        Arc::new(AlwaysSucceed),
        Arc::new(AlwaysSucceed),
        Arc::new(AlwaysSucceed),
    );
    let mut config = DeliveryConfig::default();
    config.max_attempts = 2;
    config.base_backoff = std::time::Duration::ZERO;
    config.max_backoff = std::time::Duration::ZERO;
    let worker = DeliveryWorker::new(config, backend.clone(), backend.clone(), senders);

    worker.tick().await;
    let stored = backend.get(&tenant, &job_id).await.unwrap().unwrap();
    assert_eq!(stored.state, JobState::Pending, "first failure retries, not dead yet");
    assert_eq!(stored.attempt, 1);

    worker.tick().await;
    let stored = backend.get(&tenant, &job_id).await.unwrap().unwrap();
    assert_eq!(stored.state, JobState::Dead, "second failure exhausts max_attempts");
    assert_eq!(failures.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn missing_route_marks_the_job_dead_without_calling_a_sender() {
    let backend = Arc::new(MemoryBackend::default());
    let tenant = TenantId::new("t1");
    // No route/integration seeded: route_id "r1" does not resolve.
    let job = pending_job(&tenant);
    let job_id = job.job_id.clone();
    backend.insert(job).await.unwrap();

    let senders = SenderRegistry::default();
    let worker = DeliveryWorker::new(DeliveryConfig::default(), backend.clone(), backend.clone(), senders);
    worker.tick().await;

    let stored = backend.get(&tenant, &job_id).await.unwrap().unwrap();
    assert_eq!(stored.state, JobState::Dead);
}

#[tokio::test]
async fn reap_expired_leases_recovers_stuck_jobs() {
    let backend = Arc::new(MemoryBackend::default());
    let tenant = TenantId::new("t1");
    seed_route(&backend, &tenant).await;
    backend.insert(pending_job(&tenant)).await.unwrap();

    // Claim with an already-expired lease to simulate a crashed worker.
    let expired = Utc::now() - chrono::Duration::seconds(5);
    let claimed = backend.claim_due(Utc::now(), 10, "dead-worker", expired).await.unwrap();
    assert_eq!(claimed.len(), 1);

    let senders = SenderRegistry::default();
    let worker = DeliveryWorker::new(DeliveryConfig::default(), backend.clone(), backend.clone(), senders);
    let reaped = worker.reap_expired_leases().await;
    assert_eq!(reaped, 1);

    let claimed_again = backend.claim_due(Utc::now(), 10, "worker-2", Utc::now() + chrono::Duration::seconds(30)).await.unwrap();
    assert_eq!(claimed_again.len(), 1, "reaped job must be claimable again");
}
