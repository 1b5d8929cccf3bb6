#![cfg(test)]

use std::sync::Arc;

use chrono::Utc;
use opspulse_core::{
    Alert, AlertId, AlertStatus, AlertType, DeviceId, Integration, IntegrationId, IntegrationKind,
    Route, RouteId, Severity, TenantId,
};
use opspulse_state::{AlertStore, DeliveryJobStore, RouteStore};
use opspulse_state_memory::MemoryBackend;

use crate::config::DispatcherConfig;
use crate::dispatcher::Dispatcher;
use crate::tenants::StaticTenantSource;

fn open_alert(tenant: &TenantId, fingerprint: &str) -> Alert {
    Alert {
        tenant_id: tenant.clone(),
        alert_id: AlertId::new(uuid::Uuid::now_v7().to_string()),
        device_id: DeviceId::new("d1"),
        alert_type: AlertType::Threshold,
        rule_id: None,
        severity: Severity::Critical,
        status: AlertStatus::Open,
        fingerprint: fingerprint.to_owned(),
        opened_at: Utc::now(),
        last_seen_at: Utc::now(),
        closed_at: None,
        details: serde_json::json!({"metric": "temp_c"}),
    }
}

async fn seed_route(backend: &MemoryBackend, tenant: &TenantId, throttle_seconds: Option<u64>) {
    RouteStore::upsert_integration(
        backend,
        Integration {
            tenant_id: tenant.clone(),
            integration_id: IntegrationId::new("i1"),
            kind: IntegrationKind::Webhook { url: "https://example.com/hook".into(), hmac_secret: None },
        },
    )
    .await
    .unwrap();

    RouteStore::upsert_route(
        backend,
        Route {
            tenant_id: tenant.clone(),
            route_id: RouteId::new("r1"),
            integration_id: IntegrationId::new("i1"),
            min_severity: Severity::Warning,
            alert_types: vec![],
            device_selector: None,
            device_selector_raw: "*".into(),
            throttle_seconds,
            payload_template: None,
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn matching_route_produces_a_pending_delivery_job() {
    let backend = Arc::new(MemoryBackend::default());
    let tenant = TenantId::new("t1");
    seed_route(&backend, &tenant, None).await;

    AlertStore::open_or_touch(backend.as_ref(), &tenant, "fp1", open_alert(&tenant, "fp1")).await.unwrap();

    let dispatcher = Dispatcher::new(
        DispatcherConfig::default(),
        Arc::new(StaticTenantSource::new(vec![tenant.clone()])),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
    );
    dispatcher.tick().await;

    let due = DeliveryJobStore::claim_due(backend.as_ref(), Utc::now(), 10, "worker-1", Utc::now() + chrono::Duration::seconds(30))
        .await
        .unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].tenant_id, tenant);
    assert_eq!(due[0].route_id.as_str(), "r1");
}

#[tokio::test]
async fn running_twice_for_the_same_alert_creates_only_one_job() {
    let backend = Arc::new(MemoryBackend::default());
    let tenant = TenantId::new("t1");
    seed_route(&backend, &tenant, Some(300)).await;

    AlertStore::open_or_touch(backend.as_ref(), &tenant, "fp1", open_alert(&tenant, "fp1")).await.unwrap();

    let dispatcher = Dispatcher::new(
        DispatcherConfig::default(),
        Arc::new(StaticTenantSource::new(vec![tenant.clone()])),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
    );
    dispatcher.tick().await;
    dispatcher.tick().await;

    let due = DeliveryJobStore::claim_due(backend.as_ref(), Utc::now(), 10, "worker-1", Utc::now() + chrono::Duration::seconds(30))
        .await
        .unwrap();
    assert_eq!(due.len(), 1, "throttle must suppress the duplicate tick");
}

#[tokio::test]
async fn severity_below_route_minimum_produces_no_job() {
    let backend = Arc::new(MemoryBackend::default());
    let tenant = TenantId::new("t1");
    seed_route(&backend, &tenant, None).await;

    let mut low = open_alert(&tenant, "fp1");
    low.severity = Severity::Info;
    AlertStore::open_or_touch(backend.as_ref(), &tenant, "fp1", low).await.unwrap();

    let dispatcher = Dispatcher::new(
        DispatcherConfig::default(),
        Arc::new(StaticTenantSource::new(vec![tenant.clone()])),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
    );
    dispatcher.tick().await;

    let due = DeliveryJobStore::claim_due(backend.as_ref(), Utc::now(), 10, "worker-1", Utc::now() + chrono::Duration::seconds(30))
        .await
        .unwrap();
    assert!(due.is_empty());
}
