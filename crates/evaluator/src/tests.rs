#![cfg(test)]

use std::sync::Arc;

use chrono::Utc;
use opspulse_core::{
    AlertRule, Comparator, DeviceId, DeviceRegistryEntry, DeviceStatus, Liveness, RuleId, Severity,
    SiteId, TenantId,
};
use opspulse_state::{AlertRuleStore, AlertStore, DeviceRegistryStore, DeviceStateStore, LatestSampleStore};
use opspulse_state_memory::MemoryBackend;

use crate::config::EvaluatorConfig;
use crate::evaluator::Evaluator;
use crate::tenants::StaticTenantSource;

#[tokio::test]
async fn offline_device_gets_no_heartbeat_alert_and_recovers() {
    let backend = Arc::new(MemoryBackend::default());
    let tenant = TenantId::new("t1");
    let device = DeviceId::new("d1");
    let site = SiteId::new("s1");

    let long_ago = Utc::now() - chrono::Duration::seconds(400);
    DeviceStateStore::touch(backend.as_ref(), &tenant, &device, &site, long_ago).await.unwrap();

    let config = EvaluatorConfig::default();
    let evaluator = Evaluator::new(
        config,
        Arc::new(StaticTenantSource::new(vec![tenant.clone()])),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
    );

    evaluator.tick().await;

    let state = DeviceStateStore::get(backend.as_ref(), &tenant, &device).await.unwrap().unwrap();
    assert_eq!(state.liveness, Liveness::Offline);
    let open = AlertStore::list_open(backend.as_ref(), &tenant).await.unwrap();
    assert_eq!(open.len(), 1);

    DeviceStateStore::touch(backend.as_ref(), &tenant, &device, &site, Utc::now()).await.unwrap();
    evaluator.tick().await;

    let open = AlertStore::list_open(backend.as_ref(), &tenant).await.unwrap();
    assert!(open.is_empty());
}

#[tokio::test]
async fn threshold_rule_opens_and_closes_alert() {
    let backend = Arc::new(MemoryBackend::default());
    let tenant = TenantId::new("t1");
    let device = DeviceId::new("d1");
    let site = SiteId::new("s1");

    DeviceRegistryStore::upsert(
        backend.as_ref(),
        DeviceRegistryEntry {
            tenant_id: tenant.clone(),
            device_id: device.clone(),
            site_id: site.clone(),
            status: DeviceStatus::Active,
            provision_token_hash: String::new(),
            subscription_id: None,
        },
    )
    .await
    .unwrap();

    AlertRuleStore::upsert(
        backend.as_ref(),
        AlertRule {
            tenant_id: tenant.clone(),
            rule_id: RuleId::new("r1"),
            metric_name: "temp_c".into(),
            comparator: Comparator::Gt,
            threshold: 50.0,
            device_selector: "*".into(),
            severity: Severity::Critical,
            enabled: true,
        },
    )
    .await
    .unwrap();

    LatestSampleStore::record(
        backend.as_ref(),
        &tenant,
        &device,
        "temp_c",
        opspulse_core::MetricValue::Float(60.0),
        Utc::now(),
    )
    .await
    .unwrap();

    let evaluator = Evaluator::new(
        EvaluatorConfig::default(),
        Arc::new(StaticTenantSource::new(vec![tenant.clone()])),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
    );

    evaluator.tick().await;
    let open = AlertStore::list_open(backend.as_ref(), &tenant).await.unwrap();
    assert_eq!(open.len(), 1);

    LatestSampleStore::record(
        backend.as_ref(),
        &tenant,
        &device,
        "temp_c",
        opspulse_core::MetricValue::Float(10.0),
        Utc::now(),
    )
    .await
    .unwrap();
    evaluator.tick().await;

    let open = AlertStore::list_open(backend.as_ref(), &tenant).await.unwrap();
    assert!(open.is_empty());
}
