//! In-memory implementations of every `opspulse-state` repository trait,
//! backed by one [`dashmap::DashMap`] per entity, rather than one opaque
//! string-keyed map shared across every entity kind.

mod alert;
mod backend;
mod device_state;
mod job;
mod registry;
mod route;
mod rule;
mod telemetry;

pub use backend::MemoryBackend;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use opspulse_core::{
        Alert, AlertId, AlertStatus, AlertType, DeviceId, DeviceRegistryEntry, DeviceStatus,
        Severity, SiteId, TenantId,
    };
    use opspulse_state::{AlertStore, DeviceRegistryStore, OpenOutcome};

    #[tokio::test]
    async fn registry_round_trip() {
        let backend = MemoryBackend::new();
        let tenant = TenantId::new("t1");
        let device = DeviceId::new("d1");
        backend
            .upsert(DeviceRegistryEntry {
                tenant_id: tenant.clone(),
                device_id: device.clone(),
                site_id: SiteId::new("s1"),
                status: DeviceStatus::Active,
                provision_token_hash: "h".into(),
                subscription_id: None,
            })
            .await
            .unwrap();
        let entry = backend.get(&tenant, &device).await.unwrap().unwrap();
        assert!(entry.is_active());

        backend.revoke(&tenant, &device).await.unwrap();
        let entry = backend.get(&tenant, &device).await.unwrap().unwrap();
        assert!(!entry.is_active());
    }

    fn alert(tenant: &TenantId, alert_id: &str, fingerprint: &str) -> Alert {
        Alert {
            tenant_id: tenant.clone(),
            alert_id: AlertId::new(alert_id),
            device_id: DeviceId::new("d1"),
            alert_type: AlertType::NoHeartbeat,
            rule_id: None,
            severity: Severity::Critical,
            status: AlertStatus::Open,
            fingerprint: fingerprint.to_owned(),
            opened_at: Utc::now(),
            last_seen_at: Utc::now(),
            closed_at: None,
            details: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn at_most_one_open_alert_per_fingerprint() {
        let backend = MemoryBackend::new();
        let tenant = TenantId::new("t1");

        let first = backend
            .open_or_touch(&tenant, "fp1", alert(&tenant, "a1", "fp1"))
            .await
            .unwrap();
        assert!(matches!(first, OpenOutcome::Opened(_)));

        let second = backend
            .open_or_touch(&tenant, "fp1", alert(&tenant, "a2", "fp1"))
            .await
            .unwrap();
        match second {
            OpenOutcome::Touched(existing) => assert_eq!(existing.alert_id.as_str(), "a1"),
            OpenOutcome::Opened(_) => panic!("must not open a second row for the same fingerprint"),
        }

        assert_eq!(backend.list_open(&tenant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn closing_frees_the_fingerprint_for_a_new_alert() {
        let backend = MemoryBackend::new();
        let tenant = TenantId::new("t1");

        backend
            .open_or_touch(&tenant, "fp1", alert(&tenant, "a1", "fp1"))
            .await
            .unwrap();
        backend.close(&tenant, &AlertId::new("a1"), Utc::now()).await.unwrap();

        let reopened = backend
            .open_or_touch(&tenant, "fp1", alert(&tenant, "a2", "fp1"))
            .await
            .unwrap();
        assert!(matches!(reopened, OpenOutcome::Opened(_)));
        assert_eq!(backend.list_open(&tenant).await.unwrap().len(), 1);
    }
}
