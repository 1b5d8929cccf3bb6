use opspulse_core::{Alert, DeviceRegistryEntry, DeviceSelector, DeviceStatus, Route};
use opspulse_state::DeviceRegistryStore;

use crate::error::DispatcherError;

/// Whether `route` should fire for `alert`, per spec.md §4.5: severity
/// threshold, `alert_type` set membership, then device selector.
///
/// Evaluation order matters only for cost: selector matching requires a
/// registry lookup, so the cheap in-memory checks run first.
pub async fn route_matches(
    route: &Route,
    alert: &Alert,
    registry: &dyn DeviceRegistryStore,
) -> Result<bool, DispatcherError> {
    if alert.severity < route.min_severity {
        return Ok(false);
    }
    if !route.alert_types.is_empty() && !route.alert_types.contains(&alert.alert_type) {
        return Ok(false);
    }

    let selector = DeviceSelector::parse(&route.device_selector_raw).map_err(|source| DispatcherError::BadSelector {
        route_id: route.route_id.to_string(),
        selector: route.device_selector_raw.clone(),
        source,
    })?;

    let entry = registry
        .get(&alert.tenant_id, &alert.device_id)
        .await?
        .unwrap_or_else(|| unknown_device(alert));

    Ok(selector.matches(&entry))
}

/// A device can raise an alert and then be revoked or deleted from the
/// registry before the dispatcher ticks. Treat it as a siteless device so
/// `DeviceSelector::All`/`Pattern` selectors (which don't need site
/// metadata) still see it, while `Site` selectors correctly never match.
fn unknown_device(alert: &Alert) -> DeviceRegistryEntry {
    DeviceRegistryEntry {
        tenant_id: alert.tenant_id.clone(),
        device_id: alert.device_id.clone(),
        site_id: String::new().into(),
        status: DeviceStatus::Revoked,
        provision_token_hash: String::new(),
        subscription_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opspulse_core::{AlertId, AlertStatus, AlertType, DeviceId, IntegrationId, RouteId, Severity, SiteId, TenantId};
    use opspulse_state_memory::MemoryBackend;

    fn alert(device_id: &str, alert_type: AlertType, severity: Severity) -> Alert {
        Alert {
            tenant_id: TenantId::new("t1"),
            alert_id: AlertId::new("a1"),
            device_id: DeviceId::new(device_id),
            alert_type,
            rule_id: None,
            severity,
            status: AlertStatus::Open,
            fingerprint: "fp1".into(),
            opened_at: chrono::Utc::now(),
            last_seen_at: chrono::Utc::now(),
            closed_at: None,
            details: serde_json::json!({}),
        }
    }

    fn route(min_severity: Severity, alert_types: Vec<AlertType>, selector_raw: &str) -> Route {
        Route {
            tenant_id: TenantId::new("t1"),
            route_id: RouteId::new("r1"),
            integration_id: IntegrationId::new("i1"),
            min_severity,
            alert_types,
            device_selector: None,
            device_selector_raw: selector_raw.into(),
            throttle_seconds: None,
            payload_template: None,
        }
    }

    #[tokio::test]
    async fn severity_below_threshold_does_not_match() {
        let registry = MemoryBackend::new();
        let r = route(Severity::Critical, vec![], "*");
        let a = alert("d1", AlertType::Threshold, Severity::Warning);
        assert!(!route_matches(&r, &a, &registry).await.unwrap());
    }

    #[tokio::test]
    async fn alert_type_not_in_set_does_not_match() {
        let registry = MemoryBackend::new();
        let r = route(Severity::Info, vec![AlertType::NoHeartbeat], "*");
        let a = alert("d1", AlertType::Threshold, Severity::Critical);
        assert!(!route_matches(&r, &a, &registry).await.unwrap());
    }

    #[tokio::test]
    async fn empty_alert_type_set_matches_any_type() {
        let registry = MemoryBackend::new();
        let r = route(Severity::Info, vec![], "*");
        let a = alert("d1", AlertType::NoHeartbeat, Severity::Info);
        assert!(route_matches(&r, &a, &registry).await.unwrap());
    }

    #[tokio::test]
    async fn site_selector_requires_registry_lookup() {
        use opspulse_state::DeviceRegistryStore as _;
        let registry = MemoryBackend::new();
        registry
            .upsert(DeviceRegistryEntry {
                tenant_id: TenantId::new("t1"),
                device_id: DeviceId::new("d1"),
                site_id: SiteId::new("site-a"),
                status: DeviceStatus::Active,
                provision_token_hash: String::new(),
                subscription_id: None,
            })
            .await
            .unwrap();
        let r = route(Severity::Info, vec![], "site:site-a");
        let a = alert("d1", AlertType::Threshold, Severity::Info);
        assert!(route_matches(&r, &a, &registry).await.unwrap());

        let r2 = route(Severity::Info, vec![], "site:site-b");
        assert!(!route_matches(&r2, &a, &registry).await.unwrap());
    }

    #[tokio::test]
    async fn unregistered_device_does_not_match_site_selector() {
        let registry = MemoryBackend::new();
        let r = route(Severity::Info, vec![], "site:site-a");
        let a = alert("ghost", AlertType::Threshold, Severity::Info);
        assert!(!route_matches(&r, &a, &registry).await.unwrap());
    }

    #[tokio::test]
    async fn unregistered_device_matches_wildcard_selector() {
        let registry = MemoryBackend::new();
        let r = route(Severity::Info, vec![], "*");
        let a = alert("ghost", AlertType::Threshold, Severity::Info);
        assert!(route_matches(&r, &a, &registry).await.unwrap());
    }
}
