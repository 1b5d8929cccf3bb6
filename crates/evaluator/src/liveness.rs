use chrono::{DateTime, Utc};
use opspulse_core::{no_heartbeat_fingerprint, Alert, AlertId, AlertStatus, AlertType, DeviceId, DeviceState, Liveness, Severity, TenantId};
use opspulse_state::{AlertStore, DeviceStateStore, OpenOutcome};
use tracing::info;

use crate::config::EvaluatorConfig;
use crate::error::EvaluatorError;

/// Classify `age` into a liveness state (spec.md §4.4).
#[must_use]
pub fn classify(age: chrono::Duration, config: &EvaluatorConfig) -> Liveness {
    let stale_after = chrono::Duration::from_std(config.stale_after).unwrap_or(chrono::Duration::zero());
    let offline_after = chrono::Duration::from_std(config.offline_after).unwrap_or(chrono::Duration::zero());
    if age >= offline_after {
        Liveness::Offline
    } else if age >= stale_after {
        Liveness::Stale
    } else {
        Liveness::Online
    }
}

/// Re-derive liveness for every device in a tenant and react to edges into
/// or out of `OFFLINE` (spec.md §4.4 "On transition into OFFLINE..."). The
/// evaluator is restartable: each tick recomputes liveness from
/// `last_seen_at` rather than trusting the previously stored value, so a
/// missed tick or restart cannot desync the stored state from reality.
pub async fn tick_liveness(
    tenant_id: &TenantId,
    now: DateTime<Utc>,
    config: &EvaluatorConfig,
    device_state: &dyn DeviceStateStore,
    alerts: &dyn AlertStore,
) -> Result<(), EvaluatorError> {
    let states = device_state.list_tenant(tenant_id).await?;
    for state in states {
        let age = now.signed_duration_since(state.last_seen_at);
        let next = classify(age, config);
        if next == state.liveness {
            continue;
        }
        device_state.set_liveness(tenant_id, &state.device_id, next).await?;

        if next == Liveness::Offline {
            open_no_heartbeat(tenant_id, &state.device_id, now, alerts).await?;
        } else if state.liveness == Liveness::Offline && next == Liveness::Online {
            close_no_heartbeat(tenant_id, &state, now, alerts).await?;
        }
    }
    Ok(())
}

async fn open_no_heartbeat(
    tenant_id: &TenantId,
    device_id: &DeviceId,
    now: DateTime<Utc>,
    alerts: &dyn AlertStore,
) -> Result<(), EvaluatorError> {
    let fingerprint = no_heartbeat_fingerprint(tenant_id, device_id);
    let candidate = Alert {
        tenant_id: tenant_id.clone(),
        alert_id: AlertId::new(uuid::Uuid::now_v7().to_string()),
        device_id: device_id.clone(),
        alert_type: AlertType::NoHeartbeat,
        rule_id: None,
        severity: Severity::Critical,
        status: AlertStatus::Open,
        fingerprint: fingerprint.clone(),
        opened_at: now,
        last_seen_at: now,
        closed_at: None,
        details: serde_json::json!({}),
    };
    let outcome = alerts.open_or_touch(tenant_id, &fingerprint, candidate).await?;
    if matches!(outcome, OpenOutcome::Opened(_)) {
        info!(tenant = tenant_id.as_str(), device = device_id.as_str(), "device offline, alert opened");
    }
    Ok(())
}

async fn close_no_heartbeat(
    tenant_id: &TenantId,
    state: &DeviceState,
    now: DateTime<Utc>,
    alerts: &dyn AlertStore,
) -> Result<(), EvaluatorError> {
    let fingerprint = no_heartbeat_fingerprint(tenant_id, &state.device_id);
    if let Some(alert) = alerts.find_open_by_fingerprint(tenant_id, &fingerprint).await? {
        alerts.close(tenant_id, &alert.alert_id, now).await?;
        info!(tenant = tenant_id.as_str(), device = state.device_id.as_str(), "device back online, alert closed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_boundaries() {
        let config = EvaluatorConfig::default();
        assert_eq!(classify(chrono::Duration::seconds(0), &config), Liveness::Online);
        assert_eq!(classify(chrono::Duration::seconds(59), &config), Liveness::Online);
        assert_eq!(classify(chrono::Duration::seconds(60), &config), Liveness::Stale);
        assert_eq!(classify(chrono::Duration::seconds(299), &config), Liveness::Stale);
        assert_eq!(classify(chrono::Duration::seconds(300), &config), Liveness::Offline);
        assert_eq!(classify(chrono::Duration::seconds(400), &config), Liveness::Offline);
    }
}
