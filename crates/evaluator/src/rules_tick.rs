use chrono::{DateTime, Utc};
use opspulse_core::{threshold_fingerprint, Alert, AlertId, AlertStatus, AlertType, TenantId};
use opspulse_core::DeviceSelector;
use opspulse_rules::{evaluate_rule, order_evaluations};
use opspulse_state::{AlertRuleStore, AlertStore, DeviceRegistryStore, LatestSampleStore, OpenOutcome};
use tracing::{info, warn};

use crate::error::EvaluatorError;

/// Re-evaluate every enabled rule for a tenant: open/close `THRESHOLD`
/// alerts per `(device, rule)` fingerprint (spec.md §4.4).
///
/// Rules are re-read every tick; a rule toggled `enabled = false` between
/// ticks stops being evaluated (and its open alerts are left as-is — only
/// an edge, not disablement, closes an alert; spec.md §4.4 dedup contract
/// is silent on disablement, so existing alerts persist until resolved by
/// a later matching/non-matching edge).
pub async fn tick_rules(
    tenant_id: &TenantId,
    now: DateTime<Utc>,
    rules: &dyn AlertRuleStore,
    registry: &dyn DeviceRegistryStore,
    samples: &dyn LatestSampleStore,
    alerts: &dyn AlertStore,
) -> Result<(), EvaluatorError> {
    let enabled_rules = rules.list_enabled(tenant_id).await?;
    let devices = registry.list_tenant(tenant_id).await?;

    let mut evaluations = Vec::new();
    for rule in &enabled_rules {
        let selector = match DeviceSelector::parse(&rule.device_selector) {
            Ok(selector) => selector,
            Err(source) => {
                warn!(rule_id = rule.rule_id.as_str(), error = %source, "skipping rule with invalid selector");
                continue;
            }
        };
        let rule_samples = samples.latest_for_metric(tenant_id, &rule.metric_name).await?;
        evaluations.extend(evaluate_rule(rule, &selector, &devices, &rule_samples));
    }

    for evaluation in order_evaluations(evaluations) {
        let fingerprint = threshold_fingerprint(tenant_id, &evaluation.device_id, &evaluation.rule.rule_id);
        if evaluation.matched {
            let candidate = Alert {
                tenant_id: tenant_id.clone(),
                alert_id: AlertId::new(uuid::Uuid::now_v7().to_string()),
                device_id: evaluation.device_id.clone(),
                alert_type: AlertType::Threshold,
                rule_id: Some(evaluation.rule.rule_id.clone()),
                severity: evaluation.rule.severity,
                status: AlertStatus::Open,
                fingerprint: fingerprint.clone(),
                opened_at: now,
                last_seen_at: now,
                closed_at: None,
                details: serde_json::json!({
                    "metric": evaluation.rule.metric_name,
                    "threshold": evaluation.rule.threshold,
                    "sample": evaluation.sample_value.map(opspulse_core::MetricValue::as_f64),
                }),
            };
            let outcome = alerts.open_or_touch(tenant_id, &fingerprint, candidate).await?;
            if matches!(outcome, OpenOutcome::Opened(_)) {
                info!(
                    tenant = tenant_id.as_str(),
                    device = evaluation.device_id.as_str(),
                    rule = evaluation.rule.rule_id.as_str(),
                    "threshold breached, alert opened"
                );
            }
        } else if let Some(alert) = alerts.find_open_by_fingerprint(tenant_id, &fingerprint).await? {
            alerts.close(tenant_id, &alert.alert_id, now).await?;
            info!(
                tenant = tenant_id.as_str(),
                device = evaluation.device_id.as_str(),
                rule = evaluation.rule.rule_id.as_str(),
                "threshold cleared, alert closed"
            );
        }
    }

    Ok(())
}
