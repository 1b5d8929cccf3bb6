use opspulse_core::{Alert, Route};

use crate::error::DispatcherError;

/// Used when a route has no `payload_template` of its own (spec.md §4.5
/// names the payload's variables but leaves per-destination formatting up
/// to the implementation).
const DEFAULT_TEMPLATE: &str = r#"{
  "severity": "{{ severity }}",
  "alert_type": "{{ alert_type }}",
  "device_id": "{{ device_id }}",
  "tenant_id": "{{ tenant_id }}",
  "message": "{{ message }}",
  "timestamp": "{{ timestamp }}"
}"#;

/// Render a route's delivery payload for `alert`, per spec.md §4.5's
/// variable set: `severity, alert_type, device_id, tenant_id, message,
/// timestamp`. `message` is a human-readable summary synthesized from the
/// alert's `details`, since [`Alert`] carries structured details rather
/// than a freeform message field.
pub fn render_payload(route: &Route, alert: &Alert) -> Result<serde_json::Value, DispatcherError> {
    let template_src = route.payload_template.as_deref().unwrap_or(DEFAULT_TEMPLATE);

    let mut env = minijinja::Environment::new();
    env.add_template("payload", template_src)
        .map_err(|source| DispatcherError::BadTemplate { route_id: route.route_id.to_string(), source })?;
    let tmpl = env
        .get_template("payload")
        .map_err(|source| DispatcherError::BadTemplate { route_id: route.route_id.to_string(), source })?;

    let rendered = tmpl
        .render(minijinja::context! {
            severity => severity_str(alert.severity),
            alert_type => alert_type_str(alert.alert_type),
            device_id => alert.device_id.as_str(),
            tenant_id => alert.tenant_id.as_str(),
            message => summarize(alert),
            timestamp => alert.last_seen_at.to_rfc3339(),
        })
        .map_err(|source| DispatcherError::BadTemplate { route_id: route.route_id.to_string(), source })?;

    match serde_json::from_str(&rendered) {
        Ok(value) => Ok(value),
        Err(_) => Ok(serde_json::Value::String(rendered)),
    }
}

fn severity_str(severity: opspulse_core::Severity) -> &'static str {
    match severity {
        opspulse_core::Severity::Info => "info",
        opspulse_core::Severity::Warning => "warning",
        opspulse_core::Severity::Critical => "critical",
    }
}

fn alert_type_str(alert_type: opspulse_core::AlertType) -> &'static str {
    match alert_type {
        opspulse_core::AlertType::NoHeartbeat => "NO_HEARTBEAT",
        opspulse_core::AlertType::Threshold => "THRESHOLD",
    }
}

fn summarize(alert: &Alert) -> String {
    match alert.alert_type {
        opspulse_core::AlertType::NoHeartbeat => {
            format!("device {} has stopped reporting heartbeats", alert.device_id.as_str())
        }
        opspulse_core::AlertType::Threshold => {
            let metric = alert.details.get("metric").and_then(|v| v.as_str()).unwrap_or("metric");
            format!("device {} breached threshold on {metric}", alert.device_id.as_str())
        }
    }
}
