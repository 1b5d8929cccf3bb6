use opspulse_core::DeliveryJob;

/// Substitutes `{tenant_id}`, `{alert_id}`, `{route_id}`, and `{job_id}`
/// placeholders in a route's topic template with the fields of the job
/// being delivered.
#[must_use]
pub fn render_topic(template: &str, job: &DeliveryJob) -> String {
    template
        .replace("{tenant_id}", job.tenant_id.as_str())
        .replace("{alert_id}", job.alert_id.as_str())
        .replace("{route_id}", job.route_id.as_str())
        .replace("{job_id}", job.job_id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opspulse_core::{AlertId, JobId, JobState, RouteId, TenantId};

    fn sample_job() -> DeliveryJob {
        DeliveryJob {
            tenant_id: TenantId::new("acme"),
            job_id: JobId::new("j1"),
            alert_id: AlertId::new("a1"),
            route_id: RouteId::new("r1"),
            attempt: 0,
            next_attempt_at: chrono::Utc::now(),
            state: JobState::Pending,
            last_error: None,
            payload: serde_json::json!({}),
            lease: None,
        }
    }

    #[test]
    fn substitutes_all_known_placeholders() {
        let rendered = render_topic("alerts/{tenant_id}/{alert_id}/{route_id}/{job_id}", &sample_job());
        assert_eq!(rendered, "alerts/acme/a1/r1/j1");
    }

    #[test]
    fn leaves_unknown_placeholders_untouched() {
        let rendered = render_topic("alerts/{tenant_id}/{unknown}", &sample_job());
        assert_eq!(rendered, "alerts/acme/{unknown}");
    }

    #[test]
    fn template_with_no_placeholders_is_unchanged() {
        assert_eq!(render_topic("static/topic", &sample_job()), "static/topic");
    }
}
