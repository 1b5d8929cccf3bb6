use serde::{Deserialize, Serialize};

use crate::ids::{AlertId, JobId, RouteId, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Pending,
    InFlight,
    Succeeded,
    Dead,
}

/// A unit of outbound delivery work, globally keyed by `job_id`.
///
/// Invariant: at most one worker holds the `PENDING → IN_FLIGHT` lease at a
/// time for a given `job_id` (spec.md §3, §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryJob {
    pub job_id: JobId,
    pub tenant_id: TenantId,
    pub alert_id: AlertId,
    pub route_id: RouteId,
    pub attempt: u32,
    pub next_attempt_at: chrono::DateTime<chrono::Utc>,
    pub state: JobState,
    pub last_error: Option<String>,
    pub payload: serde_json::Value,
    /// Lease holder identity + expiry, set on CAS into `IN_FLIGHT`.
    pub lease: Option<JobLease>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLease {
    pub worker_id: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl DeliveryJob {
    #[must_use]
    pub fn is_due(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.state == JobState::Pending && self.next_attempt_at <= now
    }
}

/// Compute the next retry delay: exponential backoff with jitter, capped.
///
/// `attempt` is the attempt number that just failed (1-indexed). Matches
/// spec.md §4.6: `base * 2^(attempt-1) + jitter`, capped at `max_backoff`.
#[must_use]
pub fn backoff_delay(
    attempt: u32,
    base: std::time::Duration,
    max: std::time::Duration,
    jitter: std::time::Duration,
) -> std::time::Duration {
    let exp = attempt.saturating_sub(1).min(32);
    let scaled = base.checked_mul(1u32.checked_shl(exp).unwrap_or(u32::MAX)).unwrap_or(max);
    (scaled + jitter).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn backoff_monotonic_without_jitter() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(300);
        let zero = Duration::ZERO;
        let d1 = backoff_delay(1, base, max, zero);
        let d2 = backoff_delay(2, base, max, zero);
        let d3 = backoff_delay(3, base, max, zero);
        assert!(d1 <= d2);
        assert!(d2 <= d3);
        assert_eq!(d1, Duration::from_secs(1));
        assert_eq!(d2, Duration::from_secs(2));
        assert_eq!(d3, Duration::from_secs(4));
    }

    #[test]
    fn backoff_caps_at_max() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(300);
        let delay = backoff_delay(20, base, max, Duration::ZERO);
        assert_eq!(delay, max);
    }
}
