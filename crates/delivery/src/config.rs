use std::time::Duration;

/// Tuning for the delivery worker (spec.md §4.6, §6 defaults).
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// How often the worker polls for due jobs.
    pub tick_interval: Duration,
    /// Max jobs dispatched concurrently per tick.
    pub delivery_concurrency: usize,
    /// Attempts (1-indexed) after which a job moves to `DEAD` instead of
    /// retrying.
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    /// How long a claimed job's lease is held before it's eligible for
    /// `reap_expired_leases` recovery.
    pub lease_duration: Duration,
    /// Identity recorded on the lease; distinguishes workers in logs and
    /// lets a crashed worker's leases be told apart from a live one's.
    pub worker_id: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(2),
            delivery_concurrency: 8,
            max_attempts: 5,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(300),
            lease_duration: Duration::from_secs(30),
            worker_id: format!("delivery-{}", uuid_like_suffix()),
        }
    }
}

/// A short, dependency-free worker suffix — avoids pulling in `uuid` just
/// to label log lines with a probably-unique string.
fn uuid_like_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    format!("{:x}", nanos & 0xffff_ffff)
}
