/// Tuning for the ingestion worker pool (spec.md §4.3).
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Number of cooperative workers sharing the queue.
    pub worker_count: usize,
    /// Bounded queue capacity; a full queue applies backpressure.
    pub queue_capacity: usize,
    /// Token bucket steady-state rate, tokens/sec, per `(tenant, device)`.
    pub rate_limit_per_sec: f64,
    /// Token bucket burst capacity, per `(tenant, device)`.
    pub rate_limit_burst: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            queue_capacity: 50_000,
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
        }
    }
}
