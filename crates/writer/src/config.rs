use std::time::Duration;

/// Tuning for the per-tenant batch writer (spec.md §4.2).
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Flush a tenant's buffer once it holds this many lines.
    pub batch_size: usize,
    /// Flush every tenant's buffer at least this often, even if under `batch_size`.
    pub flush_interval: Duration,
    /// Total attempts per batch write before it is counted as `writes_err` and discarded.
    pub max_tries: u32,
    /// Delay between retry attempts.
    pub retry_delay: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            flush_interval: Duration::from_secs(1),
            max_tries: 2,
            retry_delay: Duration::from_millis(200),
        }
    }
}
