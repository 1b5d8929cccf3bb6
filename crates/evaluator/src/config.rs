use std::time::Duration;

/// Tuning for the evaluator tick loop (spec.md §4.4, §6 defaults).
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// How often liveness and rules are re-evaluated.
    pub tick_interval: Duration,
    /// `age < stale_after` keeps a device ONLINE.
    pub stale_after: Duration,
    /// `age >= offline_after` makes a device OFFLINE.
    pub offline_after: Duration,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
            stale_after: Duration::from_secs(60),
            offline_after: Duration::from_secs(300),
        }
    }
}
