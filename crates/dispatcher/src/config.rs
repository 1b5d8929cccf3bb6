use std::time::Duration;

/// Tuning for the dispatcher tick loop (spec.md §4.5, §6 defaults).
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// How often open alerts are re-scanned for matching routes.
    pub tick_interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
        }
    }
}
