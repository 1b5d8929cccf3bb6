use std::time::Duration;

/// Tuning knobs for [`crate::AuthCache`] (spec.md §4.1, §6).
#[derive(Debug, Clone)]
pub struct AuthCacheConfig {
    /// Entry freshness window. `AUTH_CACHE_TTL_SECONDS` in the environment.
    pub ttl: Duration,
    /// Ceiling before oldest-10% eviction kicks in. `AUTH_CACHE_MAX_SIZE`.
    pub max_size: usize,
}

impl Default for AuthCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_size: 10_000,
        }
    }
}
