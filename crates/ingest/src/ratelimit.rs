use std::sync::Mutex;
use std::time::Instant;

use dashmap::DashMap;
use opspulse_core::{DeviceId, TenantId};

struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Per-`(tenant, device)` token bucket rate limiter, shared across every
/// ingestion worker (spec.md §4.3 step 6).
///
/// A shared bucket (rather than one per worker) is required: a device can be
/// served by any worker on any message, and a per-worker bucket would let it
/// exceed the documented burst simply by having its messages land on
/// different workers.
pub struct RateLimiter {
    buckets: DashMap<(TenantId, DeviceId), Mutex<TokenBucket>>,
    rate_per_sec: f64,
    burst: f64,
}

impl RateLimiter {
    #[must_use]
    pub fn new(rate_per_sec: f64, burst: f64) -> Self {
        Self {
            buckets: DashMap::new(),
            rate_per_sec,
            burst,
        }
    }

    /// Consume one token for `(tenant_id, device_id)`. Returns `false` if the
    /// bucket is empty (the message must be quarantined `RATE_LIMITED`).
    #[must_use]
    pub fn try_acquire(&self, tenant_id: &TenantId, device_id: &DeviceId) -> bool {
        let key = (tenant_id.clone(), device_id.clone());
        let slot = self
            .buckets
            .entry(key)
            .or_insert_with(|| Mutex::new(TokenBucket { tokens: self.burst, last_refill: Instant::now() }));
        let mut bucket = slot.lock().expect("rate limiter bucket mutex poisoned");

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate_per_sec).min(self.burst);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn burst_is_consumed_then_refused() {
        let limiter = RateLimiter::new(1.0, 3.0);
        let t = TenantId::new("t1");
        let d = DeviceId::new("d1");
        assert!(limiter.try_acquire(&t, &d));
        assert!(limiter.try_acquire(&t, &d));
        assert!(limiter.try_acquire(&t, &d));
        assert!(!limiter.try_acquire(&t, &d));
    }

    #[test]
    fn refills_over_time() {
        let limiter = RateLimiter::new(100.0, 1.0);
        let t = TenantId::new("t1");
        let d = DeviceId::new("d1");
        assert!(limiter.try_acquire(&t, &d));
        assert!(!limiter.try_acquire(&t, &d));
        sleep(Duration::from_millis(50));
        assert!(limiter.try_acquire(&t, &d));
    }

    #[test]
    fn devices_are_independent() {
        let limiter = RateLimiter::new(1.0, 1.0);
        let t = TenantId::new("t1");
        let d1 = DeviceId::new("d1");
        let d2 = DeviceId::new("d2");
        assert!(limiter.try_acquire(&t, &d1));
        assert!(!limiter.try_acquire(&t, &d1));
        assert!(limiter.try_acquire(&t, &d2));
    }
}
