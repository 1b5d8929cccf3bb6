use std::sync::atomic::{AtomicU64, Ordering};

use opspulse_core::QuarantineReason;

/// Point-in-time ingestion counters, exposed to the observability plane and
/// (for `rate_limited`) to customer-visible quota reporting (spec.md §9 open
/// question: decided to count, not silently drop).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub accepted: u64,
    pub malformed: u64,
    pub unregistered_device: u64,
    pub device_revoked: u64,
    pub site_mismatch: u64,
    pub invalid_token: u64,
    pub rate_limited: u64,
}

impl IngestStats {
    #[must_use]
    pub fn quarantined_total(&self) -> u64 {
        self.malformed
            + self.unregistered_device
            + self.device_revoked
            + self.site_mismatch
            + self.invalid_token
            + self.rate_limited
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    accepted: AtomicU64,
    malformed: AtomicU64,
    unregistered_device: AtomicU64,
    device_revoked: AtomicU64,
    site_mismatch: AtomicU64,
    invalid_token: AtomicU64,
    rate_limited: AtomicU64,
}

impl Counters {
    pub(crate) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_quarantine(&self, reason: QuarantineReason) {
        let counter = match reason {
            QuarantineReason::Malformed => &self.malformed,
            QuarantineReason::UnregisteredDevice => &self.unregistered_device,
            QuarantineReason::DeviceRevoked => &self.device_revoked,
            QuarantineReason::SiteMismatch => &self.site_mismatch,
            QuarantineReason::InvalidToken => &self.invalid_token,
            QuarantineReason::RateLimited => &self.rate_limited,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> IngestStats {
        IngestStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unregistered_device: self.unregistered_device.load(Ordering::Relaxed),
            device_revoked: self.device_revoked.load(Ordering::Relaxed),
            site_mismatch: self.site_mismatch.load(Ordering::Relaxed),
            invalid_token: self.invalid_token.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
        }
    }
}
