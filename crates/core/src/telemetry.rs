use serde::{Deserialize, Serialize};

use crate::ids::{DeviceId, SiteId, TenantId};
use crate::metric::MetricValue;

/// A single ingested telemetry sample, pre-encode.
///
/// `ns_ts` is server-observed event time, not device-reported time — the
/// pipeline does not trust device clocks (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryPoint {
    pub tenant_id: TenantId,
    pub device_id: DeviceId,
    pub site_id: SiteId,
    pub seq: i64,
    pub fields: Vec<(String, MetricValue)>,
    pub ns_ts: i64,
}

/// Why an inbound message was rejected. Append-only, never influences
/// `DeviceState` (spec.md §3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuarantineReason {
    UnregisteredDevice,
    InvalidToken,
    RateLimited,
    SiteMismatch,
    DeviceRevoked,
    Malformed,
}

/// A rejected message, retained for diagnostics and policy-driven retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantineEvent {
    pub tenant_id: TenantId,
    pub device_id: Option<DeviceId>,
    pub reason: QuarantineReason,
    /// Bounded snippet of the raw payload; never the full message.
    pub payload_snippet: String,
    pub observed_at: chrono::DateTime<chrono::Utc>,
}

const PAYLOAD_SNIPPET_MAX: usize = 512;

impl QuarantineEvent {
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        device_id: Option<DeviceId>,
        reason: QuarantineReason,
        raw_payload: &str,
        observed_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        let snippet: String = raw_payload.chars().take(PAYLOAD_SNIPPET_MAX).collect();
        Self {
            tenant_id,
            device_id,
            reason,
            payload_snippet: snippet,
            observed_at,
        }
    }
}

/// Liveness state derived from `last_seen_at` (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Liveness {
    Online,
    Stale,
    Offline,
}

/// Current device liveness, keyed by `(tenant_id, device_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceState {
    pub tenant_id: TenantId,
    pub device_id: DeviceId,
    pub last_seen_at: chrono::DateTime<chrono::Utc>,
    pub liveness: Liveness,
    pub last_known_site_id: SiteId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_bounded() {
        let raw = "x".repeat(10_000);
        let ev = QuarantineEvent::new(
            TenantId::new("t1"),
            None,
            QuarantineReason::Malformed,
            &raw,
            chrono::Utc::now(),
        );
        assert_eq!(ev.payload_snippet.len(), PAYLOAD_SNIPPET_MAX);
    }
}
