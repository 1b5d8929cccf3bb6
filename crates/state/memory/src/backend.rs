use dashmap::DashMap;
use opspulse_core::{
    Alert, AlertId, AlertRule, DeliveryJob, DeviceId, DeviceKey, DeviceRegistryEntry, DeviceState,
    Integration, IntegrationId, JobId, MetricValue, Route, RouteId, RuleId, TenantId,
};

use opspulse_state::LatestSample;

/// In-memory backing store shared by every repository trait impl in this
/// crate: one `DashMap` per domain entity, instead of one opaque key/value
/// map shared across every entity kind.
#[derive(Default)]
pub struct MemoryBackend {
    pub(crate) registry: DashMap<DeviceKey, DeviceRegistryEntry>,
    pub(crate) device_state: DashMap<DeviceKey, DeviceState>,
    pub(crate) rules: DashMap<(TenantId, RuleId), AlertRule>,
    pub(crate) alerts: DashMap<(TenantId, AlertId), Alert>,
    /// Index from `(tenant, fingerprint)` to the currently-OPEN alert id.
    /// Absence means no OPEN alert exists for that fingerprint.
    pub(crate) open_by_fingerprint: DashMap<(TenantId, String), AlertId>,
    pub(crate) routes: DashMap<(TenantId, RouteId), Route>,
    pub(crate) integrations: DashMap<(TenantId, IntegrationId), Integration>,
    pub(crate) dispatch_log: DashMap<(TenantId, RouteId, String), chrono::DateTime<chrono::Utc>>,
    pub(crate) jobs: DashMap<JobId, DeliveryJob>,
    pub(crate) latest_samples: DashMap<(TenantId, DeviceId, String), LatestSample>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("registry_size", &self.registry.len())
            .field("device_state_size", &self.device_state.len())
            .field("alerts_size", &self.alerts.len())
            .field("jobs_size", &self.jobs.len())
            .finish_non_exhaustive()
    }
}
