use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{DeviceId, DeviceState, Liveness, SiteId, TenantId};

use crate::error::StateError;

/// Persistence for liveness state (spec.md §3 "Device State", §4.4).
///
/// The evaluator is restartable with no in-memory state (spec.md §4.4): it
/// reconstructs liveness purely from `last_seen_at` read through this trait.
#[async_trait]
pub trait DeviceStateStore: Send + Sync {
    async fn get(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceState>, StateError>;

    /// Record a heartbeat/telemetry arrival. Does not itself decide
    /// liveness — that's the evaluator's job on its next tick.
    async fn touch(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
        site_id: &SiteId,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StateError>;

    async fn set_liveness(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
        liveness: Liveness,
    ) -> Result<(), StateError>;

    /// All device states in a tenant, for the evaluator's liveness sweep.
    async fn list_tenant(&self, tenant_id: &TenantId) -> Result<Vec<DeviceState>, StateError>;
}
