use async_trait::async_trait;
use opspulse_core::{DeviceId, DeviceRegistryEntry, TenantId};

use crate::error::StateError;

/// Persistence for the device registry (spec.md §3 "Device Registry").
#[async_trait]
pub trait DeviceRegistryStore: Send + Sync {
    async fn get(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceRegistryEntry>, StateError>;

    async fn upsert(&self, entry: DeviceRegistryEntry) -> Result<(), StateError>;

    async fn revoke(&self, tenant_id: &TenantId, device_id: &DeviceId) -> Result<(), StateError>;

    /// All devices in a tenant, for evaluator device-selector matching.
    async fn list_tenant(&self, tenant_id: &TenantId) -> Result<Vec<DeviceRegistryEntry>, StateError>;
}
