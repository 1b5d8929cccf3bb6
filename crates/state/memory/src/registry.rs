use async_trait::async_trait;
use opspulse_core::{DeviceId, DeviceKey, DeviceRegistryEntry, DeviceStatus, TenantId};
use opspulse_state::{DeviceRegistryStore, StateError};

use crate::backend::MemoryBackend;

#[async_trait]
impl DeviceRegistryStore for MemoryBackend {
    async fn get(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceRegistryEntry>, StateError> {
        let key = DeviceKey::new(tenant_id.clone(), device_id.clone());
        Ok(self.registry.get(&key).map(|r| r.value().clone()))
    }

    async fn upsert(&self, entry: DeviceRegistryEntry) -> Result<(), StateError> {
        let key = DeviceKey::new(entry.tenant_id.clone(), entry.device_id.clone());
        self.registry.insert(key, entry);
        Ok(())
    }

    async fn revoke(&self, tenant_id: &TenantId, device_id: &DeviceId) -> Result<(), StateError> {
        let key = DeviceKey::new(tenant_id.clone(), device_id.clone());
        if let Some(mut entry) = self.registry.get_mut(&key) {
            entry.status = DeviceStatus::Revoked;
        }
        Ok(())
    }

    async fn list_tenant(&self, tenant_id: &TenantId) -> Result<Vec<DeviceRegistryEntry>, StateError> {
        Ok(self
            .registry
            .iter()
            .filter(|r| &r.key().tenant_id == tenant_id)
            .map(|r| r.value().clone())
            .collect())
    }
}
