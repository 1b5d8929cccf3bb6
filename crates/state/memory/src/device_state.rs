use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{DeviceId, DeviceKey, DeviceState, Liveness, SiteId, TenantId};
use opspulse_state::{DeviceStateStore, StateError};

use crate::backend::MemoryBackend;

#[async_trait]
impl DeviceStateStore for MemoryBackend {
    async fn get(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceState>, StateError> {
        let key = DeviceKey::new(tenant_id.clone(), device_id.clone());
        Ok(self.device_state.get(&key).map(|r| r.value().clone()))
    }

    async fn touch(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
        site_id: &SiteId,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        let key = DeviceKey::new(tenant_id.clone(), device_id.clone());
        self.device_state
            .entry(key)
            .and_modify(|state| {
                state.last_seen_at = seen_at;
                state.last_known_site_id = site_id.clone();
            })
            .or_insert_with(|| DeviceState {
                tenant_id: tenant_id.clone(),
                device_id: device_id.clone(),
                last_seen_at: seen_at,
                liveness: Liveness::Online,
                last_known_site_id: site_id.clone(),
            });
        Ok(())
    }

    async fn set_liveness(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
        liveness: Liveness,
    ) -> Result<(), StateError> {
        let key = DeviceKey::new(tenant_id.clone(), device_id.clone());
        if let Some(mut state) = self.device_state.get_mut(&key) {
            state.liveness = liveness;
        }
        Ok(())
    }

    async fn list_tenant(&self, tenant_id: &TenantId) -> Result<Vec<DeviceState>, StateError> {
        Ok(self
            .device_state
            .iter()
            .filter(|r| &r.key().tenant_id == tenant_id)
            .map(|r| r.value().clone())
            .collect())
    }
}
