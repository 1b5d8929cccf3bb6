use async_trait::async_trait;
use opspulse_core::{DeviceId, DeviceRegistryEntry, DeviceStatus, SiteId, TenantId};
use opspulse_state::{DeviceRegistryStore, StateError};

use crate::pool::PostgresRepo;

fn status_str(status: DeviceStatus) -> &'static str {
    match status {
        DeviceStatus::Active => "ACTIVE",
        DeviceStatus::Revoked => "REVOKED",
    }
}

fn status_from_str(raw: &str) -> DeviceStatus {
    match raw {
        "REVOKED" => DeviceStatus::Revoked,
        _ => DeviceStatus::Active,
    }
}

#[async_trait]
impl DeviceRegistryStore for PostgresRepo {
    async fn get(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceRegistryEntry>, StateError> {
        let table = self.config.registry_table();
        let query = format!(
            "SELECT site_id, status, provision_token_hash, subscription_id
             FROM {table} WHERE tenant_id = $1 AND device_id = $2"
        );
        let row: Option<(String, String, String, Option<String>)> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .bind(device_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(row.map(|(site_id, status, hash, subscription_id)| DeviceRegistryEntry {
            tenant_id: tenant_id.clone(),
            device_id: device_id.clone(),
            site_id: SiteId::new(site_id),
            status: status_from_str(&status),
            provision_token_hash: hash,
            subscription_id,
        }))
    }

    async fn upsert(&self, entry: DeviceRegistryEntry) -> Result<(), StateError> {
        let table = self.config.registry_table();
        let query = format!(
            "INSERT INTO {table} (tenant_id, device_id, site_id, status, provision_token_hash, subscription_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (tenant_id, device_id) DO UPDATE SET
                site_id = EXCLUDED.site_id,
                status = EXCLUDED.status,
                provision_token_hash = EXCLUDED.provision_token_hash,
                subscription_id = EXCLUDED.subscription_id"
        );
        sqlx::query(&query)
            .bind(entry.tenant_id.as_str())
            .bind(entry.device_id.as_str())
            .bind(entry.site_id.as_str())
            .bind(status_str(entry.status))
            .bind(&entry.provision_token_hash)
            .bind(&entry.subscription_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn revoke(&self, tenant_id: &TenantId, device_id: &DeviceId) -> Result<(), StateError> {
        let table = self.config.registry_table();
        let query = format!("UPDATE {table} SET status = 'REVOKED' WHERE tenant_id = $1 AND device_id = $2");
        sqlx::query(&query)
            .bind(tenant_id.as_str())
            .bind(device_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn list_tenant(&self, tenant_id: &TenantId) -> Result<Vec<DeviceRegistryEntry>, StateError> {
        let table = self.config.registry_table();
        let query = format!(
            "SELECT device_id, site_id, status, provision_token_hash, subscription_id
             FROM {table} WHERE tenant_id = $1"
        );
        let rows: Vec<(String, String, String, String, Option<String>)> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(device_id, site_id, status, hash, subscription_id)| DeviceRegistryEntry {
                tenant_id: tenant_id.clone(),
                device_id: DeviceId::new(device_id),
                site_id: SiteId::new(site_id),
                status: status_from_str(&status),
                provision_token_hash: hash,
                subscription_id,
            })
            .collect())
    }
}
