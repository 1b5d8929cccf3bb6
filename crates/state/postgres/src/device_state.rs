use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{DeviceId, DeviceState, Liveness, SiteId, TenantId};
use opspulse_state::{DeviceStateStore, StateError};

use crate::pool::PostgresRepo;

fn liveness_str(liveness: Liveness) -> &'static str {
    match liveness {
        Liveness::Online => "ONLINE",
        Liveness::Stale => "STALE",
        Liveness::Offline => "OFFLINE",
    }
}

fn liveness_from_str(raw: &str) -> Liveness {
    match raw {
        "STALE" => Liveness::Stale,
        "OFFLINE" => Liveness::Offline,
        _ => Liveness::Online,
    }
}

fn row_to_state(
    tenant_id: &TenantId,
    device_id: DeviceId,
    last_seen_at: DateTime<Utc>,
    liveness: String,
    last_known_site_id: String,
) -> DeviceState {
    DeviceState {
        tenant_id: tenant_id.clone(),
        device_id,
        last_seen_at,
        liveness: liveness_from_str(&liveness),
        last_known_site_id: SiteId::new(last_known_site_id),
    }
}

#[async_trait]
impl DeviceStateStore for PostgresRepo {
    async fn get(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceState>, StateError> {
        let table = self.config.device_state_table();
        let query = format!(
            "SELECT last_seen_at, liveness, last_known_site_id
             FROM {table} WHERE tenant_id = $1 AND device_id = $2"
        );
        let row: Option<(DateTime<Utc>, String, String)> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .bind(device_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(row.map(|(last_seen_at, liveness, site)| {
            row_to_state(tenant_id, device_id.clone(), last_seen_at, liveness, site)
        }))
    }

    async fn touch(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
        site_id: &SiteId,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        let table = self.config.device_state_table();
        let query = format!(
            "INSERT INTO {table} (tenant_id, device_id, last_seen_at, liveness, last_known_site_id)
             VALUES ($1, $2, $3, 'ONLINE', $4)
             ON CONFLICT (tenant_id, device_id) DO UPDATE SET
                last_seen_at = EXCLUDED.last_seen_at,
                last_known_site_id = EXCLUDED.last_known_site_id"
        );
        sqlx::query(&query)
            .bind(tenant_id.as_str())
            .bind(device_id.as_str())
            .bind(seen_at)
            .bind(site_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn set_liveness(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
        liveness: Liveness,
    ) -> Result<(), StateError> {
        let table = self.config.device_state_table();
        let query = format!("UPDATE {table} SET liveness = $1 WHERE tenant_id = $2 AND device_id = $3");
        sqlx::query(&query)
            .bind(liveness_str(liveness))
            .bind(tenant_id.as_str())
            .bind(device_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn list_tenant(&self, tenant_id: &TenantId) -> Result<Vec<DeviceState>, StateError> {
        let table = self.config.device_state_table();
        let query = format!(
            "SELECT device_id, last_seen_at, liveness, last_known_site_id
             FROM {table} WHERE tenant_id = $1"
        );
        let rows: Vec<(String, DateTime<Utc>, String, String)> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(device_id, last_seen_at, liveness, site)| {
                row_to_state(tenant_id, DeviceId::new(device_id), last_seen_at, liveness, site)
            })
            .collect())
    }
}
