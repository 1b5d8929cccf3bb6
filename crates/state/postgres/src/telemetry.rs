use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{DeviceId, MetricValue, TenantId};
use opspulse_state::{LatestSample, LatestSampleStore, StateError};

use crate::pool::PostgresRepo;

#[async_trait]
impl LatestSampleStore for PostgresRepo {
    async fn record(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
        metric_name: &str,
        value: MetricValue,
        observed_at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        let table = self.config.latest_samples_table();
        let value = serde_json::to_string(&value).map_err(|e| StateError::Serialization(e.to_string()))?;
        let query = format!(
            "INSERT INTO {table} (tenant_id, device_id, metric_name, value, observed_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (tenant_id, device_id, metric_name) DO UPDATE SET
                value = EXCLUDED.value, observed_at = EXCLUDED.observed_at
             WHERE {table}.observed_at <= EXCLUDED.observed_at"
        );
        sqlx::query(&query)
            .bind(tenant_id.as_str())
            .bind(device_id.as_str())
            .bind(metric_name)
            .bind(&value)
            .bind(observed_at)
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn latest_for_metric(
        &self,
        tenant_id: &TenantId,
        metric_name: &str,
    ) -> Result<Vec<LatestSample>, StateError> {
        let table = self.config.latest_samples_table();
        let query = format!(
            "SELECT device_id, value, observed_at FROM {table}
             WHERE tenant_id = $1 AND metric_name = $2"
        );
        let rows: Vec<(String, String, DateTime<Utc>)> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .bind(metric_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        rows.into_iter()
            .map(|(device_id, value, observed_at)| {
                let value: MetricValue =
                    serde_json::from_str(&value).map_err(|e| StateError::Serialization(e.to_string()))?;
                Ok(LatestSample {
                    device_id: DeviceId::new(device_id),
                    value,
                    observed_at,
                })
            })
            .collect()
    }
}
