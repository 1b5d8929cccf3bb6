use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{DeviceId, MetricValue, TenantId};
use opspulse_state::{LatestSample, LatestSampleStore, StateError};

use crate::backend::MemoryBackend;

#[async_trait]
impl LatestSampleStore for MemoryBackend {
    async fn record(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
        metric_name: &str,
        value: MetricValue,
        observed_at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        let key = (tenant_id.clone(), device_id.clone(), metric_name.to_owned());
        self.latest_samples
            .entry(key)
            .and_modify(|sample| {
                if observed_at >= sample.observed_at {
                    sample.value = value;
                    sample.observed_at = observed_at;
                }
            })
            .or_insert(LatestSample {
                device_id: device_id.clone(),
                value,
                observed_at,
            });
        Ok(())
    }

    async fn latest_for_metric(
        &self,
        tenant_id: &TenantId,
        metric_name: &str,
    ) -> Result<Vec<LatestSample>, StateError> {
        Ok(self
            .latest_samples
            .iter()
            .filter(|r| &r.key().0 == tenant_id && r.key().2 == metric_name)
            .map(|r| r.value().clone())
            .collect())
    }
}
