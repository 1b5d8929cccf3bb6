use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{DeviceId, MetricValue, TenantId};

use crate::error::StateError;

/// Most recent value observed for a single `(device, metric)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestSample {
    pub device_id: DeviceId,
    pub value: MetricValue,
    pub observed_at: DateTime<Utc>,
}

/// A side index of "most recent sample per `(tenant, device, metric)`",
/// maintained by the ingestion workers alongside the line-protocol write to
/// the time-series store.
///
/// The time-series store itself (spec.md §4.2, §6) is a write-mostly,
/// line-protocol sink external to this pipeline; re-querying it for "latest
/// sample per metric" on every evaluator tick would mean round-tripping
/// through a store this pipeline doesn't control the query surface of. This
/// trait is the pragmatic in-pipeline answer: ingestion records the latest
/// value here in the same step it appends to the batch writer, and the
/// evaluator reads only from here. See `DESIGN.md` for the tradeoff.
#[async_trait]
pub trait LatestSampleStore: Send + Sync {
    async fn record(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
        metric_name: &str,
        value: MetricValue,
        observed_at: DateTime<Utc>,
    ) -> Result<(), StateError>;

    /// Latest sample for `metric_name` across every device in the tenant
    /// that has ever reported it.
    async fn latest_for_metric(
        &self,
        tenant_id: &TenantId,
        metric_name: &str,
    ) -> Result<Vec<LatestSample>, StateError>;
}
