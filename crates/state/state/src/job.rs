use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{DeliveryJob, JobId, TenantId};

use crate::error::StateError;

/// Persistence for delivery jobs (spec.md §3 "Delivery Job", §4.6).
#[async_trait]
pub trait DeliveryJobStore: Send + Sync {
    async fn insert(&self, job: DeliveryJob) -> Result<(), StateError>;

    /// Atomically claim up to `limit` `PENDING` jobs whose `next_attempt_at
    /// <= now`, transitioning each to `IN_FLIGHT` under a lease held by
    /// `worker_id` until `lease_until`. Only the CAS winner for each job
    /// appears in the result (spec.md §4.6 step 1).
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: u32,
        worker_id: &str,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<DeliveryJob>, StateError>;

    async fn mark_succeeded(&self, job_id: &JobId) -> Result<(), StateError>;

    async fn mark_retry(
        &self,
        job_id: &JobId,
        attempt: u32,
        next_attempt_at: DateTime<Utc>,
        last_error: &str,
    ) -> Result<(), StateError>;

    async fn mark_dead(&self, job_id: &JobId, last_error: &str) -> Result<(), StateError>;

    /// Revert any `IN_FLIGHT` job whose lease has expired back to
    /// `PENDING`, for shutdown/crash recovery (spec.md §4.6).
    async fn reap_expired_leases(&self, now: DateTime<Utc>) -> Result<u64, StateError>;

    async fn get(&self, tenant_id: &TenantId, job_id: &JobId) -> Result<Option<DeliveryJob>, StateError>;

    /// List `DEAD` jobs for a tenant, for operator review and requeue.
    async fn list_dead(&self, tenant_id: &TenantId) -> Result<Vec<DeliveryJob>, StateError>;
}
