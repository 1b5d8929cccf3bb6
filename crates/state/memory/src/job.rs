use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{DeliveryJob, JobId, JobLease, JobState, TenantId};
use opspulse_state::{DeliveryJobStore, StateError};

use crate::backend::MemoryBackend;

#[async_trait]
impl DeliveryJobStore for MemoryBackend {
    async fn insert(&self, job: DeliveryJob) -> Result<(), StateError> {
        self.jobs.insert(job.job_id.clone(), job);
        Ok(())
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: u32,
        worker_id: &str,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<DeliveryJob>, StateError> {
        let due_ids: Vec<JobId> = self
            .jobs
            .iter()
            .filter(|r| r.value().is_due(now))
            .map(|r| r.key().clone())
            .take(limit as usize)
            .collect();

        let mut claimed = Vec::with_capacity(due_ids.len());
        for job_id in due_ids {
            // Re-check under the per-shard lock: another claimer may have
            // already won this job between the filter pass and now.
            if let Some(mut job) = self.jobs.get_mut(&job_id) {
                if job.state == JobState::Pending && job.next_attempt_at <= now {
                    job.state = JobState::InFlight;
                    job.lease = Some(JobLease {
                        worker_id: worker_id.to_owned(),
                        expires_at: lease_until,
                    });
                    claimed.push(job.clone());
                }
            }
        }
        Ok(claimed)
    }

    async fn mark_succeeded(&self, job_id: &JobId) -> Result<(), StateError> {
        if let Some(mut job) = self.jobs.get_mut(job_id) {
            job.state = JobState::Succeeded;
            job.lease = None;
        }
        Ok(())
    }

    async fn mark_retry(
        &self,
        job_id: &JobId,
        attempt: u32,
        next_attempt_at: DateTime<Utc>,
        last_error: &str,
    ) -> Result<(), StateError> {
        if let Some(mut job) = self.jobs.get_mut(job_id) {
            job.attempt = attempt;
            job.next_attempt_at = next_attempt_at;
            job.last_error = Some(last_error.to_owned());
            job.state = JobState::Pending;
            job.lease = None;
        }
        Ok(())
    }

    async fn mark_dead(&self, job_id: &JobId, last_error: &str) -> Result<(), StateError> {
        if let Some(mut job) = self.jobs.get_mut(job_id) {
            job.state = JobState::Dead;
            job.last_error = Some(last_error.to_owned());
            job.lease = None;
        }
        Ok(())
    }

    async fn reap_expired_leases(&self, now: DateTime<Utc>) -> Result<u64, StateError> {
        let mut reaped = 0u64;
        for mut job in self.jobs.iter_mut() {
            let expired = job.state == JobState::InFlight
                && job.lease.as_ref().is_some_and(|lease| lease.expires_at <= now);
            if expired {
                job.state = JobState::Pending;
                job.lease = None;
                reaped += 1;
            }
        }
        Ok(reaped)
    }

    async fn get(&self, tenant_id: &TenantId, job_id: &JobId) -> Result<Option<DeliveryJob>, StateError> {
        Ok(self
            .jobs
            .get(job_id)
            .filter(|r| &r.value().tenant_id == tenant_id)
            .map(|r| r.value().clone()))
    }

    async fn list_dead(&self, tenant_id: &TenantId) -> Result<Vec<DeliveryJob>, StateError> {
        Ok(self
            .jobs
            .iter()
            .filter(|r| &r.value().tenant_id == tenant_id && r.value().state == JobState::Dead)
            .map(|r| r.value().clone())
            .collect())
    }
}
