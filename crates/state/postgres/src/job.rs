use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{AlertId, DeliveryJob, JobId, JobLease, JobState, RouteId, TenantId};
use opspulse_state::{DeliveryJobStore, StateError};

use crate::pool::PostgresRepo;

fn state_str(s: JobState) -> &'static str {
    match s {
        JobState::Pending => "PENDING",
        JobState::InFlight => "IN_FLIGHT",
        JobState::Succeeded => "SUCCEEDED",
        JobState::Dead => "DEAD",
    }
}

fn state_from_str(raw: &str) -> JobState {
    match raw {
        "IN_FLIGHT" => JobState::InFlight,
        "SUCCEEDED" => JobState::Succeeded,
        "DEAD" => JobState::Dead,
        _ => JobState::Pending,
    }
}

type JobRow = (
    String,
    String,
    String,
    String,
    i32,
    DateTime<Utc>,
    String,
    Option<String>,
    String,
    Option<String>,
    Option<DateTime<Utc>>,
);

fn row_to_job(row: JobRow) -> Result<DeliveryJob, StateError> {
    let (
        job_id,
        tenant_id,
        alert_id,
        route_id,
        attempt,
        next_attempt_at,
        state,
        last_error,
        payload,
        lease_worker_id,
        lease_expires_at,
    ) = row;
    let payload = serde_json::from_str(&payload).map_err(|e| StateError::Serialization(e.to_string()))?;
    let lease = match (lease_worker_id, lease_expires_at) {
        (Some(worker_id), Some(expires_at)) => Some(JobLease { worker_id, expires_at }),
        _ => None,
    };
    Ok(DeliveryJob {
        job_id: JobId::new(job_id),
        tenant_id: TenantId::new(tenant_id),
        alert_id: AlertId::new(alert_id),
        route_id: RouteId::new(route_id),
        attempt: attempt as u32,
        next_attempt_at,
        state: state_from_str(&state),
        last_error,
        payload,
        lease,
    })
}

#[async_trait]
impl DeliveryJobStore for PostgresRepo {
    async fn insert(&self, job: DeliveryJob) -> Result<(), StateError> {
        let table = self.config.jobs_table();
        let payload =
            serde_json::to_string(&job.payload).map_err(|e| StateError::Serialization(e.to_string()))?;
        let query = format!(
            "INSERT INTO {table}
                (job_id, tenant_id, alert_id, route_id, attempt, next_attempt_at, state, last_error, payload,
                 lease_worker_id, lease_expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NULL, NULL)"
        );
        sqlx::query(&query)
            .bind(job.job_id.as_str())
            .bind(job.tenant_id.as_str())
            .bind(job.alert_id.as_str())
            .bind(job.route_id.as_str())
            .bind(job.attempt as i32)
            .bind(job.next_attempt_at)
            .bind(state_str(job.state))
            .bind(&job.last_error)
            .bind(&payload)
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: u32,
        worker_id: &str,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<DeliveryJob>, StateError> {
        let table = self.config.jobs_table();
        // `FOR UPDATE SKIP LOCKED` lets concurrent delivery workers each claim
        // a disjoint batch without blocking on one another (spec.md §4.6).
        let query = format!(
            "UPDATE {table} SET state = 'IN_FLIGHT', lease_worker_id = $1, lease_expires_at = $2
             WHERE job_id IN (
                SELECT job_id FROM {table}
                WHERE state = 'PENDING' AND next_attempt_at <= $3
                ORDER BY next_attempt_at ASC
                LIMIT $4
                FOR UPDATE SKIP LOCKED
             )
             RETURNING job_id, tenant_id, alert_id, route_id, attempt, next_attempt_at, state,
                       last_error, payload, lease_worker_id, lease_expires_at"
        );
        let rows: Vec<JobRow> = sqlx::query_as(&query)
            .bind(worker_id)
            .bind(lease_until)
            .bind(now)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        rows.into_iter().map(row_to_job).collect()
    }

    async fn mark_succeeded(&self, job_id: &JobId) -> Result<(), StateError> {
        let table = self.config.jobs_table();
        let query = format!(
            "UPDATE {table} SET state = 'SUCCEEDED', lease_worker_id = NULL, lease_expires_at = NULL
             WHERE job_id = $1"
        );
        sqlx::query(&query)
            .bind(job_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn mark_retry(
        &self,
        job_id: &JobId,
        attempt: u32,
        next_attempt_at: DateTime<Utc>,
        last_error: &str,
    ) -> Result<(), StateError> {
        let table = self.config.jobs_table();
        let query = format!(
            "UPDATE {table} SET state = 'PENDING', attempt = $1, next_attempt_at = $2, last_error = $3,
                lease_worker_id = NULL, lease_expires_at = NULL
             WHERE job_id = $4"
        );
        sqlx::query(&query)
            .bind(attempt as i32)
            .bind(next_attempt_at)
            .bind(last_error)
            .bind(job_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn mark_dead(&self, job_id: &JobId, last_error: &str) -> Result<(), StateError> {
        let table = self.config.jobs_table();
        let query = format!(
            "UPDATE {table} SET state = 'DEAD', last_error = $1, lease_worker_id = NULL, lease_expires_at = NULL
             WHERE job_id = $2"
        );
        sqlx::query(&query)
            .bind(last_error)
            .bind(job_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn reap_expired_leases(&self, now: DateTime<Utc>) -> Result<u64, StateError> {
        let table = self.config.jobs_table();
        let query = format!(
            "UPDATE {table} SET state = 'PENDING', lease_worker_id = NULL, lease_expires_at = NULL
             WHERE state = 'IN_FLIGHT' AND lease_expires_at < $1"
        );
        let result = sqlx::query(&query)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn get(&self, tenant_id: &TenantId, job_id: &JobId) -> Result<Option<DeliveryJob>, StateError> {
        let table = self.config.jobs_table();
        let query = format!(
            "SELECT job_id, tenant_id, alert_id, route_id, attempt, next_attempt_at, state,
                    last_error, payload, lease_worker_id, lease_expires_at
             FROM {table} WHERE tenant_id = $1 AND job_id = $2"
        );
        let row: Option<JobRow> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .bind(job_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        row.map(row_to_job).transpose()
    }

    async fn list_dead(&self, tenant_id: &TenantId) -> Result<Vec<DeliveryJob>, StateError> {
        let table = self.config.jobs_table();
        let query = format!(
            "SELECT job_id, tenant_id, alert_id, route_id, attempt, next_attempt_at, state,
                    last_error, payload, lease_worker_id, lease_expires_at
             FROM {table} WHERE tenant_id = $1 AND state = 'DEAD'
             ORDER BY next_attempt_at DESC"
        );
        let rows: Vec<JobRow> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        rows.into_iter().map(row_to_job).collect()
    }
}
