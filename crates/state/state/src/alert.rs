use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{Alert, AlertId, TenantId};

use crate::error::StateError;

/// Outcome of [`AlertStore::open_or_touch`], which enforces the
/// at-most-one-OPEN-per-fingerprint invariant (spec.md §3, §4.4) as a single
/// atomic operation rather than a check-then-insert race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// No OPEN alert existed for this fingerprint; `alert` was inserted.
    Opened(Alert),
    /// An OPEN alert already existed; its `last_seen_at`/details were
    /// refreshed in place and no new row was created.
    Touched(Alert),
}

/// Persistence for alerts (spec.md §3 "Alert").
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Atomically open a new alert for `fingerprint`, or touch the existing
    /// OPEN one. `candidate` is used verbatim when opening; only
    /// `details`/`opened_at` are read when touching.
    async fn open_or_touch(
        &self,
        tenant_id: &TenantId,
        fingerprint: &str,
        candidate: Alert,
    ) -> Result<OpenOutcome, StateError>;

    async fn close(
        &self,
        tenant_id: &TenantId,
        alert_id: &AlertId,
        closed_at: DateTime<Utc>,
    ) -> Result<(), StateError>;

    async fn find_open_by_fingerprint(
        &self,
        tenant_id: &TenantId,
        fingerprint: &str,
    ) -> Result<Option<Alert>, StateError>;

    async fn list_open(&self, tenant_id: &TenantId) -> Result<Vec<Alert>, StateError>;
}
