use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{Alert, AlertId, AlertStatus, TenantId};
use opspulse_state::{AlertStore, OpenOutcome, StateError};

use crate::backend::MemoryBackend;

#[async_trait]
impl AlertStore for MemoryBackend {
    async fn open_or_touch(
        &self,
        tenant_id: &TenantId,
        fingerprint: &str,
        candidate: Alert,
    ) -> Result<OpenOutcome, StateError> {
        let fp_key = (tenant_id.clone(), fingerprint.to_owned());

        // The fingerprint index entry is the single point of synchronization:
        // whoever wins the vacant-entry race is the one that actually opens
        // the alert row.
        match self.open_by_fingerprint.entry(fp_key) {
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(candidate.alert_id.clone());
                let key = (tenant_id.clone(), candidate.alert_id.clone());
                self.alerts.insert(key, candidate.clone());
                Ok(OpenOutcome::Opened(candidate))
            }
            dashmap::mapref::entry::Entry::Occupied(occupied) => {
                let existing_id = occupied.get().clone();
                let key = (tenant_id.clone(), existing_id);
                let mut entry = self.alerts.get_mut(&key).ok_or_else(|| {
                    StateError::InvariantViolation(
                        "fingerprint index pointed at a missing alert row".into(),
                    )
                })?;
                entry.last_seen_at = candidate.last_seen_at;
                entry.details = candidate.details;
                Ok(OpenOutcome::Touched(entry.clone()))
            }
        }
    }

    async fn close(
        &self,
        tenant_id: &TenantId,
        alert_id: &AlertId,
        closed_at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        let key = (tenant_id.clone(), alert_id.clone());
        if let Some(mut alert) = self.alerts.get_mut(&key) {
            alert.status = AlertStatus::Closed;
            alert.closed_at = Some(closed_at);
            self.open_by_fingerprint
                .remove_if(&(tenant_id.clone(), alert.fingerprint.clone()), |_, id| id == alert_id);
        }
        Ok(())
    }

    async fn find_open_by_fingerprint(
        &self,
        tenant_id: &TenantId,
        fingerprint: &str,
    ) -> Result<Option<Alert>, StateError> {
        let Some(alert_id) = self
            .open_by_fingerprint
            .get(&(tenant_id.clone(), fingerprint.to_owned()))
            .map(|r| r.value().clone())
        else {
            return Ok(None);
        };
        Ok(self
            .alerts
            .get(&(tenant_id.clone(), alert_id))
            .map(|r| r.value().clone()))
    }

    async fn list_open(&self, tenant_id: &TenantId) -> Result<Vec<Alert>, StateError> {
        Ok(self
            .alerts
            .iter()
            .filter(|r| &r.key().0 == tenant_id && r.value().status == AlertStatus::Open)
            .map(|r| r.value().clone())
            .collect())
    }
}
