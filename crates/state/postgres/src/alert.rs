use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{Alert, AlertId, AlertStatus, AlertType, DeviceId, RuleId, TenantId};
use opspulse_state::{AlertStore, OpenOutcome, StateError};

use crate::pool::PostgresRepo;
use crate::rule::{severity_from_str, severity_str};

fn alert_type_str(t: AlertType) -> &'static str {
    match t {
        AlertType::NoHeartbeat => "NO_HEARTBEAT",
        AlertType::Threshold => "THRESHOLD",
    }
}

fn alert_type_from_str(raw: &str) -> AlertType {
    match raw {
        "THRESHOLD" => AlertType::Threshold,
        _ => AlertType::NoHeartbeat,
    }
}

fn status_str(s: AlertStatus) -> &'static str {
    match s {
        AlertStatus::Open => "OPEN",
        AlertStatus::Acked => "ACKED",
        AlertStatus::Closed => "CLOSED",
        AlertStatus::Silenced => "SILENCED",
    }
}

fn status_from_str(raw: &str) -> AlertStatus {
    match raw {
        "ACKED" => AlertStatus::Acked,
        "CLOSED" => AlertStatus::Closed,
        "SILENCED" => AlertStatus::Silenced,
        _ => AlertStatus::Open,
    }
}

type AlertRow = (
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    String,
);

fn row_to_alert(tenant_id: &TenantId, row: AlertRow) -> Result<Alert, StateError> {
    let (
        alert_id,
        device_id,
        alert_type,
        rule_id,
        severity,
        status,
        fingerprint,
        opened_at,
        last_seen_at,
        closed_at,
        details,
    ) = row;
    let details = serde_json::from_str(&details).map_err(|e| StateError::Serialization(e.to_string()))?;
    Ok(Alert {
        tenant_id: tenant_id.clone(),
        alert_id: AlertId::new(alert_id),
        device_id: DeviceId::new(device_id),
        alert_type: alert_type_from_str(&alert_type),
        rule_id: rule_id.map(RuleId::new),
        severity: severity_from_str(&severity),
        status: status_from_str(&status),
        fingerprint,
        opened_at,
        last_seen_at,
        closed_at,
        details,
    })
}

#[async_trait]
impl AlertStore for PostgresRepo {
    async fn open_or_touch(
        &self,
        tenant_id: &TenantId,
        fingerprint: &str,
        candidate: Alert,
    ) -> Result<OpenOutcome, StateError> {
        let table = self.config.alerts_table();
        let details = serde_json::to_string(&candidate.details)
            .map_err(|e| StateError::Serialization(e.to_string()))?;

        // The partial unique index on (tenant_id, fingerprint) WHERE status =
        // 'OPEN' is what makes this a single atomic statement instead of a
        // check-then-insert race (spec.md §3, §4.4).
        let query = format!(
            "INSERT INTO {table}
                (tenant_id, alert_id, device_id, alert_type, rule_id, severity, status,
                 fingerprint, opened_at, last_seen_at, closed_at, details)
             VALUES ($1, $2, $3, $4, $5, $6, 'OPEN', $7, $8, $8, NULL, $9)
             ON CONFLICT (tenant_id, fingerprint) WHERE status = 'OPEN' DO UPDATE SET
                last_seen_at = EXCLUDED.last_seen_at,
                details = EXCLUDED.details
             RETURNING alert_id, device_id, alert_type, rule_id, severity, status,
                       fingerprint, opened_at, last_seen_at, closed_at, details,
                       (xmax = 0) AS inserted"
        );

        let row: (
            String,
            String,
            String,
            Option<String>,
            String,
            String,
            String,
            DateTime<Utc>,
            DateTime<Utc>,
            Option<DateTime<Utc>>,
            String,
            bool,
        ) = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .bind(candidate.alert_id.as_str())
            .bind(candidate.device_id.as_str())
            .bind(alert_type_str(candidate.alert_type))
            .bind(candidate.rule_id.as_ref().map(RuleId::as_str))
            .bind(severity_str(candidate.severity))
            .bind(fingerprint)
            .bind(candidate.opened_at)
            .bind(&details)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        let inserted = row.11;
        let alert = row_to_alert(
            tenant_id,
            (
                row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7, row.8, row.9, row.10,
            ),
        )?;
        Ok(if inserted {
            OpenOutcome::Opened(alert)
        } else {
            OpenOutcome::Touched(alert)
        })
    }

    async fn close(
        &self,
        tenant_id: &TenantId,
        alert_id: &AlertId,
        closed_at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        let table = self.config.alerts_table();
        let query = format!(
            "UPDATE {table} SET status = 'CLOSED', closed_at = $1
             WHERE tenant_id = $2 AND alert_id = $3"
        );
        sqlx::query(&query)
            .bind(closed_at)
            .bind(tenant_id.as_str())
            .bind(alert_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn find_open_by_fingerprint(
        &self,
        tenant_id: &TenantId,
        fingerprint: &str,
    ) -> Result<Option<Alert>, StateError> {
        let table = self.config.alerts_table();
        let query = format!(
            "SELECT alert_id, device_id, alert_type, rule_id, severity, status,
                    fingerprint, opened_at, last_seen_at, closed_at, details
             FROM {table} WHERE tenant_id = $1 AND fingerprint = $2 AND status = 'OPEN'"
        );
        let row: Option<AlertRow> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        row.map(|r| row_to_alert(tenant_id, r)).transpose()
    }

    async fn list_open(&self, tenant_id: &TenantId) -> Result<Vec<Alert>, StateError> {
        let table = self.config.alerts_table();
        let query = format!(
            "SELECT alert_id, device_id, alert_type, rule_id, severity, status,
                    fingerprint, opened_at, last_seen_at, closed_at, details
             FROM {table} WHERE tenant_id = $1 AND status = 'OPEN'"
        );
        let rows: Vec<AlertRow> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        rows.into_iter().map(|r| row_to_alert(tenant_id, r)).collect()
    }
}
