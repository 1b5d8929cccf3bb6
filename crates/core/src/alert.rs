use serde::{Deserialize, Serialize};

use crate::ids::{AlertId, DeviceId, RuleId, TenantId};
use crate::rule::Severity;

/// What raised the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertType {
    NoHeartbeat,
    Threshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertStatus {
    Open,
    Acked,
    Closed,
    Silenced,
}

/// An alert, keyed by `(tenant_id, alert_id)`.
///
/// At most one `OPEN` row may exist per `(tenant_id, fingerprint)` — see
/// [`crate::fingerprint`] and the evaluator's dedup contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub tenant_id: TenantId,
    pub alert_id: AlertId,
    pub device_id: DeviceId,
    pub alert_type: AlertType,
    pub rule_id: Option<RuleId>,
    pub severity: Severity,
    pub status: AlertStatus,
    pub fingerprint: String,
    pub opened_at: chrono::DateTime<chrono::Utc>,
    /// Updated on every `open_or_touch` that finds an existing OPEN row
    /// instead of opening a new one (spec.md §4.4 dedup contract).
    pub last_seen_at: chrono::DateTime<chrono::Utc>,
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub details: serde_json::Value,
}

impl Alert {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == AlertStatus::Open
    }
}
