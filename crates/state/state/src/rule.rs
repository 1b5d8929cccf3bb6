use async_trait::async_trait;
use opspulse_core::{AlertRule, RuleId, TenantId};

use crate::error::StateError;

/// Persistence for customer-defined threshold rules (spec.md §3 "Alert Rule").
#[async_trait]
pub trait AlertRuleStore: Send + Sync {
    async fn get(&self, tenant_id: &TenantId, rule_id: &RuleId) -> Result<Option<AlertRule>, StateError>;

    /// Enabled rules for a tenant, ordered by `rule_id` ascending — the
    /// stable tie-break order for simultaneous edges (spec.md §4.4).
    async fn list_enabled(&self, tenant_id: &TenantId) -> Result<Vec<AlertRule>, StateError>;

    async fn upsert(&self, rule: AlertRule) -> Result<(), StateError>;
}
