use opspulse_core::TenantId;

use crate::context::TenantContext;

/// Emitted before an operator-role query executes against tenant data that
/// bypasses the row-level filter. Spec.md §4.7: "Operator access ... emits
/// an audit record **before** the query executes."
#[derive(Debug, Clone)]
pub struct OperatorAudit {
    pub tenant_id: TenantId,
    pub operation: &'static str,
    pub observed_at: chrono::DateTime<chrono::Utc>,
}

/// Record an operator bypass. Call this immediately before issuing the
/// query; never after.
pub fn record_operator_bypass(ctx: &TenantContext, operation: &'static str) -> OperatorAudit {
    let audit = OperatorAudit {
        tenant_id: ctx.tenant_id().clone(),
        operation,
        observed_at: chrono::Utc::now(),
    };
    tracing::warn!(
        tenant_id = %audit.tenant_id,
        operation = audit.operation,
        "operator bypassed tenant row-level filter"
    );
    audit
}
