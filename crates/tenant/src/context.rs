use opspulse_core::TenantId;

/// The role a `TenantContext` was established under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A customer request, scoped to exactly one tenant. Row-level filters
    /// apply unconditionally.
    Customer,
    /// An operator/support role. Bypasses the row-level filter, but every
    /// bypass must be audited (see [`crate::audit`]) before the query runs.
    Operator,
}

/// A validated tenant context, carried on every DB-touching call.
///
/// Constructed **only** from a validated auth token upstream (OIDC bearer
/// token claims) — nothing in this crate issues a `TenantContext` from
/// unauthenticated input. This mirrors spec.md §4.7: "a customer request
/// carries a `tenant_id` derived only from a validated auth token."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: TenantId,
    role: RoleInner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RoleInner {
    Customer,
    Operator,
}

impl TenantContext {
    /// Establish a customer-scoped context. `tenant_id` must already have
    /// been extracted from a validated token by the caller.
    #[must_use]
    pub fn customer(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            role: RoleInner::Customer,
        }
    }

    /// Establish an operator context, which bypasses the row-level filter
    /// for `tenant_id`. Callers MUST emit an [`crate::audit::OperatorAudit`]
    /// record before the query this context scopes actually executes.
    #[must_use]
    pub fn operator(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            role: RoleInner::Operator,
        }
    }

    #[must_use]
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    #[must_use]
    pub fn role(&self) -> Role {
        match self.role {
            RoleInner::Customer => Role::Customer,
            RoleInner::Operator => Role::Operator,
        }
    }

    #[must_use]
    pub fn bypasses_row_filter(&self) -> bool {
        self.role() == Role::Operator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_context_does_not_bypass() {
        let ctx = TenantContext::customer(TenantId::new("t1"));
        assert!(!ctx.bypasses_row_filter());
        assert_eq!(ctx.role(), Role::Customer);
    }

    #[test]
    fn operator_context_bypasses() {
        let ctx = TenantContext::operator(TenantId::new("t1"));
        assert!(ctx.bypasses_row_filter());
        assert_eq!(ctx.role(), Role::Operator);
    }
}
