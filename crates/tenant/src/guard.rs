use opspulse_core::{DeviceId, TenantId};

use crate::context::TenantContext;
use crate::error::TenantError;

/// Resolve the tenant scope for a query. Fail-closed: an absent context is
/// an error, never an implicit "all tenants" query.
///
/// # Errors
/// Returns [`TenantError::MissingContext`] if `ctx` is `None`.
pub fn require_context(ctx: Option<&TenantContext>) -> Result<&TenantContext, TenantError> {
    ctx.ok_or(TenantError::MissingContext)
}

/// Assert that a device-scoped operation carries its mandatory tenant.
///
/// This exists purely to make the spec.md §4.7 invariant ("code paths that
/// accept only `device_id` are programming errors") a checkable runtime
/// assertion at the few boundaries where a bare `device_id` enters from an
/// external representation (e.g. deserializing a legacy payload), rather
/// than trusting every caller to pass `DeviceKey`.
///
/// # Errors
/// Returns [`TenantError::DeviceWithoutTenant`] if `tenant_id` is `None`.
pub fn require_tenant_for_device(
    tenant_id: Option<&TenantId>,
    _device_id: &DeviceId,
) -> Result<(), TenantError> {
    if tenant_id.is_none() {
        return Err(TenantError::DeviceWithoutTenant);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_context_is_fail_closed() {
        let result = require_context(None);
        assert!(matches!(result, Err(TenantError::MissingContext)));
    }

    #[test]
    fn present_context_passes_through() {
        let ctx = TenantContext::customer(TenantId::new("t1"));
        let resolved = require_context(Some(&ctx)).unwrap();
        assert_eq!(resolved.tenant_id().as_str(), "t1");
    }

    #[test]
    fn bare_device_id_rejected() {
        let device = DeviceId::new("d1");
        assert!(require_tenant_for_device(None, &device).is_err());
        let tenant = TenantId::new("t1");
        assert!(require_tenant_for_device(Some(&tenant), &device).is_ok());
    }
}
