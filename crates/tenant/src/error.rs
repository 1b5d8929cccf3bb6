use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenantError {
    /// A DB-touching call was attempted with no tenant context set. The
    /// contract is fail-closed: this must never silently resolve to "all
    /// tenants".
    #[error("no tenant context set on this connection/transaction")]
    MissingContext,

    /// A caller supplied a bare `device_id` with no `tenant_id`. Spec.md
    /// §4.7: "code paths that accept only `device_id` are programming
    /// errors."
    #[error("device-scoped operation attempted without a tenant_id")]
    DeviceWithoutTenant,
}
