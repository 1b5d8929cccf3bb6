use async_trait::async_trait;
use opspulse_core::TenantId;

/// Enumerates the tenants the dispatcher should tick.
///
/// Mirrors `opspulse-evaluator::TenantSource` — a small seam the embedding
/// binary implements rather than growing `opspulse-state`'s trait surface
/// speculatively with a tenant directory this pipeline doesn't otherwise
/// need.
#[async_trait]
pub trait TenantSource: Send + Sync {
    async fn active_tenants(&self) -> Vec<TenantId>;
}

/// A fixed, never-changing tenant set — useful for single-tenant
/// deployments and tests.
pub struct StaticTenantSource(Vec<TenantId>);

impl StaticTenantSource {
    #[must_use]
    pub fn new(tenants: Vec<TenantId>) -> Self {
        Self(tenants)
    }
}

#[async_trait]
impl TenantSource for StaticTenantSource {
    async fn active_tenants(&self) -> Vec<TenantId> {
        self.0.clone()
    }
}
