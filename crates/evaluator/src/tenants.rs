use async_trait::async_trait;
use opspulse_core::TenantId;

/// Enumerates the tenants the evaluator should tick.
///
/// No tenant directory exists in `opspulse-state` — provisioning/billing
/// ownership of "which tenants are active" sits outside this pipeline's
/// scope. This trait is kept local, mirroring `opspulse-ingest`'s
/// `QuarantineSink`: a small seam the embedding binary implements (e.g.
/// backed by an admin table or a static list in single-tenant deployments)
/// rather than growing the state crate's trait surface speculatively.
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
