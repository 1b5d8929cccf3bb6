use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{Integration, IntegrationId, Route, RouteId, TenantId};

use crate::error::StateError;

/// Persistence for routing rules and outbound integrations (spec.md §3
/// "Integration and Route").
#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn list_enabled_routes(&self, tenant_id: &TenantId) -> Result<Vec<Route>, StateError>;

    async fn get_integration(
        &self,
        tenant_id: &TenantId,
        integration_id: &IntegrationId,
    ) -> Result<Option<Integration>, StateError>;

    async fn upsert_route(&self, route: Route) -> Result<(), StateError>;

    async fn upsert_integration(&self, integration: Integration) -> Result<(), StateError>;

    /// When the last delivery job for `(route_id, fingerprint)` was created,
    /// for throttle enforcement (spec.md §4.5).
    async fn last_dispatched_at(
        &self,
        tenant_id: &TenantId,
        route_id: &RouteId,
        fingerprint: &str,
    ) -> Result<Option<DateTime<Utc>>, StateError>;

    /// Record that a delivery job was just created for `(route_id,
    /// fingerprint)`, advancing the throttle window.
    async fn record_dispatch(
        &self,
        tenant_id: &TenantId,
        route_id: &RouteId,
        fingerprint: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StateError>;
}
