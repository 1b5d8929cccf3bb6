use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{Integration, IntegrationId, Route, RouteId, TenantId};
use opspulse_state::{RouteStore, StateError};

use crate::backend::MemoryBackend;

#[async_trait]
impl RouteStore for MemoryBackend {
    async fn list_enabled_routes(&self, tenant_id: &TenantId) -> Result<Vec<Route>, StateError> {
        Ok(self
            .routes
            .iter()
            .filter(|r| &r.key().0 == tenant_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn get_integration(
        &self,
        tenant_id: &TenantId,
        integration_id: &IntegrationId,
    ) -> Result<Option<Integration>, StateError> {
        Ok(self
            .integrations
            .get(&(tenant_id.clone(), integration_id.clone()))
            .map(|r| r.value().clone()))
    }

    async fn upsert_route(&self, route: Route) -> Result<(), StateError> {
        self.routes.insert((route.tenant_id.clone(), route.route_id.clone()), route);
        Ok(())
    }

    async fn upsert_integration(&self, integration: Integration) -> Result<(), StateError> {
        self.integrations.insert(
            (integration.tenant_id.clone(), integration.integration_id.clone()),
            integration,
        );
        Ok(())
    }

    async fn last_dispatched_at(
        &self,
        tenant_id: &TenantId,
        route_id: &RouteId,
        fingerprint: &str,
    ) -> Result<Option<DateTime<Utc>>, StateError> {
        Ok(self
            .dispatch_log
            .get(&(tenant_id.clone(), route_id.clone(), fingerprint.to_owned()))
            .map(|r| *r.value()))
    }

    async fn record_dispatch(
        &self,
        tenant_id: &TenantId,
        route_id: &RouteId,
        fingerprint: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        self.dispatch_log
            .insert((tenant_id.clone(), route_id.clone(), fingerprint.to_owned()), at);
        Ok(())
    }
}
