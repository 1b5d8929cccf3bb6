use opspulse_core::{Integration, RouteId, TenantId};
use opspulse_state::RouteStore;

use crate::error::DeliveryError;

/// A job carries only `route_id`; [`RouteStore`] has no single-route
/// getter (only `list_enabled_routes`/`get_integration`), so resolving the
/// destination means scanning the tenant's enabled routes for a match.
/// Route counts per tenant are small (spec.md §3 is a routing-rule table,
/// not a device-scale one), so this is cheap relative to the delivery
/// attempt itself.
pub async fn resolve_integration(
    routes: &dyn RouteStore,
    tenant_id: &TenantId,
    route_id: &RouteId,
) -> Result<Integration, DeliveryError> {
    let enabled = routes.list_enabled_routes(tenant_id).await?;
    let route = enabled
        .into_iter()
        .find(|r| &r.route_id == route_id)
        .ok_or_else(|| DeliveryError::RouteNotFound(route_id.to_string()))?;

    routes
        .get_integration(tenant_id, &route.integration_id)
        .await?
        .ok_or_else(|| DeliveryError::IntegrationNotFound(route.integration_id.to_string()))
}
