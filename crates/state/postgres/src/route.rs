use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opspulse_core::{AlertType, Integration, IntegrationId, IntegrationKind, Route, RouteId, TenantId};
use opspulse_state::{RouteStore, StateError};

use crate::pool::PostgresRepo;
use crate::rule::{severity_from_str, severity_str};

fn alert_types_to_str(types: &[AlertType]) -> String {
    types
        .iter()
        .map(|t| match t {
            AlertType::NoHeartbeat => "NO_HEARTBEAT",
            AlertType::Threshold => "THRESHOLD",
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn alert_types_from_str(raw: &str) -> Vec<AlertType> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(|s| if s == "THRESHOLD" { AlertType::Threshold } else { AlertType::NoHeartbeat })
        .collect()
}

fn integration_kind_tag(kind: &IntegrationKind) -> &'static str {
    match kind {
        IntegrationKind::Webhook { .. } => "webhook",
        IntegrationKind::Snmp { .. } => "snmp",
        IntegrationKind::Email { .. } => "email",
        IntegrationKind::Mqtt { .. } => "mqtt",
    }
}

#[async_trait]
impl RouteStore for PostgresRepo {
    async fn list_enabled_routes(&self, tenant_id: &TenantId) -> Result<Vec<Route>, StateError> {
        let table = self.config.routes_table();
        let query = format!(
            "SELECT route_id, integration_id, min_severity, alert_types, device_selector_raw, throttle_seconds, payload_template
             FROM {table} WHERE tenant_id = $1 AND enabled = TRUE"
        );
        let rows: Vec<(String, String, String, String, String, Option<i64>, Option<String>)> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(route_id, integration_id, min_severity, alert_types, selector_raw, throttle, payload_template)| Route {
                    tenant_id: tenant_id.clone(),
                    route_id: RouteId::new(route_id),
                    integration_id: IntegrationId::new(integration_id),
                    min_severity: severity_from_str(&min_severity),
                    alert_types: alert_types_from_str(&alert_types),
                    device_selector: None,
                    device_selector_raw: selector_raw,
                    throttle_seconds: throttle.map(|v| v as u64),
                    payload_template,
                },
            )
            .collect())
    }

    async fn get_integration(
        &self,
        tenant_id: &TenantId,
        integration_id: &IntegrationId,
    ) -> Result<Option<Integration>, StateError> {
        let table = self.config.integrations_table();
        let query = format!("SELECT config FROM {table} WHERE tenant_id = $1 AND integration_id = $2");
        let row: Option<(String,)> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .bind(integration_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        row.map(|(config,)| {
            let kind: IntegrationKind =
                serde_json::from_str(&config).map_err(|e| StateError::Serialization(e.to_string()))?;
            Ok(Integration {
                tenant_id: tenant_id.clone(),
                integration_id: integration_id.clone(),
                kind,
            })
        })
        .transpose()
    }

    async fn upsert_route(&self, route: Route) -> Result<(), StateError> {
        let table = self.config.routes_table();
        let query = format!(
            "INSERT INTO {table}
                (tenant_id, route_id, integration_id, min_severity, alert_types, device_selector_raw, throttle_seconds, payload_template, enabled)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)
             ON CONFLICT (tenant_id, route_id) DO UPDATE SET
                integration_id = EXCLUDED.integration_id,
                min_severity = EXCLUDED.min_severity,
                alert_types = EXCLUDED.alert_types,
                device_selector_raw = EXCLUDED.device_selector_raw,
                throttle_seconds = EXCLUDED.throttle_seconds,
                payload_template = EXCLUDED.payload_template"
        );
        sqlx::query(&query)
            .bind(route.tenant_id.as_str())
            .bind(route.route_id.as_str())
            .bind(route.integration_id.as_str())
            .bind(severity_str(route.min_severity))
            .bind(alert_types_to_str(&route.alert_types))
            .bind(&route.device_selector_raw)
            .bind(route.throttle_seconds.map(|v| v as i64))
            .bind(&route.payload_template)
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn upsert_integration(&self, integration: Integration) -> Result<(), StateError> {
        let table = self.config.integrations_table();
        let config = serde_json::to_string(&integration.kind)
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let query = format!(
            "INSERT INTO {table} (tenant_id, integration_id, kind, config)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (tenant_id, integration_id) DO UPDATE SET
                kind = EXCLUDED.kind, config = EXCLUDED.config"
        );
        sqlx::query(&query)
            .bind(integration.tenant_id.as_str())
            .bind(integration.integration_id.as_str())
            .bind(integration_kind_tag(&integration.kind))
            .bind(&config)
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn last_dispatched_at(
        &self,
        tenant_id: &TenantId,
        route_id: &opspulse_core::RouteId,
        fingerprint: &str,
    ) -> Result<Option<DateTime<Utc>>, StateError> {
        let table = self.config.dispatch_log_table();
        let query = format!(
            "SELECT dispatched_at FROM {table} WHERE tenant_id = $1 AND route_id = $2 AND fingerprint = $3"
        );
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .bind(route_id.as_str())
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(row.map(|(t,)| t))
    }

    async fn record_dispatch(
        &self,
        tenant_id: &TenantId,
        route_id: &opspulse_core::RouteId,
        fingerprint: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        let table = self.config.dispatch_log_table();
        let query = format!(
            "INSERT INTO {table} (tenant_id, route_id, fingerprint, dispatched_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (tenant_id, route_id, fingerprint) DO UPDATE SET dispatched_at = EXCLUDED.dispatched_at"
        );
        sqlx::query(&query)
            .bind(tenant_id.as_str())
            .bind(route_id.as_str())
            .bind(fingerprint)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }
}
