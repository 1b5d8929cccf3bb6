use async_trait::async_trait;
use opspulse_core::{AlertRule, Comparator, RuleId, Severity, TenantId};
use opspulse_state::{AlertRuleStore, StateError};

use crate::pool::PostgresRepo;

fn comparator_str(c: Comparator) -> &'static str {
    match c {
        Comparator::Gt => "GT",
        Comparator::Gte => "GTE",
        Comparator::Lt => "LT",
        Comparator::Lte => "LTE",
    }
}

fn comparator_from_str(raw: &str) -> Comparator {
    match raw {
        "GTE" => Comparator::Gte,
        "LT" => Comparator::Lt,
        "LTE" => Comparator::Lte,
        _ => Comparator::Gt,
    }
}

pub(crate) fn severity_str(s: Severity) -> &'static str {
    match s {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Critical => "critical",
    }
}

pub(crate) fn severity_from_str(raw: &str) -> Severity {
    match raw {
        "warning" => Severity::Warning,
        "critical" => Severity::Critical,
        _ => Severity::Info,
    }
}

type RuleRow = (String, String, f64, String, String, bool);

fn row_to_rule(tenant_id: &TenantId, rule_id: String, row: RuleRow) -> AlertRule {
    let (metric_name, comparator, threshold, device_selector, severity, enabled) = row;
    AlertRule {
        tenant_id: tenant_id.clone(),
        rule_id: RuleId::new(rule_id),
        metric_name,
        comparator: comparator_from_str(&comparator),
        threshold,
        device_selector,
        severity: severity_from_str(&severity),
        enabled,
    }
}

#[async_trait]
impl AlertRuleStore for PostgresRepo {
    async fn get(&self, tenant_id: &TenantId, rule_id: &RuleId) -> Result<Option<AlertRule>, StateError> {
        let table = self.config.rules_table();
        let query = format!(
            "SELECT metric_name, comparator, threshold, device_selector, severity, enabled
             FROM {table} WHERE tenant_id = $1 AND rule_id = $2"
        );
        let row: Option<RuleRow> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .bind(rule_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(row.map(|r| row_to_rule(tenant_id, rule_id.as_str().to_owned(), r)))
    }

    async fn list_enabled(&self, tenant_id: &TenantId) -> Result<Vec<AlertRule>, StateError> {
        let table = self.config.rules_table();
        let query = format!(
            "SELECT rule_id, metric_name, comparator, threshold, device_selector, severity, enabled
             FROM {table} WHERE tenant_id = $1 AND enabled = TRUE ORDER BY rule_id ASC"
        );
        let rows: Vec<(String, String, String, f64, String, String, bool)> = sqlx::query_as(&query)
            .bind(tenant_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(rule_id, metric_name, comparator, threshold, device_selector, severity, enabled)| {
                row_to_rule(
                    tenant_id,
                    rule_id,
                    (metric_name, comparator, threshold, device_selector, severity, enabled),
                )
            })
            .collect())
    }

    async fn upsert(&self, rule: AlertRule) -> Result<(), StateError> {
        let table = self.config.rules_table();
        let query = format!(
            "INSERT INTO {table} (tenant_id, rule_id, metric_name, comparator, threshold, device_selector, severity, enabled)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (tenant_id, rule_id) DO UPDATE SET
                metric_name = EXCLUDED.metric_name,
                comparator = EXCLUDED.comparator,
                threshold = EXCLUDED.threshold,
                device_selector = EXCLUDED.device_selector,
                severity = EXCLUDED.severity,
                enabled = EXCLUDED.enabled"
        );
        sqlx::query(&query)
            .bind(rule.tenant_id.as_str())
            .bind(rule.rule_id.as_str())
            .bind(&rule.metric_name)
            .bind(comparator_str(rule.comparator))
            .bind(rule.threshold)
            .bind(&rule.device_selector)
            .bind(severity_str(rule.severity))
            .bind(rule.enabled)
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }
}
