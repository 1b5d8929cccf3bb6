use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Create every required table if absent. Every device-scoped table carries
/// `tenant_id` as a leading primary-key column — there is no device-scoped
/// table in this schema a query could address by `device_id` alone
/// (spec.md §3, §4.7).
///
/// # Errors
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let registry = config.registry_table();
    let device_state = config.device_state_table();
    let rules = config.rules_table();
    let alerts = config.alerts_table();
    let routes = config.routes_table();
    let integrations = config.integrations_table();
    let dispatch_log = config.dispatch_log_table();
    let jobs = config.jobs_table();
    let latest_samples = config.latest_samples_table();

    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {registry} (
            tenant_id TEXT NOT NULL,
            device_id TEXT NOT NULL,
            site_id TEXT NOT NULL,
            status TEXT NOT NULL,
            provision_token_hash TEXT NOT NULL,
            subscription_id TEXT,
            PRIMARY KEY (tenant_id, device_id)
        )"
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {device_state} (
            tenant_id TEXT NOT NULL,
            device_id TEXT NOT NULL,
            last_seen_at TIMESTAMPTZ NOT NULL,
            liveness TEXT NOT NULL,
            last_known_site_id TEXT NOT NULL,
            PRIMARY KEY (tenant_id, device_id)
        )"
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {rules} (
            tenant_id TEXT NOT NULL,
            rule_id TEXT NOT NULL,
            metric_name TEXT NOT NULL,
            comparator TEXT NOT NULL,
            threshold DOUBLE PRECISION NOT NULL,
            device_selector TEXT NOT NULL,
            severity TEXT NOT NULL,
            enabled BOOLEAN NOT NULL,
            PRIMARY KEY (tenant_id, rule_id)
        )"
    ))
    .execute(pool)
    .await?;

    // `fingerprint` is unique per `(tenant_id, fingerprint)` only among OPEN
    // rows (spec.md §3, §4.4's dedup invariant). A partial unique index
    // expresses this directly instead of a check-then-insert race.
    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {alerts} (
            tenant_id TEXT NOT NULL,
            alert_id TEXT NOT NULL,
            device_id TEXT NOT NULL,
            alert_type TEXT NOT NULL,
            rule_id TEXT,
            severity TEXT NOT NULL,
            status TEXT NOT NULL,
            fingerprint TEXT NOT NULL,
            opened_at TIMESTAMPTZ NOT NULL,
            last_seen_at TIMESTAMPTZ NOT NULL,
            closed_at TIMESTAMPTZ,
            details TEXT NOT NULL,
            PRIMARY KEY (tenant_id, alert_id)
        )"
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {}_open_fingerprint_idx
         ON {alerts} (tenant_id, fingerprint) WHERE status = 'OPEN'",
        config.table_prefix
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {routes} (
            tenant_id TEXT NOT NULL,
            route_id TEXT NOT NULL,
            integration_id TEXT NOT NULL,
            min_severity TEXT NOT NULL,
            alert_types TEXT NOT NULL,
            device_selector_raw TEXT NOT NULL,
            throttle_seconds BIGINT,
            payload_template TEXT,
            enabled BOOLEAN NOT NULL DEFAULT TRUE,
            PRIMARY KEY (tenant_id, route_id)
        )"
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {integrations} (
            tenant_id TEXT NOT NULL,
            integration_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            config TEXT NOT NULL,
            PRIMARY KEY (tenant_id, integration_id)
        )"
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {dispatch_log} (
            tenant_id TEXT NOT NULL,
            route_id TEXT NOT NULL,
            fingerprint TEXT NOT NULL,
            dispatched_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (tenant_id, route_id, fingerprint)
        )"
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {jobs} (
            job_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            alert_id TEXT NOT NULL,
            route_id TEXT NOT NULL,
            attempt INTEGER NOT NULL,
            next_attempt_at TIMESTAMPTZ NOT NULL,
            state TEXT NOT NULL,
            last_error TEXT,
            payload TEXT NOT NULL,
            lease_worker_id TEXT,
            lease_expires_at TIMESTAMPTZ
        )"
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS {}_jobs_due_idx ON {jobs} (state, next_attempt_at)",
        config.table_prefix
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {latest_samples} (
            tenant_id TEXT NOT NULL,
            device_id TEXT NOT NULL,
            metric_name TEXT NOT NULL,
            value TEXT NOT NULL,
            observed_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (tenant_id, device_id, metric_name)
        )"
    ))
    .execute(pool)
    .await?;

    Ok(())
}
