use std::time::Duration;

use serde::Deserialize;

use opspulse_cache::AuthCacheConfig;
use opspulse_delivery::DeliveryConfig;
use opspulse_dispatcher::DispatcherConfig;
use opspulse_evaluator::EvaluatorConfig;
use opspulse_ingest::IngestConfig;
use opspulse_writer::WriterConfig;

/// Top-level configuration for the pulse server, loaded from a TOML file.
///
/// Every section has a workable default so an empty file (or a missing one)
/// still produces a runnable in-memory configuration (spec.md §6).
#[derive(Debug, Deserialize)]
pub struct PulseConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub postgres: PostgresRefConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub influx: InfluxConfig,
    #[serde(default)]
    pub tenants: TenantsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub writer: WriterTomlConfig,
    #[serde(default)]
    pub ingest: IngestTomlConfig,
    #[serde(default)]
    pub liveness: LivenessConfig,
    #[serde(default)]
    pub evaluator: EvaluatorTomlConfig,
    #[serde(default)]
    pub dispatcher: DispatcherTomlConfig,
    #[serde(default)]
    pub delivery: DeliveryTomlConfig,
}

impl Default for PulseConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty document parses against every section's defaults")
    }
}

impl PulseConfig {
    /// Overlay values from the environment variables named in spec.md §6.
    /// File values win when a variable is absent; the variable wins when present.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_u64("AUTH_CACHE_TTL_SECONDS") {
            self.cache.ttl_seconds = v;
        }
        if let Some(v) = env_usize("AUTH_CACHE_MAX_SIZE") {
            self.cache.max_size = v;
        }
        if let Some(v) = env_usize("INFLUX_BATCH_SIZE") {
            self.writer.batch_size = v;
        }
        if let Some(v) = env_u64("INFLUX_FLUSH_INTERVAL_MS") {
            self.writer.flush_interval_ms = v;
        }
        if let Some(v) = env_usize("INGEST_WORKER_COUNT") {
            self.ingest.worker_count = v;
        }
        if let Some(v) = env_usize("INGEST_QUEUE_SIZE") {
            self.ingest.queue_capacity = v;
        }
        if let Some(v) = env_u64("STALE_AFTER_SECONDS") {
            self.liveness.stale_after_seconds = v;
        }
        if let Some(v) = env_u64("OFFLINE_AFTER_SECONDS") {
            self.liveness.offline_after_seconds = v;
        }
        if let Some(v) = env_u64("EVALUATOR_TICK_SECONDS") {
            self.evaluator.tick_seconds = v;
        }
        if let Some(v) = env_u32("DELIVERY_MAX_ATTEMPTS") {
            self.delivery.max_attempts = v;
        }
        if let Some(v) = env_u64("DELIVERY_BASE_BACKOFF_MS") {
            self.delivery.base_backoff_ms = v;
        }
        if let Some(v) = env_u64("DELIVERY_MAX_BACKOFF_SECONDS") {
            self.delivery.max_backoff_seconds = v;
        }
        if let Some(v) = env_usize("DELIVERY_CONCURRENCY") {
            self.delivery.concurrency = v;
        }
        if let Some(v) = env_u64("DELIVERY_REQUEST_TIMEOUT_SECONDS") {
            self.delivery.request_timeout_seconds = v;
        }
        if let Some(v) = std::env::var("SSRF_ALLOW_PRIVATE").ok() {
            self.delivery.ssrf_allow_private = v == "1" || v.eq_ignore_ascii_case("true");
        }
    }

    pub fn auth_cache_config(&self) -> AuthCacheConfig {
        AuthCacheConfig {
            ttl: Duration::from_secs(self.cache.ttl_seconds),
            max_size: self.cache.max_size,
        }
    }

    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            batch_size: self.writer.batch_size,
            flush_interval: Duration::from_millis(self.writer.flush_interval_ms),
            max_tries: self.writer.max_tries,
            retry_delay: Duration::from_millis(self.writer.retry_delay_ms),
        }
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            worker_count: self.ingest.worker_count,
            queue_capacity: self.ingest.queue_capacity,
            rate_limit_per_sec: self.ingest.rate_limit_per_sec,
            rate_limit_burst: self.ingest.rate_limit_burst,
        }
    }

    pub fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            tick_interval: Duration::from_secs(self.evaluator.tick_seconds),
            stale_after: Duration::from_secs(self.liveness.stale_after_seconds),
            offline_after: Duration::from_secs(self.liveness.offline_after_seconds),
        }
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            tick_interval: Duration::from_secs(self.dispatcher.tick_seconds),
        }
    }

    pub fn delivery_config(&self) -> DeliveryConfig {
        let mut config = DeliveryConfig {
            tick_interval: Duration::from_secs(self.delivery.tick_seconds),
            delivery_concurrency: self.delivery.concurrency,
            max_attempts: self.delivery.max_attempts,
            base_backoff: Duration::from_millis(self.delivery.base_backoff_ms),
            max_backoff: Duration::from_secs(self.delivery.max_backoff_seconds),
            lease_duration: Duration::from_secs(self.delivery.lease_duration_seconds),
            ..Default::default()
        };
        if let Some(worker_id) = &self.delivery.worker_id {
            config.worker_id.clone_from(worker_id);
        }
        config
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// A single admin API key entry, hashed before being held in memory.
#[derive(Debug, Deserialize)]
pub struct AdminApiKeyConfig {
    /// Human-readable label for logging ("operator-console", "on-call-cli").
    pub name: String,
    /// Raw key value as distributed to the operator. Only its SHA-256 hash
    /// is retained after startup (see `crate::auth`).
    pub key: String,
}

/// Admin API key table, used to authenticate `/admin/v1/*` requests.
#[derive(Debug, Default, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub api_keys: Vec<AdminApiKeyConfig>,
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Graceful shutdown timeout in seconds: the maximum time to wait for
    /// in-flight ingest submissions to drain before the process exits.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Reference to a Postgres state backend. Absent `url` means the server
/// runs against the in-memory backend (spec.md §4.3's Non-goal on durable
/// persistence by default, relaxed for operators who opt in here).
#[derive(Debug, Default, Deserialize)]
pub struct PostgresRefConfig {
    pub url: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
}

fn default_pool_size() -> u32 {
    5
}

fn default_schema() -> String {
    "public".to_owned()
}

fn default_table_prefix() -> String {
    "opspulse_".to_owned()
}

/// Time-series sink configuration (C2, spec.md §4.2 and §6).
#[derive(Debug, Deserialize)]
pub struct InfluxConfig {
    #[serde(default = "default_influx_endpoint")]
    pub endpoint_base: String,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            endpoint_base: default_influx_endpoint(),
        }
    }
}

fn default_influx_endpoint() -> String {
    "http://localhost:8086".to_owned()
}

/// Tenants that the evaluator and dispatcher sweep each tick, in lieu of a
/// dedicated tenant directory service (spec.md §4.4, §4.5 `TenantSource`).
#[derive(Debug, Default, Deserialize)]
pub struct TenantsConfig {
    #[serde(default)]
    pub ids: Vec<String>,
}

/// Auth cache sizing (spec.md §4.1).
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
            max_size: default_cache_max_size(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_cache_max_size() -> usize {
    10_000
}

/// Batch writer sizing (spec.md §4.2).
#[derive(Debug, Deserialize)]
pub struct WriterTomlConfig {
    #[serde(default = "default_writer_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_writer_flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default = "default_writer_max_tries")]
    pub max_tries: u32,
    #[serde(default = "default_writer_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for WriterTomlConfig {
    fn default() -> Self {
        Self {
            batch_size: default_writer_batch_size(),
            flush_interval_ms: default_writer_flush_interval_ms(),
            max_tries: default_writer_max_tries(),
            retry_delay_ms: default_writer_retry_delay_ms(),
        }
    }
}

fn default_writer_batch_size() -> usize {
    500
}

fn default_writer_flush_interval_ms() -> u64 {
    1_000
}

fn default_writer_max_tries() -> u32 {
    2
}

fn default_writer_retry_delay_ms() -> u64 {
    200
}

/// Ingestion worker pool sizing (spec.md §4.3, §5).
#[derive(Debug, Deserialize)]
pub struct IngestTomlConfig {
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_rate_limit_per_sec")]
    pub rate_limit_per_sec: f64,
    #[serde(default = "default_rate_limit_burst")]
    pub rate_limit_burst: f64,
}

impl Default for IngestTomlConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            queue_capacity: default_queue_capacity(),
            rate_limit_per_sec: default_rate_limit_per_sec(),
            rate_limit_burst: default_rate_limit_burst(),
        }
    }
}

fn default_worker_count() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    50_000
}

fn default_rate_limit_per_sec() -> f64 {
    10.0
}

fn default_rate_limit_burst() -> f64 {
    30.0
}

/// Device liveness thresholds shared by the evaluator (spec.md §3 "Device State", §4.4).
#[derive(Debug, Deserialize)]
pub struct LivenessConfig {
    #[serde(default = "default_stale_after")]
    pub stale_after_seconds: u64,
    #[serde(default = "default_offline_after")]
    pub offline_after_seconds: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            stale_after_seconds: default_stale_after(),
            offline_after_seconds: default_offline_after(),
        }
    }
}

fn default_stale_after() -> u64 {
    60
}

fn default_offline_after() -> u64 {
    300
}

/// Evaluator tick cadence (spec.md §4.4).
#[derive(Debug, Deserialize)]
pub struct EvaluatorTomlConfig {
    #[serde(default = "default_evaluator_tick")]
    pub tick_seconds: u64,
}

impl Default for EvaluatorTomlConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_evaluator_tick(),
        }
    }
}

fn default_evaluator_tick() -> u64 {
    10
}

/// Dispatcher tick cadence (spec.md §4.5). The delivery worker shares this
/// cadence rather than carrying a separate one (see DESIGN.md open question).
#[derive(Debug, Deserialize)]
pub struct DispatcherTomlConfig {
    #[serde(default = "default_dispatcher_tick")]
    pub tick_seconds: u64,
}

impl Default for DispatcherTomlConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_dispatcher_tick(),
        }
    }
}

fn default_dispatcher_tick() -> u64 {
    10
}

/// Delivery worker sizing and retry policy (spec.md §4.6).
#[derive(Debug, Deserialize)]
pub struct DeliveryTomlConfig {
    #[serde(default = "default_delivery_tick")]
    pub tick_seconds: u64,
    #[serde(default = "default_delivery_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_delivery_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delivery_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_delivery_max_backoff_seconds")]
    pub max_backoff_seconds: u64,
    #[serde(default = "default_lease_duration")]
    pub lease_duration_seconds: u64,
    #[serde(default = "default_delivery_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub ssrf_allow_private: bool,
    pub worker_id: Option<String>,
}

impl Default for DeliveryTomlConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_delivery_tick(),
            concurrency: default_delivery_concurrency(),
            max_attempts: default_delivery_max_attempts(),
            base_backoff_ms: default_delivery_base_backoff_ms(),
            max_backoff_seconds: default_delivery_max_backoff_seconds(),
            lease_duration_seconds: default_lease_duration(),
            request_timeout_seconds: default_delivery_request_timeout(),
            ssrf_allow_private: false,
            worker_id: None,
        }
    }
}

fn default_delivery_tick() -> u64 {
    2
}

fn default_delivery_concurrency() -> usize {
    8
}

fn default_delivery_max_attempts() -> u32 {
    5
}

fn default_delivery_base_backoff_ms() -> u64 {
    1_000
}

fn default_delivery_max_backoff_seconds() -> u64 {
    300
}

fn default_lease_duration() -> u64 {
    30
}

fn default_delivery_request_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_every_default() {
        let config: PulseConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.ingest.worker_count, 4);
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.liveness.offline_after_seconds, 300);
        assert!(config.postgres.url.is_none());
        assert!(config.admin.api_keys.is_empty());
    }

    #[test]
    fn server_section_overrides_host_and_port() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 9000
        "#;
        let config: PulseConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.shutdown_timeout_seconds, 30);
    }

    #[test]
    fn admin_api_keys_parsed() {
        let toml = r#"
            [[admin.api_keys]]
            name = "operator-console"
            key = "s3cr3t"
        "#;
        let config: PulseConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.admin.api_keys.len(), 1);
        assert_eq!(config.admin.api_keys[0].name, "operator-console");
    }

    #[test]
    fn env_override_wins_over_file_value() {
        let mut config: PulseConfig = toml::from_str("[ingest]\nworker_count = 2").unwrap();
        std::env::set_var("INGEST_WORKER_COUNT", "16");
        config.apply_env_overrides();
        std::env::remove_var("INGEST_WORKER_COUNT");
        assert_eq!(config.ingest.worker_count, 16);
    }

    #[test]
    fn conversion_to_ingest_config_carries_rate_limit_fields() {
        let config = PulseConfig::default();
        let ingest_config = config.ingest_config();
        assert_eq!(ingest_config.queue_capacity, 50_000);
        assert!((ingest_config.rate_limit_per_sec - 10.0).abs() < f64::EPSILON);
    }
}
