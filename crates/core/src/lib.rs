pub mod alert;
pub mod delivery;
pub mod error;
pub mod fingerprint;
pub mod ids;
pub mod integration;
pub mod line_protocol;
pub mod metric;
pub mod registry;
pub mod rule;
pub mod selector;
pub mod telemetry;
pub mod token;

pub use alert::{Alert, AlertStatus, AlertType};
pub use delivery::{DeliveryJob, JobLease, JobState, backoff_delay};
pub use error::CoreError;
pub use fingerprint::{no_heartbeat_fingerprint, threshold_fingerprint};
pub use ids::{AlertId, DeviceId, DeviceKey, IntegrationId, JobId, RouteId, RuleId, SiteId, TenantId};
pub use integration::{Integration, IntegrationKind, Route, SnmpV3Auth};
pub use line_protocol::{encode_heartbeat, encode_telemetry, escape_key, parse_metrics};
pub use metric::MetricValue;
pub use registry::{DeviceRegistryEntry, DeviceStatus};
pub use rule::{AlertRule, Comparator, Severity};
pub use selector::DeviceSelector;
pub use telemetry::{DeviceState, Liveness, QuarantineEvent, QuarantineReason, TelemetryPoint};
pub use token::hash_provision_token;
