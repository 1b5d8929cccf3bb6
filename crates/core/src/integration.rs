use serde::{Deserialize, Serialize};

use crate::ids::{IntegrationId, RouteId, TenantId};
use crate::rule::Severity;
use crate::selector::DeviceSelector;

/// Kind-specific outbound integration config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrationKind {
    Webhook {
        url: String,
        /// Shared secret used to sign the payload; never logged.
        hmac_secret: Option<String>,
    },
    Snmp {
        host: String,
        port: u16,
        community: Option<String>,
        v3_auth: Option<SnmpV3Auth>,
    },
    Email {
        smtp_host: String,
        smtp_port: u16,
        starttls: bool,
        recipients: Vec<String>,
    },
    Mqtt {
        broker_host: String,
        broker_port: u16,
        topic_template: String,
        qos: u8,
        retain: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpV3Auth {
    pub username: String,
    pub auth_key: String,
    pub priv_key: String,
}

/// A configured outbound destination, keyed by `(tenant_id, integration_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    pub tenant_id: TenantId,
    pub integration_id: IntegrationId,
    pub kind: IntegrationKind,
}

/// A predicate over alerts that, when matched, turns them into delivery
/// jobs against one [`Integration`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub tenant_id: TenantId,
    pub route_id: RouteId,
    pub integration_id: IntegrationId,
    pub min_severity: Severity,
    pub alert_types: Vec<crate::alert::AlertType>,
    #[serde(skip)]
    pub device_selector: Option<DeviceSelector>,
    pub device_selector_raw: String,
    /// Minimum interval between delivery jobs for the same
    /// `(route_id, fingerprint)` pair; `None` disables throttling.
    pub throttle_seconds: Option<u64>,
    /// minijinja template rendered into the job payload at dispatch time.
    /// `None` falls back to the dispatcher's built-in default template for
    /// the destination integration's kind.
    pub payload_template: Option<String>,
}
